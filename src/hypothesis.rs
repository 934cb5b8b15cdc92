use serde::Serialize;

use crate::fst::Label;
use crate::symbols::SymbolTable;

/// The decoder's output for one utterance.
///
/// We keep this struct output-focused:
/// - `words` holds raw output-label ids; mapping to text is the caller's
///   choice (see [`Hypothesis::render`])
/// - an empty word list with weight zero means "no path found"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hypothesis {
    /// Output word ids along the best path, **most recent first**.
    ///
    /// The back-trace walks the label trellis from the last frame toward the
    /// utterance start, so this is the natural collection order. Use
    /// [`Hypothesis::spoken_order`] for the order the words were emitted in.
    pub words: Vec<Label>,

    /// Total cost of the winning path, including the final weight of its
    /// last state.
    pub weight: f32,
}

impl Hypothesis {
    /// The "no path found" hypothesis.
    pub fn empty() -> Self {
        Self {
            words: Vec::new(),
            weight: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Word ids in the order they were emitted.
    pub fn spoken_order(&self) -> impl Iterator<Item = Label> + '_ {
        self.words.iter().rev().copied()
    }

    /// Render the hypothesis as a space-joined line in spoken order.
    ///
    /// Ids missing from the table render as `<unk-ID>` so one bad entry
    /// doesn't discard an otherwise useful transcription.
    pub fn render(&self, symbols: &SymbolTable) -> String {
        let mut line = String::new();
        for id in self.spoken_order() {
            if !line.is_empty() {
                line.push(' ');
            }
            match symbols.get(id) {
                Some(word) => line.push_str(word),
                None => line.push_str(&format!("<unk-{id}>")),
            }
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_in_spoken_order_with_unknown_fallback() {
        let symbols: SymbolTable = "hello 1\nworld 2\n".parse().unwrap();
        let hyp = Hypothesis {
            words: vec![9, 2, 1], // most recent first
            weight: 3.0,
        };
        assert_eq!(hyp.render(&symbols), "hello world <unk-9>");
    }

    #[test]
    fn empty_hypothesis_renders_to_an_empty_line() {
        let symbols = SymbolTable::default();
        assert_eq!(Hypothesis::empty().render(&symbols), "");
        assert!(Hypothesis::empty().is_empty());
    }
}
