//! Word-id to text lookup.
//!
//! Decoding graphs speak in integer output labels; the table mapping those
//! ids back to words ships alongside the graph as plain text, one `word id`
//! pair per line (the conventional layout these tables are built and
//! exchanged in). The decoder itself never consults this — it exists for
//! rendering hypotheses.

use std::io::BufRead;
use std::str::FromStr;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::fst::Label;

/// An id -> word lookup table.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    words: FxHashMap<Label, String>,
}

impl SymbolTable {
    /// Parse a table from `word id` lines.
    ///
    /// Blank lines are skipped. A repeated id keeps the last entry, matching
    /// how these files behave when concatenated.
    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut words = FxHashMap::default();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut parts = line.split_whitespace();
            let (word, id) = match (parts.next(), parts.next(), parts.next()) {
                (Some(word), Some(id), None) => (word, id),
                _ => {
                    return Err(Error::invalid_input(format!(
                        "symbol table line {} is not a `word id` pair: {line:?}",
                        lineno + 1
                    )));
                }
            };
            let id: Label = id.parse().map_err(|_| {
                Error::invalid_input(format!(
                    "symbol table line {} has a non-numeric id: {line:?}",
                    lineno + 1
                ))
            })?;
            words.insert(id, word.to_string());
        }
        Ok(Self { words })
    }

    pub fn get(&self, id: Label) -> Option<&str> {
        self.words.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl FromStr for SymbolTable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::read(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_word_id_lines() -> anyhow::Result<()> {
        let table: SymbolTable = "<eps> 0\nhello 1\nworld 2\n\n".parse()?;
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(1), Some("hello"));
        assert_eq!(table.get(2), Some("world"));
        assert_eq!(table.get(3), None);
        Ok(())
    }

    #[test]
    fn later_duplicates_win() -> anyhow::Result<()> {
        let table: SymbolTable = "old 5\nnew 5\n".parse()?;
        assert_eq!(table.get(5), Some("new"));
        Ok(())
    }

    #[test]
    fn rejects_malformed_lines() {
        let err = "just-a-word\n".parse::<SymbolTable>().unwrap_err();
        assert!(err.to_string().contains("line 1"));

        let err = "word notanumber\n".parse::<SymbolTable>().unwrap_err();
        assert!(err.to_string().contains("non-numeric"));

        let err = "too many fields 3\n".parse::<SymbolTable>().unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
