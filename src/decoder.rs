//! Viterbi beam search over a weighted transducer.
//!
//! One [`Decoder`] decodes one utterance at a time: seed a token at the start
//! state, then for every acoustic frame expand the live tokens along emitting
//! arcs ([`Decoder::process_emitting`]), close the result under epsilon arcs
//! ([`Decoder::process_nonemitting`]), and finally read the cheapest path that
//! ends in a final state ([`Decoder::best_path`]).
//!
//! The search keeps exactly two frames of tokens alive (`prev` and `cur`).
//! Output labels are not stored on tokens; each token carries an index into an
//! append-only arena of label nodes, and the winning word sequence is
//! recovered by walking that chain backwards after the last frame.

use std::collections::hash_map::Entry;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::cutoff;
use crate::error::{Error, Result};
use crate::fst::{Arc, EPSILON, Fst, Label, StateId};
use crate::hypothesis::Hypothesis;
use crate::opts::DecoderOpts;
use crate::scorer::AcousticScorer;

/// One live search hypothesis: a transducer state, the accumulated path cost,
/// and the most recent output-label node on its path (if any).
#[derive(Debug, Clone, Copy)]
pub(crate) struct Token {
    pub(crate) state: StateId,
    pub(crate) cost: f32,
    pub(crate) olabel: Option<u32>,
}

/// A node in the output-label trellis. Chains of `prev` links run backwards
/// to the start of the utterance; nodes are never mutated once appended.
#[derive(Debug, Clone, Copy)]
struct OLabel {
    prev: Option<u32>,
    olabel: Label,
}

/// A single-utterance Viterbi beam-search decoder.
///
/// The decoder borrows its transducer: graphs are large, load once, and are
/// shared read-only between decoder instances. One instance decodes one
/// utterance at a time (`decode` resets all per-utterance state), and is not
/// safe for concurrent use; run one decoder per thread instead.
pub struct Decoder<'f, F: Fst> {
    fst: &'f F,
    opts: DecoderOpts,

    /// Tokens of the frame being built.
    cur: Vec<Token>,
    /// Tokens of the previous frame; read-only while expanding into `cur`.
    prev: Vec<Token>,
    /// state id -> position in `cur`. Enforces one token per state and makes
    /// cost-based merging a single lookup. Cleared (capacity kept) per frame.
    state_idx: FxHashMap<StateId, usize>,

    /// Append-only arena of output-label nodes. Lives for the whole
    /// utterance: tokens from later frames still reference earlier nodes.
    olabels: Vec<OLabel>,

    /// Scratch buffer for cutoff sampling, reused across frames.
    sample_scratch: Vec<f32>,

    num_frames_decoded: i32,
}

impl<'f, F: Fst> Decoder<'f, F> {
    /// Bind a decoder to a transducer with default options. No work happens
    /// until [`Decoder::decode`].
    pub fn new(fst: &'f F) -> Self {
        Self::with_opts(fst, DecoderOpts::default())
    }

    pub fn with_opts(fst: &'f F, opts: DecoderOpts) -> Self {
        Self {
            fst,
            opts,
            cur: Vec::new(),
            prev: Vec::new(),
            state_idx: FxHashMap::default(),
            olabels: Vec::new(),
            sample_scratch: Vec::new(),
            num_frames_decoded: 0,
        }
    }

    /// Run the full search over one utterance.
    ///
    /// Returns `Ok(true)` iff at least one token is still alive after the
    /// last frame. A `false` return is not an error: it means the beam died
    /// (or the utterance was empty) and [`Decoder::best_path`] will report an
    /// empty hypothesis.
    pub fn decode<S: AcousticScorer>(&mut self, scorer: &S) -> Result<bool> {
        let t_all = Instant::now();
        let mut t_emitting = Duration::ZERO;
        let mut t_nonemitting = Duration::ZERO;

        self.init_decoding()?;
        while !scorer.is_last_frame(self.num_frames_decoded - 1) {
            let t = Instant::now();
            let cutoff = self.process_emitting(scorer)?;
            t_emitting += t.elapsed();

            let t = Instant::now();
            self.process_nonemitting(cutoff)?;
            t_nonemitting += t.elapsed();
        }

        tracing::debug!(
            frames = self.num_frames_decoded,
            live_tokens = self.cur.len(),
            olabel_nodes = self.olabels.len(),
            decode_ms = t_all.elapsed().as_secs_f64() * 1e3,
            emitting_ms = t_emitting.as_secs_f64() * 1e3,
            nonemitting_ms = t_nonemitting.as_secs_f64() * 1e3,
            "utterance decoded"
        );

        Ok(self.num_frames_decoded > 0 && !self.cur.is_empty())
    }

    /// Read the best-scoring hypothesis after [`Decoder::decode`].
    ///
    /// Only tokens sitting on a final state count; their cost is the path
    /// cost plus the state's final weight. When no token reaches a final
    /// state the hypothesis is empty with weight zero. Idempotent.
    pub fn best_path(&self) -> Hypothesis {
        let mut best: Option<(usize, f32)> = None;
        for (i, tok) in self.cur.iter().enumerate() {
            let cost = tok.cost + self.fst.final_weight(tok.state);
            if cost.is_finite() && best.is_none_or(|(_, b)| cost < b) {
                best = Some((i, cost));
            }
        }
        let Some((best_idx, best_cost)) = best else {
            return Hypothesis::empty();
        };

        // Walk the label chain back to the utterance start. `prev` indices
        // are strictly decreasing, so this terminates. The collected order is
        // most-recent-first; see `Hypothesis::words`.
        let mut words = Vec::new();
        let mut next = self.cur[best_idx].olabel;
        while let Some(idx) = next {
            let node = self.olabels[idx as usize];
            words.push(node.olabel);
            next = node.prev;
        }

        Hypothesis {
            words,
            weight: best_cost,
        }
    }

    /// Reset per-utterance state and seed the search at the start state.
    fn init_decoding(&mut self) -> Result<()> {
        self.cur.clear();
        self.prev.clear();
        self.state_idx.clear();
        self.olabels.clear();
        self.num_frames_decoded = 0;

        let start = self.fst.start().ok_or(Error::NoStartState)?;

        // A synthetic epsilon arc into the start state gives us exactly one
        // seed token through the same insertion path every other token uses.
        let seed = Arc {
            ilabel: EPSILON,
            olabel: EPSILON,
            next_state: start,
            weight: 0.0,
        };
        self.insert_tok(&seed, None, 0.0);

        // Populate the initial epsilon closure before any acoustic input.
        self.process_nonemitting(f32::INFINITY)
    }

    /// Insert (or merge) a token at `arc.next_state` with the given cost.
    ///
    /// Returns true when the beam changed: a token was created or an existing
    /// one was overwritten by a strictly cheaper arrival. The epsilon closure
    /// uses that signal to decide what to re-enqueue.
    fn insert_tok(&mut self, arc: &Arc, olabel: Option<u32>, cost: f32) -> bool {
        // Materialize a label node only when this arc actually emits one.
        // If the merge below discards the newcomer, the node stays behind as
        // an unreferenced arena entry; that waste is bounded by the number of
        // arcs traversed and costs less than detecting it.
        let next_olabel = if arc.olabel != EPSILON {
            let idx = self.olabels.len() as u32;
            self.olabels.push(OLabel {
                prev: olabel,
                olabel: arc.olabel,
            });
            Some(idx)
        } else {
            olabel
        };

        let tok = Token {
            state: arc.next_state,
            cost,
            olabel: next_olabel,
        };
        match self.state_idx.entry(arc.next_state) {
            Entry::Vacant(entry) => {
                entry.insert(self.cur.len());
                self.cur.push(tok);
                true
            }
            Entry::Occupied(entry) => {
                let pos = *entry.get();
                if self.cur[pos].cost > cost {
                    self.cur[pos] = tok;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Expand the previous frame's tokens along emitting arcs, consuming one
    /// acoustic frame.
    ///
    /// Returns the bound this frame established for the next one. The current
    /// decode loop recomputes its cutoffs from scratch each frame and ignores
    /// it, but streaming variants can feed it forward.
    fn process_emitting<S: AcousticScorer>(&mut self, scorer: &S) -> Result<f32> {
        self.prev.clear();
        self.state_idx.clear();
        std::mem::swap(&mut self.cur, &mut self.prev);

        // The beam can die out entirely when every arc of the previous frame
        // overshot the cutoff. The frame is still consumed; the decode ends
        // with no live tokens.
        if self.prev.is_empty() {
            self.num_frames_decoded += 1;
            return Ok(f32::INFINITY);
        }

        let frame = self.num_frames_decoded;
        let cut = cutoff::estimate(&self.prev, &mut self.sample_scratch, &self.opts);
        let mut next_cutoff = f32::INFINITY;

        let fst = self.fst;

        // Expand the single best token first. Its arcs give a reasonably
        // tight bound on next_cutoff before the full sweep starts, so the
        // sweep prunes earlier.
        let best = self.prev[cut.best_idx];
        for arc in fst.arcs(best.state) {
            if arc.ilabel == EPSILON {
                continue;
            }
            let ac_cost = -scorer.loglikelihood(frame, arc.ilabel)?;
            let total = best.cost + arc.weight + ac_cost;
            if total + cut.adaptive_beam < next_cutoff {
                next_cutoff = total + cut.adaptive_beam;
            }
        }

        for i in 0..self.prev.len() {
            let from = self.prev[i];
            if from.cost > cut.weight_cutoff {
                continue;
            }
            for arc in fst.arcs(from.state) {
                if arc.ilabel == EPSILON {
                    continue;
                }
                let ac_cost = -scorer.loglikelihood(frame, arc.ilabel)?;
                let total = from.cost + arc.weight + ac_cost;
                if total > next_cutoff {
                    continue;
                }
                if total + cut.adaptive_beam < next_cutoff {
                    next_cutoff = total + cut.adaptive_beam;
                }
                self.insert_tok(arc, from.olabel, total);
            }
        }

        self.num_frames_decoded += 1;
        Ok(next_cutoff)
    }

    /// Close the current beam under epsilon arcs whose resulting cost stays
    /// within `cutoff`.
    ///
    /// Worklist-driven: a state is re-enqueued whenever its token is created
    /// or improved, so the closure converges even through epsilon cycles
    /// (a revisit requires a strictly lower cost at the same state).
    fn process_nonemitting(&mut self, cutoff: f32) -> Result<()> {
        let mut queue: Vec<StateId> = self.cur.iter().map(|tok| tok.state).collect();

        let fst = self.fst;
        while let Some(state) = queue.pop() {
            let tok_idx = *self.state_idx.get(&state).ok_or_else(|| {
                Error::corrupt(format!("state {state} is queued but missing from the beam index"))
            })?;

            for arc in fst.arcs(state) {
                if arc.ilabel != EPSILON {
                    continue;
                }

                // Re-read the source token each arc: an earlier insertion in
                // this very loop may have improved it in place.
                let from = self.cur[tok_idx];
                let total = from.cost + arc.weight;
                if total > cutoff {
                    continue;
                }
                if self.insert_tok(arc, from.olabel, total) {
                    queue.push(arc.next_state);
                }
            }
        }
        Ok(())
    }

    #[cfg(test)]
    fn live_tokens(&self) -> &[Token] {
        &self.cur
    }
}
