//! The acoustic side of the decoder's world.
//!
//! The decoder never evaluates audio itself; it asks a scorer for per-frame
//! log-likelihoods and negates them into costs. [`AcousticScorer`] is the seam
//! between the search and whatever produces those scores (a neural network, a
//! GMM, or — as in [`MatrixScorer`] — a precomputed table). Tests inject a
//! scripted table here instead of mocking the search internals.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::fst::Label;

/// Per-frame acoustic scores consumed by the decoder.
///
/// Frames are numbered from zero. `is_last_frame` must accept `-1` and answer
/// `true` when there are no frames at all, so a zero-length utterance
/// terminates the decode loop before any expansion happens.
pub trait AcousticScorer {
    /// Natural-log likelihood of `label` at `frame`.
    ///
    /// Only called with emitting labels (never epsilon) and with
    /// `0 <= frame < num_frames`. Failures propagate out of the decode
    /// unchanged.
    fn loglikelihood(&self, frame: i32, label: Label) -> Result<f32>;

    /// True iff `frame` is the index of the final frame.
    fn is_last_frame(&self, frame: i32) -> bool;
}

/// A scorer backed by a dense `frames x labels` log-likelihood matrix.
///
/// Column `label - 1` holds the scores for label `label`; label `0` is
/// epsilon and never reaches a scorer. This matches how acoustic-model output
/// matrices are conventionally laid out, and makes the scorer directly
/// loadable from a JSON array of rows.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "Vec<Vec<f32>>")]
pub struct MatrixScorer {
    num_labels: usize,
    rows: Vec<Vec<f32>>,
}

impl MatrixScorer {
    /// Build a scorer from one row of label scores per frame.
    ///
    /// Rows must all have the same width. An empty matrix is a valid
    /// zero-frame utterance.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let num_labels = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = rows.iter().position(|r| r.len() != num_labels) {
            return Err(Error::invalid_input(format!(
                "score matrix is ragged: row 0 has {num_labels} labels, row {bad} has {}",
                rows[bad].len()
            )));
        }
        Ok(Self { num_labels, rows })
    }

    pub fn num_frames(&self) -> usize {
        self.rows.len()
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }
}

impl TryFrom<Vec<Vec<f32>>> for MatrixScorer {
    type Error = Error;

    fn try_from(rows: Vec<Vec<f32>>) -> Result<Self> {
        Self::from_rows(rows)
    }
}

impl AcousticScorer for MatrixScorer {
    fn loglikelihood(&self, frame: i32, label: Label) -> Result<f32> {
        let row = usize::try_from(frame)
            .ok()
            .and_then(|f| self.rows.get(f))
            .ok_or_else(|| Error::scorer(format!("frame {frame} is out of range")))?;

        if label == 0 {
            return Err(Error::scorer("epsilon has no acoustic score"));
        }
        row.get(label as usize - 1).copied().ok_or_else(|| {
            Error::scorer(format!(
                "label {label} is out of range (the matrix has {} labels)",
                self.num_labels
            ))
        })
    }

    fn is_last_frame(&self, frame: i32) -> bool {
        frame >= self.rows.len() as i32 - 1
    }
}
