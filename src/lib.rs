//! `trellis` — a small, embeddable Viterbi beam-search decoder over weighted
//! finite-state transducers.
//!
//! This crate provides:
//! - Token-passing beam search with adaptive cutoffs
//! - Best-path recovery through an append-only back-pointer trellis
//! - The two collaborator seams the search consumes: a transducer oracle and
//!   an acoustic scorer
//! - A scripted matrix scorer and an in-memory graph for tests and tooling
//!
//! The library is designed to sit inside a larger recognizer: audio handling,
//! feature extraction, and acoustic-model evaluation all live behind the
//! [`scorer::AcousticScorer`] seam, and the decoder borrows its graph so one
//! loaded transducer can serve many decodes.

// The search itself (most consumers should start here).
pub mod decoder;
pub mod hypothesis;
pub mod opts;

// Collaborator seams: the transducer and the acoustic scorer.
pub mod fst;
pub mod scorer;

// Word-id rendering for decoded hypotheses.
pub mod symbols;

// Output selection for the CLI.
pub mod output_type;

// Logging configuration and control.
pub mod logging;

// Error handling.
pub mod error;
pub use error::{Error, Result};

// Beam cutoff estimation (internal to the search).
mod cutoff;
