//! Beam cutoff estimation.
//!
//! Each emitting step needs two numbers before it sweeps the previous frame's
//! beam: an inclusive cost bound on which tokens are worth expanding
//! (`weight_cutoff`), and the slack (`adaptive_beam`) used to tighten the
//! next frame's bound as expansion proceeds. When the beam holds more tokens
//! than `max_active`, we estimate the `max_active`-th best cost from a random
//! sample instead of sorting the whole beam.
//!
//! The sampler is a fixed-seed linear congruential generator, never a
//! platform RNG: identical inputs must produce identical decodes, on every
//! platform and from any thread.

use crate::decoder::Token;
use crate::opts::DecoderOpts;

/// What the emitting step needs to know about the previous frame's beam.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Cutoff {
    /// Tokens costlier than this are not expanded.
    pub(crate) weight_cutoff: f32,
    /// Slack added to newly expanded costs when tightening the next frame's
    /// bound.
    pub(crate) adaptive_beam: f32,
    /// Position of the cheapest token in the frame.
    pub(crate) best_idx: usize,
}

/// Deterministic uniform sampler over [0, 1).
///
/// The multiplier/increment pair and the 16-bit extraction are load-bearing:
/// changing them changes which tokens get sampled and therefore the exact
/// cutoffs of every decode.
struct SampleRng {
    state: u64,
}

impl SampleRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_uniform(&mut self) -> f32 {
        self.state = self.state.wrapping_mul(25214903917).wrapping_add(11);
        (self.state & 0xffff) as f32 / 65535.0
    }
}

/// Estimate the cutoffs for one emitting step.
///
/// `prev` must be non-empty. `samples` is caller-owned scratch so the per-frame
/// sample buffer is allocated once per decoder, not once per frame.
pub(crate) fn estimate(prev: &[Token], samples: &mut Vec<f32>, opts: &DecoderOpts) -> Cutoff {
    debug_assert!(!prev.is_empty());

    samples.clear();
    let mut rng = SampleRng::new(opts.cutoff_seed);
    let sample_prob = opts.cutoff_samples as f32 / prev.len() as f32;

    let mut best_cost = f32::INFINITY;
    let mut best_idx = 0;
    for (i, tok) in prev.iter().enumerate() {
        if rng.next_uniform() < sample_prob {
            samples.push(tok.cost);
        }
        if tok.cost < best_cost {
            best_cost = tok.cost;
            best_idx = i;
        }
    }

    let beam_cutoff = best_cost + opts.beam;

    // Guess the cost of the max_active-th best token from the sample. The
    // sample rank mirrors the beam rank: if we kept 1/50th of the beam, the
    // target rank shrinks by the same factor.
    let mut max_active_cutoff = None;
    if prev.len() > opts.max_active && !samples.is_empty() {
        let rank = samples.len() * opts.max_active / prev.len();
        pdqselect::select_by(samples, rank, |a, b| a.total_cmp(b));
        max_active_cutoff = Some(samples[rank]);
    }

    match max_active_cutoff {
        // The population estimate is tighter than the plain beam; use it and
        // shrink the slack to match.
        Some(cutoff) if cutoff < beam_cutoff => Cutoff {
            weight_cutoff: cutoff,
            adaptive_beam: cutoff - best_cost + opts.beam_delta,
            best_idx,
        },
        _ => Cutoff {
            weight_cutoff: beam_cutoff,
            adaptive_beam: opts.beam,
            best_idx,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(cost: f32) -> Token {
        Token {
            state: 0,
            cost,
            olabel: None,
        }
    }

    fn spread_beam(n: usize) -> Vec<Token> {
        // Costs cycle through a fixed pattern so the quantile is predictable
        // without being uniform.
        (0..n).map(|i| token((i % 97) as f32 * 0.25)).collect()
    }

    #[test]
    fn small_beams_use_the_plain_beam_cutoff() {
        let opts = DecoderOpts::default();
        let prev: Vec<Token> = vec![token(3.0), token(1.0), token(2.0)];
        let mut scratch = Vec::new();

        let cut = estimate(&prev, &mut scratch, &opts);
        assert_eq!(cut.best_idx, 1);
        assert_eq!(cut.weight_cutoff, 1.0 + opts.beam);
        assert_eq!(cut.adaptive_beam, opts.beam);
    }

    #[test]
    fn oversized_beams_tighten_toward_max_active() {
        let opts = DecoderOpts {
            max_active: 100,
            ..DecoderOpts::default()
        };
        let prev = spread_beam(10_000);
        let mut scratch = Vec::new();

        let cut = estimate(&prev, &mut scratch, &opts);
        // With ~1% of the population allowed to live, the cutoff must land
        // well inside the plain beam.
        assert!(cut.weight_cutoff < opts.beam);
        assert_eq!(cut.best_idx, 0);
        assert!(cut.adaptive_beam >= opts.beam_delta);
        assert!(cut.adaptive_beam < opts.beam);
    }

    #[test]
    fn identical_beams_produce_identical_cutoffs() {
        let opts = DecoderOpts {
            max_active: 3000,
            ..DecoderOpts::default()
        };
        let prev = spread_beam(10_000);

        let mut scratch_a = Vec::new();
        let mut scratch_b = Vec::new();
        let a = estimate(&prev, &mut scratch_a, &opts);
        let b = estimate(&prev, &mut scratch_b, &opts);

        assert_eq!(a, b);
        assert_eq!(scratch_a.len(), scratch_b.len());
    }
}
