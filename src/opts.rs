/// Options that control how much of the search space the decoder keeps alive.
///
/// This struct represents *library-level configuration*, not CLI flags directly.
/// The CLI is responsible for mapping user input into this type so that:
/// - the library remains reusable outside of a CLI context
/// - other frontends (APIs, tests, batch jobs) can construct options programmatically
///
/// The defaults reproduce the tuning the decoder was originally shipped with;
/// they are sane for word-level graphs in the low-hundreds-of-thousands of
/// states.
#[derive(Debug, Clone)]
pub struct DecoderOpts {
    /// Base beam width, in cost units.
    ///
    /// Every token whose cost exceeds the frame's best cost by more than this
    /// is dropped. Wider beams search more and prune less.
    pub beam: f32,

    /// Target ceiling on live tokens per frame.
    ///
    /// When a frame holds more tokens than this, the beam is tightened toward
    /// the estimated `max_active`-th best cost via deterministic sampling.
    pub max_active: usize,

    /// Slack added on top of the tightened beam so the estimate never cuts
    /// exactly at the quantile.
    pub beam_delta: f32,

    /// Target number of cost samples drawn per frame for the quantile estimate.
    ///
    /// Sampling keeps cutoff estimation O(samples) instead of O(beam); the
    /// draw itself is deterministic (see `cutoff_seed`).
    pub cutoff_samples: usize,

    /// Seed of the deterministic sampler used for cutoff estimation.
    ///
    /// Fixed by default so identical inputs always produce identical decodes,
    /// including across platforms and threads.
    pub cutoff_seed: u64,
}

impl Default for DecoderOpts {
    fn default() -> Self {
        Self {
            beam: 16.0,
            max_active: 3000,
            beam_delta: 0.5,
            cutoff_samples: 200,
            cutoff_seed: 12345,
        }
    }
}
