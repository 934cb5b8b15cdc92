//! The transducer side of the decoder's world.
//!
//! The search only ever asks three questions of a graph: where does it start,
//! is this state final (and at what cost), and what arcs leave this state.
//! [`Fst`] captures exactly that, so the decoder works the same over an
//! in-memory graph, a memory-mapped one, or a test fixture.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier of a transducer state.
pub type StateId = u32;

/// Arc label id. Label `0` is reserved for epsilon on both tapes.
pub type Label = u32;

/// The reserved empty label. An arc with `ilabel == EPSILON` consumes no
/// acoustic frame; an arc with `olabel == EPSILON` emits no word.
pub const EPSILON: Label = 0;

/// One weighted transition between states.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    /// Input (acoustic) label; `0` is epsilon.
    pub ilabel: Label,
    /// Output (word) label; `0` is epsilon.
    pub olabel: Label,
    /// Destination state.
    pub next_state: StateId,
    /// Arc cost (lower is better, additive along a path).
    pub weight: f32,
}

/// Read-only oracle over a fully expanded weighted transducer.
///
/// Implementations must be cheap to query per state; the decoder walks arcs of
/// every live state on every frame.
pub trait Fst {
    /// The unique start state, or `None` for an empty graph.
    fn start(&self) -> Option<StateId>;

    /// Cost of terminating in `state`: finite for final states,
    /// `f32::INFINITY` otherwise.
    fn final_weight(&self, state: StateId) -> f32;

    /// Outgoing arcs of `state`. Unknown states yield no arcs.
    fn arcs(&self, state: StateId) -> &[Arc];
}

/// A fully expanded transducer stored as a vector of states.
///
/// This is the graph representation the decoder is normally run against:
/// built once (or deserialized from JSON) and then only read. Final weights
/// are stored as `Option<f32>` so non-final states survive JSON round-trips,
/// where an infinity has no representation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorFst {
    start: Option<StateId>,
    states: Vec<StateEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StateEntry {
    /// `None` means non-final.
    final_weight: Option<f32>,
    arcs: Vec<Arc>,
}

impl VectorFst {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fresh state and return its id.
    pub fn add_state(&mut self) -> StateId {
        let id = self.states.len() as StateId;
        self.states.push(StateEntry::default());
        id
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// Mark `state` as the start state.
    pub fn set_start(&mut self, state: StateId) -> Result<()> {
        self.check_state(state)?;
        self.start = Some(state);
        Ok(())
    }

    /// Mark `state` as final with the given termination cost.
    pub fn set_final(&mut self, state: StateId, weight: f32) -> Result<()> {
        self.check_state(state)?;
        self.states[state as usize].final_weight = Some(weight);
        Ok(())
    }

    /// Add an outgoing arc to `state`. Arcs keep insertion order.
    pub fn add_arc(&mut self, state: StateId, arc: Arc) -> Result<()> {
        self.check_state(state)?;
        self.check_state(arc.next_state)?;
        self.states[state as usize].arcs.push(arc);
        Ok(())
    }

    fn check_state(&self, state: StateId) -> Result<()> {
        if (state as usize) < self.states.len() {
            Ok(())
        } else {
            Err(Error::invalid_input(format!(
                "state {state} does not exist (the transducer has {} states)",
                self.states.len()
            )))
        }
    }
}

impl Fst for VectorFst {
    fn start(&self) -> Option<StateId> {
        self.start
    }

    fn final_weight(&self, state: StateId) -> f32 {
        self.states
            .get(state as usize)
            .and_then(|s| s.final_weight)
            .unwrap_or(f32::INFINITY)
    }

    fn arcs(&self, state: StateId) -> &[Arc] {
        self.states
            .get(state as usize)
            .map(|s| s.arcs.as_slice())
            .unwrap_or(&[])
    }
}
