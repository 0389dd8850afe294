// Automaton model: read-only view trait and the mutable vector arena.

use std::ops::Range;

use wfstkit_core::{EPSILON, Semiring, StateId};

use crate::FstError;
use crate::arc::Arc;

/// Read-only view of a weighted automaton.
///
/// States are dense ids `0..num_states()`. Accessors index the state arena
/// directly and panic on an out-of-range id; run [`verify`] first on
/// automata from untrusted sources.
pub trait Fst<W: Semiring> {
    /// The initial state, or `None` for an automaton with no start (the empty language).
    fn start(&self) -> Option<StateId>;

    /// Final weight of `state`; `W::zero()` when the state is not final.
    fn final_weight(&self, state: StateId) -> &W;

    fn num_states(&self) -> usize;

    /// Arcs leaving `state`, in insertion order.
    fn arcs(&self, state: StateId) -> &[Arc<W>];

    fn num_arcs(&self, state: StateId) -> usize {
        self.arcs(state).len()
    }

    /// Count of arcs leaving `state` whose input label is epsilon.
    fn num_input_epsilons(&self, state: StateId) -> usize {
        self.arcs(state)
            .iter()
            .filter(|a| a.ilabel == EPSILON)
            .count()
    }

    fn num_output_epsilons(&self, state: StateId) -> usize {
        self.arcs(state)
            .iter()
            .filter(|a| a.olabel == EPSILON)
            .count()
    }

    fn is_final(&self, state: StateId) -> bool {
        !self.final_weight(state).is_zero()
    }

    fn states(&self) -> Range<StateId> {
        0..self.num_states() as StateId
    }

    /// Arc count summed over all states.
    fn total_arcs(&self) -> usize {
        self.states().map(|s| self.num_arcs(s)).sum()
    }
}

/// Check the structural invariants every algorithm relies on: the start
/// state and every arc destination name an existing state, and every weight
/// is a member of the semiring.
pub fn verify<W: Semiring, F: Fst<W>>(fst: &F) -> Result<(), FstError> {
    let num_states = fst.num_states();
    match fst.start() {
        Some(start) if start as usize >= num_states => return Err(FstError::InvalidStart(start)),
        _ => {}
    }
    for state in fst.states() {
        if !fst.final_weight(state).is_member() {
            return Err(FstError::InvalidWeight { state });
        }
        for (i, arc) in fst.arcs(state).iter().enumerate() {
            if arc.nextstate as usize >= num_states {
                return Err(FstError::DanglingArc {
                    state,
                    arc: i,
                    target: arc.nextstate,
                });
            }
            if !arc.weight.is_member() {
                return Err(FstError::InvalidWeight { state });
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct VectorState<W> {
    final_weight: W,
    arcs: Vec<Arc<W>>,
}

/// Mutable automaton stored as a vector of states, each owning its arcs.
///
/// Equality is structural: same start, same states in the same order with
/// the same final weights and the same arc sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorFst<W> {
    states: Vec<VectorState<W>>,
    start: Option<StateId>,
}

impl<W: Semiring> Default for VectorFst<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Semiring> VectorFst<W> {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            start: None,
        }
    }

    /// Deep copy of any automaton view.
    pub fn from_fst<F: Fst<W>>(fst: &F) -> Self {
        let mut out = Self::new();
        out.reserve_states(fst.num_states());
        for state in fst.states() {
            let s = out.add_state();
            out.set_final(s, fst.final_weight(state).clone());
            out.states[s as usize].arcs = fst.arcs(state).to_vec();
        }
        out.start = fst.start();
        out
    }

    /// Append a non-final state with no arcs and return its id.
    pub fn add_state(&mut self) -> StateId {
        let id = self.states.len() as StateId;
        self.states.push(VectorState {
            final_weight: W::zero(),
            arcs: Vec::new(),
        });
        id
    }

    pub fn reserve_states(&mut self, additional: usize) {
        self.states.reserve(additional);
    }

    pub fn set_start(&mut self, state: StateId) {
        self.start = Some(state);
    }

    /// Set the final weight of `state`. `W::zero()` makes it non-final.
    pub fn set_final(&mut self, state: StateId, weight: W) {
        self.states[state as usize].final_weight = weight;
    }

    pub fn add_arc(&mut self, state: StateId, arc: Arc<W>) {
        self.states[state as usize].arcs.push(arc);
    }

    /// Mutable access to the arcs of `state`.
    pub fn arcs_mut(&mut self, state: StateId) -> &mut Vec<Arc<W>> {
        &mut self.states[state as usize].arcs
    }

    /// Replace all arcs of `state`.
    pub fn set_arcs(&mut self, state: StateId, arcs: Vec<Arc<W>>) {
        self.states[state as usize].arcs = arcs;
    }

    /// Remove every state and the start.
    pub fn delete_all_states(&mut self) {
        self.states.clear();
        self.start = None;
    }

    /// Delete the states flagged in `dead` (indexed by state id), renumber
    /// the survivors densely in their original order, and drop every arc
    /// that led to a deleted state. The start is cleared if it was deleted.
    pub fn delete_states(&mut self, dead: &[bool]) {
        let mut new_id = vec![None; self.states.len()];
        let mut next: StateId = 0;
        for (s, id) in new_id.iter_mut().enumerate() {
            if !dead.get(s).copied().unwrap_or(false) {
                *id = Some(next);
                next += 1;
            }
        }

        let states = std::mem::take(&mut self.states);
        self.states = states
            .into_iter()
            .zip(&new_id)
            .filter(|(_, id)| id.is_some())
            .map(|(mut state, _)| {
                state.arcs.retain_mut(|arc| match new_id[arc.nextstate as usize] {
                    Some(n) => {
                        arc.nextstate = n;
                        true
                    }
                    None => false,
                });
                state
            })
            .collect();

        self.start = self.start.and_then(|s| new_id[s as usize]);
    }

    /// Stable sort of each state's arcs by input label.
    pub fn arc_sort_by_ilabel(&mut self) {
        for state in &mut self.states {
            state.arcs.sort_by_key(|a| a.ilabel);
        }
    }
}

impl<W: Semiring> Fst<W> for VectorFst<W> {
    #[inline]
    fn start(&self) -> Option<StateId> {
        self.start
    }

    #[inline]
    fn final_weight(&self, state: StateId) -> &W {
        &self.states[state as usize].final_weight
    }

    #[inline]
    fn num_states(&self) -> usize {
        self.states.len()
    }

    #[inline]
    fn arcs(&self, state: StateId) -> &[Arc<W>] {
        &self.states[state as usize].arcs
    }
}
