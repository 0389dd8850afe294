// Arc record shared by every automaton and algorithm.

use wfstkit_core::{EPSILON, Label, StateId};

/// Weighted arc, owned by its source state.
///
/// `nextstate` is a plain index into the owning automaton's state arena; it
/// is only meaningful while that automaton is alive and is rewritten when
/// states are deleted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Arc<W> {
    pub ilabel: Label,
    pub olabel: Label,
    pub weight: W,
    pub nextstate: StateId,
}

impl<W> Arc<W> {
    pub fn new(ilabel: Label, olabel: Label, weight: W, nextstate: StateId) -> Self {
        Self {
            ilabel,
            olabel,
            weight,
            nextstate,
        }
    }

    /// Both labels are epsilon.
    #[inline]
    pub fn is_epsilon(&self) -> bool {
        self.ilabel == EPSILON && self.olabel == EPSILON
    }
}
