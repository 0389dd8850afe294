// Reverse: swap arc direction, exchange initial and final states.

use wfstkit_core::{EPSILON, Semiring};

use crate::arc::Arc;
use crate::fst::{Fst, VectorFst};

/// Reverse `fst`.
///
/// State `s` of the input becomes state `s + 1`; state 0 is a fresh
/// super-initial state with an epsilon arc to every former final state,
/// weighted by the reversed final weight. The former start state becomes the
/// only final state, with weight `One`. Arc weights are reversed.
///
/// An input without a start state yields an empty automaton.
pub fn reverse<W: Semiring, F: Fst<W>>(fst: &F) -> VectorFst<W> {
    let mut out = VectorFst::new();
    let Some(start) = fst.start() else {
        return out;
    };

    out.reserve_states(fst.num_states() + 1);
    let superinitial = out.add_state();
    for _ in fst.states() {
        out.add_state();
    }
    out.set_start(superinitial);
    out.set_final(start + 1, W::one());

    for state in fst.states() {
        let fw = fst.final_weight(state);
        if !fw.is_zero() {
            out.add_arc(
                superinitial,
                Arc::new(EPSILON, EPSILON, fw.reverse(), state + 1),
            );
        }
        for arc in fst.arcs(state) {
            out.add_arc(
                arc.nextstate + 1,
                Arc::new(arc.ilabel, arc.olabel, arc.weight.reverse(), state + 1),
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wfstkit_core::TropicalWeight;

    type W = TropicalWeight;

    #[test]
    fn reverses_a_chain() {
        // 0 -a/1-> 1 -b/2-> 2 (final 3)
        let mut fst: VectorFst<W> = VectorFst::new();
        for _ in 0..3 {
            fst.add_state();
        }
        fst.set_start(0);
        fst.set_final(2, W::new(3.0));
        fst.add_arc(0, Arc::new(1, 1, W::new(1.0), 1));
        fst.add_arc(1, Arc::new(2, 2, W::new(2.0), 2));

        let r = reverse(&fst);
        assert_eq!(r.num_states(), 4);
        assert_eq!(r.start(), Some(0));
        assert_eq!(r.arcs(0), &[Arc::new(0, 0, W::new(3.0), 3)]);
        assert_eq!(r.arcs(3), &[Arc::new(2, 2, W::new(2.0), 2)]);
        assert_eq!(r.arcs(2), &[Arc::new(1, 1, W::new(1.0), 1)]);
        assert_eq!(r.final_weight(1), &W::one());
        assert!(!r.is_final(3));
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let fst: VectorFst<W> = VectorFst::new();
        let r = reverse(&fst);
        assert_eq!(r.num_states(), 0);
        assert_eq!(r.start(), None);
    }
}
