// Connect: remove states that lie on no path from the start to a final state.

use wfstkit_core::{ErrorPolicy, Semiring, StateId};

use crate::FstError;
use crate::fst::{Fst, VectorFst, verify};

#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectOptions {
    pub policy: ErrorPolicy,
}

/// States reachable from the start, indexed by state id.
///
/// Iterative depth-first search; the recursion depth does not grow with the
/// automaton. Arcs to out-of-range states are ignored.
pub fn accessible_states<W: Semiring, F: Fst<W>>(fst: &F) -> Vec<bool> {
    let mut seen = vec![false; fst.num_states()];
    let Some(start) = fst.start() else {
        return seen;
    };
    let mut stack = vec![start];
    seen[start as usize] = true;
    while let Some(state) = stack.pop() {
        for arc in fst.arcs(state) {
            let next = arc.nextstate as usize;
            if next < seen.len() && !seen[next] {
                seen[next] = true;
                stack.push(arc.nextstate);
            }
        }
    }
    seen
}

/// States from which some final state is reachable, indexed by state id.
pub fn coaccessible_states<W: Semiring, F: Fst<W>>(fst: &F) -> Vec<bool> {
    let n = fst.num_states();
    let mut incoming: Vec<Vec<StateId>> = vec![Vec::new(); n];
    for state in fst.states() {
        for arc in fst.arcs(state) {
            if let Some(prev) = incoming.get_mut(arc.nextstate as usize) {
                prev.push(state);
            }
        }
    }

    let mut seen = vec![false; n];
    let mut stack = Vec::new();
    for state in fst.states() {
        if fst.is_final(state) {
            seen[state as usize] = true;
            stack.push(state);
        }
    }
    while let Some(state) = stack.pop() {
        for &prev in &incoming[state as usize] {
            if !seen[prev as usize] {
                seen[prev as usize] = true;
                stack.push(prev);
            }
        }
    }
    seen
}

/// Trim `fst` in place to the states that are both accessible and
/// coaccessible. Survivors keep their relative order and are renumbered
/// densely. If the start state is not coaccessible the result is the empty
/// automaton (no states, no start).
pub fn connect<W: Semiring>(fst: &mut VectorFst<W>) -> Result<(), FstError> {
    connect_with(fst, &ConnectOptions::default())
}

pub fn connect_with<W: Semiring>(
    fst: &mut VectorFst<W>,
    opts: &ConnectOptions,
) -> Result<(), FstError> {
    verify(fst).map_err(|e| opts.policy.raise(e))?;

    let access = accessible_states(fst);
    let coaccess = coaccessible_states(fst);
    let dead: Vec<bool> = access
        .iter()
        .zip(&coaccess)
        .map(|(&a, &c)| !(a && c))
        .collect();

    let before = fst.num_states();
    match fst.start() {
        Some(start) if !dead[start as usize] => fst.delete_states(&dead),
        _ => fst.delete_all_states(),
    }
    log::debug!("connect: {} -> {} states", before, fst.num_states());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Arc;
    use wfstkit_core::TropicalWeight;

    type W = TropicalWeight;

    fn arc(label: u32, to: u32) -> Arc<W> {
        Arc::new(label, label, W::one(), to)
    }

    #[test]
    fn removes_unreachable_and_dead_end_states() {
        // 0 -> 1 -> 2(final); 0 -> 3 (dead end); 4 -> 2 (unreachable)
        let mut fst: VectorFst<W> = VectorFst::new();
        for _ in 0..5 {
            fst.add_state();
        }
        fst.set_start(0);
        fst.set_final(2, W::one());
        fst.add_arc(0, arc(1, 1));
        fst.add_arc(0, arc(2, 3));
        fst.add_arc(1, arc(3, 2));
        fst.add_arc(4, arc(4, 2));

        connect(&mut fst).unwrap();
        assert_eq!(fst.num_states(), 3);
        assert_eq!(fst.start(), Some(0));
        assert_eq!(fst.arcs(0), &[arc(1, 1)]);
        assert_eq!(fst.arcs(1), &[arc(3, 2)]);
        assert!(fst.is_final(2));
    }

    #[test]
    fn no_final_state_gives_empty_automaton() {
        let mut fst: VectorFst<W> = VectorFst::new();
        let s = fst.add_state();
        fst.set_start(s);
        fst.add_arc(s, arc(1, s));
        connect(&mut fst).unwrap();
        assert_eq!(fst.num_states(), 0);
        assert_eq!(fst.start(), None);
    }

    #[test]
    fn no_start_gives_empty_automaton() {
        let mut fst: VectorFst<W> = VectorFst::new();
        let s = fst.add_state();
        fst.set_final(s, W::one());
        connect(&mut fst).unwrap();
        assert_eq!(fst.num_states(), 0);
    }

    #[test]
    fn cycles_survive() {
        let mut fst: VectorFst<W> = VectorFst::new();
        let s0 = fst.add_state();
        let s1 = fst.add_state();
        fst.set_start(s0);
        fst.set_final(s1, W::one());
        fst.add_arc(s0, arc(1, s1));
        fst.add_arc(s1, arc(2, s0));
        let before = fst.clone();
        connect(&mut fst).unwrap();
        assert_eq!(fst, before);
    }

    #[test]
    fn dangling_arc_is_reported() {
        let mut fst: VectorFst<W> = VectorFst::new();
        let s = fst.add_state();
        fst.set_start(s);
        fst.add_arc(s, arc(1, 9));
        assert!(matches!(
            connect(&mut fst),
            Err(FstError::DanglingArc { target: 9, .. })
        ));
    }

    #[test]
    fn long_chain_does_not_recurse() {
        let mut fst: VectorFst<W> = VectorFst::new();
        let n = 200_000;
        for _ in 0..n {
            fst.add_state();
        }
        fst.set_start(0);
        for s in 0..n - 1 {
            fst.add_arc(s, arc(1, s + 1));
        }
        fst.set_final(n - 1, W::one());
        connect(&mut fst).unwrap();
        assert_eq!(fst.num_states(), n as usize);
    }
}
