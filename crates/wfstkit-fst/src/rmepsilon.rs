// RmEpsilon: remove epsilon arcs by folding weighted epsilon-closures.

use std::collections::VecDeque;

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use wfstkit_core::{CompactSet, DEFAULT_DELTA, ErrorPolicy, Label, Semiring, StateId};

use crate::FstError;
use crate::arc::Arc;
use crate::connect::{ConnectOptions, connect_with};
use crate::fst::{Fst, VectorFst, verify};
use crate::reverse::reverse;

#[derive(Debug, Clone, Copy)]
pub struct RmEpsilonOptions {
    /// Trim the result with connect.
    pub connect: bool,
    /// Remove epsilons on the reversed automaton and reverse back. Tends to
    /// give a smaller result when epsilons cluster near final states.
    pub reverse: bool,
    /// Convergence threshold for the closure distances.
    pub delta: f32,
    /// Abort a closure after this many relaxations. `None` trusts the
    /// semiring to converge.
    pub relaxation_limit: Option<usize>,
    pub policy: ErrorPolicy,
}

impl Default for RmEpsilonOptions {
    fn default() -> Self {
        Self {
            connect: true,
            reverse: false,
            delta: DEFAULT_DELTA,
            relaxation_limit: None,
            policy: ErrorPolicy::Report,
        }
    }
}

/// Weighted epsilon-closure of `state`: every state reachable through arcs
/// whose labels are both epsilon, paired with the ⊕-sum of the weights of
/// all such paths.
///
/// `state` itself is always first, with at least `One` (the empty path).
/// The other members follow in discovery order. Distances are relaxed from
/// a FIFO queue until no update changes a distance by more than `delta`.
pub fn epsilon_closure<W: Semiring, F: Fst<W>>(
    fst: &F,
    state: StateId,
    delta: f32,
    relaxation_limit: Option<usize>,
) -> Result<Vec<(StateId, W)>, FstError> {
    let mut order = vec![state];
    let mut distance: HashMap<StateId, W> = HashMap::new();
    let mut residual: HashMap<StateId, W> = HashMap::new();
    distance.insert(state, W::one());
    residual.insert(state, W::one());

    let mut queue = VecDeque::from([state]);
    let mut enqueued: CompactSet<StateId> = CompactSet::new();
    enqueued.insert(state);
    let mut relaxations = 0usize;

    while let Some(q) = queue.pop_front() {
        enqueued.erase(q);
        let r = match residual.get_mut(&q) {
            Some(r) => std::mem::replace(r, W::zero()),
            None => continue,
        };
        if r.is_zero() {
            continue;
        }
        for arc in fst.arcs(q).iter().filter(|a| a.is_epsilon()) {
            let next = arc.nextstate;
            let w = r.times(&arc.weight);
            let current = distance.get(&next).cloned().unwrap_or_else(W::zero);
            let updated = current.plus(&w);
            if current.approx_eq(&updated, delta) {
                continue;
            }

            relaxations += 1;
            if let Some(limit) = relaxation_limit {
                if relaxations > limit {
                    return Err(FstError::EpsilonClosureDiverged { state, limit });
                }
            }

            if distance.insert(next, updated).is_none() {
                order.push(next);
            }
            let rd = residual.entry(next).or_insert_with(W::zero);
            *rd = rd.plus(&w);
            if !enqueued.member(next) {
                enqueued.insert(next);
                queue.push_back(next);
            }
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|s| distance.remove(&s).map(|d| (s, d)))
        .collect())
}

/// Remove epsilon arcs from `fst` in place with default options.
pub fn rm_epsilon<W: Semiring>(fst: &mut VectorFst<W>) -> Result<(), FstError> {
    rm_epsilon_with(fst, &RmEpsilonOptions::default())
}

/// Remove every arc whose input and output labels are both epsilon while
/// preserving the weighted relation.
///
/// For each state `s` with closure `{(q, d[q])}`, the new arcs of `s` are
/// the non-epsilon arcs of every `q`, weighted `d[q] ⊗ w`, and the new final
/// weight is `⊕ d[q] ⊗ final(q)`. Arcs agreeing on input label, output
/// label and destination are merged with ⊕.
pub fn rm_epsilon_with<W: Semiring>(
    fst: &mut VectorFst<W>,
    opts: &RmEpsilonOptions,
) -> Result<(), FstError> {
    run(fst, opts).map_err(|e| opts.policy.raise(e))
}

fn run<W: Semiring>(fst: &mut VectorFst<W>, opts: &RmEpsilonOptions) -> Result<(), FstError> {
    verify(fst)?;
    if opts.reverse {
        let mut reversed = reverse(fst);
        remove_in_place(&mut reversed, opts)?;
        let mut restored = reverse(&reversed);
        remove_in_place(&mut restored, opts)?;
        *fst = restored;
    } else {
        remove_in_place(fst, opts)?;
    }
    Ok(())
}

fn remove_in_place<W: Semiring>(
    fst: &mut VectorFst<W>,
    opts: &RmEpsilonOptions,
) -> Result<(), FstError> {
    let num_states = fst.num_states();
    let mut rewritten = Vec::with_capacity(num_states);
    let mut removed = 0usize;

    for state in fst.states() {
        let closure = epsilon_closure(&*fst, state, opts.delta, opts.relaxation_limit)?;

        let mut arcs: Vec<Arc<W>> = Vec::new();
        let mut slots: HashMap<(Label, Label, StateId), usize> = HashMap::new();
        let mut final_weight = W::zero();

        for (q, d) in &closure {
            final_weight = final_weight.plus(&d.times(fst.final_weight(*q)));
            for arc in fst.arcs(*q) {
                if arc.is_epsilon() {
                    if *q == state {
                        removed += 1;
                    }
                    continue;
                }
                let w = d.times(&arc.weight);
                match slots.entry((arc.ilabel, arc.olabel, arc.nextstate)) {
                    Entry::Occupied(slot) => {
                        let merged = &mut arcs[*slot.get()].weight;
                        *merged = merged.plus(&w);
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(arcs.len());
                        arcs.push(Arc::new(arc.ilabel, arc.olabel, w, arc.nextstate));
                    }
                }
            }
        }
        rewritten.push((arcs, final_weight));
    }

    for (state, (arcs, final_weight)) in (0..).zip(rewritten) {
        fst.set_arcs(state, arcs);
        fst.set_final(state, final_weight);
    }
    log::debug!("rmepsilon: removed {removed} epsilon arcs from {num_states} states");

    if opts.connect {
        connect_with(fst, &ConnectOptions { policy: opts.policy })?;
    }
    Ok(())
}
