// Difference: A minus the language of a deterministic unweighted acceptor B.

use std::collections::{BTreeSet, VecDeque};

use hashbrown::HashMap;
use wfstkit_core::{CompactSet, EPSILON, ErrorPolicy, Label, Semiring, StateId};

use crate::FstError;
use crate::arc::Arc;
use crate::connect::{ConnectOptions, connect_with};
use crate::fst::{Fst, VectorFst, verify};

#[derive(Debug, Clone, Copy)]
pub struct DifferenceOptions {
    /// Trim the result with connect.
    pub connect: bool,
    pub policy: ErrorPolicy,
}

impl Default for DifferenceOptions {
    fn default() -> Self {
        Self {
            connect: true,
            policy: ErrorPolicy::Report,
        }
    }
}

/// Check that `b` is an epsilon-free, deterministic, unweighted acceptor.
fn check_subtrahend<W: Semiring, F: Fst<W>>(b: &F) -> Result<(), FstError> {
    for state in b.states() {
        let fw = b.final_weight(state);
        if !fw.is_zero() && !fw.is_one() {
            return Err(FstError::NotUnweighted { state });
        }
        let mut labels = CompactSet::new();
        for arc in b.arcs(state) {
            if arc.ilabel != arc.olabel {
                return Err(FstError::NotAcceptor {
                    what: "second operand of difference",
                });
            }
            if !arc.weight.is_one() {
                return Err(FstError::NotUnweighted { state });
            }
            if arc.ilabel == EPSILON || labels.member(arc.ilabel) {
                return Err(FstError::NotDeterministic {
                    state,
                    label: arc.ilabel,
                });
            }
            labels.insert(arc.ilabel);
        }
    }
    Ok(())
}

/// Complete `b` over `alphabet` and complement it.
///
/// A non-final reject state is appended and every label of `alphabet` that
/// is missing at a state is routed to it (the reject state loops on every
/// label), then final and non-final states swap. Arcs are sorted by label.
/// `b` must be an epsilon-free deterministic unweighted acceptor; with no
/// start state it denotes the empty language and its complement is the
/// reject state alone, now accepting everything.
pub fn complement<W: Semiring, F: Fst<W>>(
    b: &F,
    alphabet: &[Label],
) -> Result<VectorFst<W>, FstError> {
    verify(b)?;
    check_subtrahend(b)?;

    let mut out = VectorFst::from_fst(b);
    let reject = out.add_state();
    if out.start().is_none() {
        out.set_start(reject);
    }

    let mut added = 0usize;
    for state in out.states() {
        let present: CompactSet<Label> = out.arcs(state).iter().map(|a| a.ilabel).collect();
        for &label in alphabet {
            if label != EPSILON && !present.member(label) {
                out.add_arc(state, Arc::new(label, label, W::one(), reject));
                added += 1;
            }
        }
        let weight = if out.is_final(state) {
            W::zero()
        } else {
            W::one()
        };
        out.set_final(state, weight);
    }
    out.arc_sort_by_ilabel();
    log::debug!(
        "complement: {} states, {added} completion arcs over {} labels",
        out.num_states(),
        alphabet.len()
    );
    Ok(out)
}

/// Output state for the pair `(p, q)`, queueing the pair when it is new.
fn intern<W: Semiring>(
    out: &mut VectorFst<W>,
    ids: &mut HashMap<(StateId, StateId), StateId>,
    queue: &mut VecDeque<(StateId, StateId, StateId)>,
    pair: (StateId, StateId),
) -> StateId {
    *ids.entry(pair).or_insert_with(|| {
        let id = out.add_state();
        queue.push_back((pair.0, pair.1, id));
        id
    })
}

/// Strings accepted by `a` and not by `b`.
///
/// `b` must be an epsilon-free, deterministic, unweighted acceptor. `a` may
/// be a weighted transducer; its output labels are matched against `b`, and
/// arcs of `a` with an epsilon output label advance `a` alone. The result
/// keeps `a`'s labels and weights.
pub fn difference<W, A, B>(a: &A, b: &B, opts: &DifferenceOptions) -> Result<VectorFst<W>, FstError>
where
    W: Semiring,
    A: Fst<W>,
    B: Fst<W>,
{
    run(a, b, opts).map_err(|e| opts.policy.raise(e))
}

fn run<W, A, B>(a: &A, b: &B, opts: &DifferenceOptions) -> Result<VectorFst<W>, FstError>
where
    W: Semiring,
    A: Fst<W>,
    B: Fst<W>,
{
    verify(a)?;

    let mut labels = BTreeSet::new();
    for state in a.states() {
        labels.extend(a.arcs(state).iter().map(|arc| arc.olabel));
    }
    for state in b.states() {
        labels.extend(b.arcs(state).iter().map(|arc| arc.ilabel));
    }
    labels.remove(&EPSILON);
    let alphabet: Vec<Label> = labels.into_iter().collect();
    let comp = complement(b, &alphabet)?;

    let mut out = VectorFst::new();
    let Some(a_start) = a.start() else {
        return Ok(out);
    };
    let Some(b_start) = comp.start() else {
        return Ok(out);
    };

    let mut ids: HashMap<(StateId, StateId), StateId> = HashMap::new();
    let mut queue = VecDeque::new();
    let start = intern(&mut out, &mut ids, &mut queue, (a_start, b_start));
    out.set_start(start);

    while let Some((p, q, src)) = queue.pop_front() {
        out.set_final(src, a.final_weight(p).times(comp.final_weight(q)));
        for arc in a.arcs(p) {
            let next = if arc.olabel == EPSILON {
                Some(q)
            } else {
                let arcs = comp.arcs(q);
                arcs.binary_search_by_key(&arc.olabel, |c| c.ilabel)
                    .ok()
                    .map(|i| arcs[i].nextstate)
            };
            if let Some(q2) = next {
                let dst = intern(&mut out, &mut ids, &mut queue, (arc.nextstate, q2));
                out.add_arc(
                    src,
                    Arc::new(arc.ilabel, arc.olabel, arc.weight.clone(), dst),
                );
            }
        }
    }
    log::debug!("difference: product has {} states", out.num_states());

    if opts.connect {
        connect_with(&mut out, &ConnectOptions { policy: opts.policy })?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wfstkit_core::{BooleanWeight, TropicalWeight};

    type B = BooleanWeight;

    /// Acceptor of exactly the given strings, as a trie.
    fn strings<W: Semiring>(words: &[&[Label]]) -> VectorFst<W> {
        let mut fst = VectorFst::new();
        let root = fst.add_state();
        fst.set_start(root);
        for word in words {
            let mut state = root;
            for &label in *word {
                let existing = fst
                    .arcs(state)
                    .iter()
                    .find(|a| a.ilabel == label)
                    .map(|a| a.nextstate);
                state = match existing {
                    Some(next) => next,
                    None => {
                        let next = fst.add_state();
                        fst.add_arc(state, Arc::new(label, label, W::one(), next));
                        next
                    }
                };
            }
            fst.set_final(state, W::one());
        }
        fst
    }

    fn accepts<W: Semiring>(fst: &VectorFst<W>, word: &[Label]) -> bool {
        let Some(mut state) = fst.start() else {
            return false;
        };
        for &label in word {
            match fst.arcs(state).iter().find(|a| a.olabel == label) {
                Some(arc) => state = arc.nextstate,
                None => return false,
            }
        }
        fst.is_final(state)
    }

    #[test]
    fn subtracts_a_single_string() {
        let a: VectorFst<B> = strings(&[&[1], &[2]]);
        let b: VectorFst<B> = strings(&[&[1]]);
        let d = difference(&a, &b, &DifferenceOptions::default()).unwrap();
        assert!(accepts(&d, &[2]));
        assert!(!accepts(&d, &[1]));
        assert!(!accepts(&d, &[]));
    }

    #[test]
    fn complement_flips_and_completes() {
        let b: VectorFst<B> = strings(&[&[1]]);
        let c = complement(&b, &[1, 2]).unwrap();
        assert_eq!(c.num_states(), 3);
        assert!(accepts(&c, &[]));
        assert!(!accepts(&c, &[1]));
        assert!(accepts(&c, &[2]));
        assert!(accepts(&c, &[1, 1]));
        assert!(accepts(&c, &[2, 1, 2]));
        for s in c.states() {
            let labels: Vec<_> = c.arcs(s).iter().map(|a| a.ilabel).collect();
            assert_eq!(labels, vec![1, 2]);
        }
    }

    #[test]
    fn empty_subtrahend_keeps_everything() {
        let a: VectorFst<B> = strings(&[&[1, 2], &[3]]);
        let b: VectorFst<B> = VectorFst::new();
        let d = difference(&a, &b, &DifferenceOptions::default()).unwrap();
        assert!(accepts(&d, &[1, 2]));
        assert!(accepts(&d, &[3]));
    }

    #[test]
    fn weights_of_a_are_kept() {
        type T = TropicalWeight;
        let mut a: VectorFst<T> = VectorFst::new();
        let s0 = a.add_state();
        let s1 = a.add_state();
        a.set_start(s0);
        a.set_final(s1, T::new(0.5));
        a.add_arc(s0, Arc::new(7, 2, T::new(1.5), s1));
        a.add_arc(s0, Arc::new(8, 1, T::new(1.0), s1));
        let b: VectorFst<T> = strings(&[&[1]]);

        let d = difference(&a, &b, &DifferenceOptions::default()).unwrap();
        let start = d.start().unwrap();
        assert_eq!(d.arcs(start), &[Arc::new(7, 2, T::new(1.5), 1)]);
        assert_eq!(d.final_weight(1), &T::new(0.5));
    }

    #[test]
    fn output_epsilons_advance_a_alone() {
        let mut a: VectorFst<B> = VectorFst::new();
        for _ in 0..3 {
            a.add_state();
        }
        a.set_start(0);
        a.set_final(2, B::one());
        a.add_arc(0, Arc::new(5, 0, B::one(), 1));
        a.add_arc(1, Arc::new(1, 1, B::one(), 2));
        let b: VectorFst<B> = strings(&[&[2]]);
        let d = difference(&a, &b, &DifferenceOptions::default()).unwrap();
        assert_eq!(d.num_states(), 3);
    }

    #[test]
    fn rejects_nondeterministic_subtrahend() {
        let a: VectorFst<B> = strings(&[&[1]]);
        let mut b: VectorFst<B> = strings(&[&[1]]);
        let extra = b.add_state();
        b.add_arc(0, Arc::new(1, 1, B::one(), extra));
        let err = difference(&a, &b, &DifferenceOptions::default()).unwrap_err();
        assert!(matches!(err, FstError::NotDeterministic { state: 0, label: 1 }));
    }

    #[test]
    fn rejects_weighted_or_transducer_subtrahend() {
        type T = TropicalWeight;
        let a: VectorFst<T> = strings(&[&[1]]);
        let mut b: VectorFst<T> = strings(&[&[1]]);
        b.set_final(1, T::new(2.0));
        assert!(matches!(
            difference(&a, &b, &DifferenceOptions::default()),
            Err(FstError::NotUnweighted { state: 1 })
        ));

        let mut b: VectorFst<T> = strings(&[&[1]]);
        b.add_arc(1, Arc::new(3, 4, T::one(), 0));
        assert!(matches!(
            difference(&a, &b, &DifferenceOptions::default()),
            Err(FstError::NotAcceptor { .. })
        ));
    }

    #[test]
    fn rejects_epsilon_in_subtrahend() {
        let a: VectorFst<B> = strings(&[&[1]]);
        let mut b: VectorFst<B> = strings(&[&[1]]);
        b.add_arc(0, Arc::new(0, 0, B::one(), 1));
        assert!(matches!(
            difference(&a, &b, &DifferenceOptions::default()),
            Err(FstError::NotDeterministic { label: 0, .. })
        ));
    }
}
