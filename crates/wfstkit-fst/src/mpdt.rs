// MPDT expansion: bounded-stack multi-pushdown transducer to plain automaton.

use std::collections::{BTreeSet, VecDeque};

use hashbrown::HashMap;
use hashbrown::HashSet;
use wfstkit_core::{CompactSet, EPSILON, ErrorPolicy, Label, Semiring, StateId};

use crate::FstError;
use crate::arc::Arc;
use crate::connect::{ConnectOptions, connect_with};
use crate::fst::{Fst, VectorFst, verify};

/// What to do when a push would exceed [`StackBound::max_depth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnStackOverflow {
    /// Drop the offending arc; the path through it is not accepted.
    RejectPath,
    /// Fail the whole expansion with [`FstError::StackBoundExceeded`].
    Abort,
}

/// Limit on the combined depth of all stacks.
///
/// There is no default: callers must pick both the depth and the overflow
/// behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackBound {
    pub max_depth: usize,
    pub on_exceed: OnStackOverflow,
}

#[derive(Debug, Clone, Copy)]
pub struct MPdtExpandOptions {
    /// Trim the result with connect.
    pub connect: bool,
    /// Keep parenthesis labels on the output arcs instead of replacing them
    /// with epsilon.
    pub keep_parentheses: bool,
    pub bound: StackBound,
    pub policy: ErrorPolicy,
}

impl MPdtExpandOptions {
    pub fn new(bound: StackBound) -> Self {
        Self {
            connect: true,
            keep_parentheses: false,
            bound,
            policy: ErrorPolicy::Report,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Paren {
    Open(usize),
    Close(usize),
}

/// Parenthesis pairs and the stack each pair lives on.
///
/// Stack ids are arbitrary integers; they are mapped to dense indices in
/// ascending order. Every label must be non-epsilon and used by exactly one
/// parenthesis role.
#[derive(Debug, Clone)]
pub struct ParenAssignment {
    stack_of: Vec<usize>,
    num_stacks: usize,
    labels: CompactSet<Label>,
    by_label: HashMap<Label, Paren>,
}

impl ParenAssignment {
    pub fn new(pairs: &[(Label, Label)], stacks: &[u32]) -> Result<Self, FstError> {
        if pairs.len() != stacks.len() {
            return Err(FstError::InvalidParentheses(format!(
                "{} parenthesis pairs but {} stack assignments",
                pairs.len(),
                stacks.len()
            )));
        }

        let ids: BTreeSet<u32> = stacks.iter().copied().collect();
        let dense: HashMap<u32, usize> = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let mut labels = CompactSet::new();
        let mut by_label = HashMap::new();
        for (i, &(open, close)) in pairs.iter().enumerate() {
            for (label, role) in [(open, Paren::Open(i)), (close, Paren::Close(i))] {
                if label == EPSILON {
                    return Err(FstError::InvalidParentheses(
                        "epsilon cannot be a parenthesis".to_string(),
                    ));
                }
                if by_label.insert(label, role).is_some() {
                    return Err(FstError::InvalidParentheses(format!(
                        "label {label} is used by more than one parenthesis"
                    )));
                }
                labels.insert(label);
            }
        }

        Ok(Self {
            stack_of: stacks.iter().map(|id| dense[id]).collect(),
            num_stacks: ids.len(),
            labels,
            by_label,
        })
    }

    pub fn len(&self) -> usize {
        self.stack_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack_of.is_empty()
    }

    pub fn num_stacks(&self) -> usize {
        self.num_stacks
    }

    fn classify(&self, label: Label) -> Option<Paren> {
        if !self.labels.member(label) {
            return None;
        }
        self.by_label.get(&label).copied()
    }
}

/// Shared trie of stack contents. Node 0 is the empty stack; every other
/// node is one open parenthesis on top of its parent.
struct StackTrie {
    nodes: Vec<StackNode>,
    children: HashMap<(usize, usize), usize>,
}

struct StackNode {
    parent: usize,
    paren: Option<usize>,
    depth: usize,
}

impl StackTrie {
    fn new() -> Self {
        Self {
            nodes: vec![StackNode {
                parent: 0,
                paren: None,
                depth: 0,
            }],
            children: HashMap::new(),
        }
    }

    fn push(&mut self, node: usize, paren: usize) -> usize {
        let depth = self.nodes[node].depth + 1;
        let nodes = &mut self.nodes;
        *self.children.entry((node, paren)).or_insert_with(|| {
            nodes.push(StackNode {
                parent: node,
                paren: Some(paren),
                depth,
            });
            nodes.len() - 1
        })
    }

    fn top(&self, node: usize) -> Option<usize> {
        self.nodes[node].paren
    }

    fn pop(&self, node: usize) -> usize {
        self.nodes[node].parent
    }

    fn depth(&self, node: usize) -> usize {
        self.nodes[node].depth
    }
}

/// Interned per-stack configurations. Config 0 has every stack empty.
struct Configs {
    configs: Vec<Vec<usize>>,
    ids: HashMap<Vec<usize>, usize>,
}

impl Configs {
    fn new(num_stacks: usize) -> Self {
        let empty = vec![0; num_stacks];
        let mut ids = HashMap::new();
        ids.insert(empty.clone(), 0);
        Self {
            configs: vec![empty],
            ids,
        }
    }

    fn intern(&mut self, config: Vec<usize>) -> usize {
        if let Some(&id) = self.ids.get(&config) {
            return id;
        }
        let id = self.configs.len();
        self.configs.push(config.clone());
        self.ids.insert(config, id);
        id
    }
}

/// Expand `fst` into an ordinary automaton.
///
/// An arc whose input label opens a parenthesis pushes it onto that pair's
/// stack; an arc whose input label closes one is followed only if the same
/// pair is on top of its stack, and pops it. A state of the result is
/// final only when every stack is empty. Paths whose close does not match
/// are dropped, as are pushes past the combined depth bound under
/// [`OnStackOverflow::RejectPath`].
///
/// A matched open/close pair is kept as two epsilon arcs, each with its own
/// weight, rather than merged into one bypass arc weighted open ⊗ close.
/// Path weights are the same; run rm-epsilon to collapse the pairs.
pub fn mpdt_expand<W: Semiring, F: Fst<W>>(
    fst: &F,
    parens: &ParenAssignment,
    opts: &MPdtExpandOptions,
) -> Result<VectorFst<W>, FstError> {
    expand(fst, parens, opts).map_err(|e| opts.policy.raise(e))
}

fn expand<W: Semiring, F: Fst<W>>(
    fst: &F,
    parens: &ParenAssignment,
    opts: &MPdtExpandOptions,
) -> Result<VectorFst<W>, FstError> {
    verify(fst)?;
    let mut out = VectorFst::new();
    let Some(start) = fst.start() else {
        return Ok(out);
    };

    let mut trie = StackTrie::new();
    let mut configs = Configs::new(parens.num_stacks());
    let mut ids: HashMap<(StateId, usize), StateId> = HashMap::new();
    let mut queue: VecDeque<(StateId, usize, StateId)> = VecDeque::new();
    let mut intern = |out: &mut VectorFst<W>,
                      queue: &mut VecDeque<(StateId, usize, StateId)>,
                      state: StateId,
                      config: usize| {
        *ids.entry((state, config)).or_insert_with(|| {
            let id = out.add_state();
            queue.push_back((state, config, id));
            id
        })
    };

    let initial = intern(&mut out, &mut queue, start, 0);
    out.set_start(initial);

    let mut rejected = 0usize;
    let mut overflowed: HashSet<StateId> = HashSet::new();
    while let Some((state, config, src)) = queue.pop_front() {
        if config == 0 {
            out.set_final(src, fst.final_weight(state).clone());
        }
        let stacks = configs.configs[config].clone();
        let depth: usize = stacks.iter().map(|&n| trie.depth(n)).sum();

        for arc in fst.arcs(state) {
            let (next_config, is_paren) = match parens.classify(arc.ilabel) {
                None => (config, false),
                Some(Paren::Open(i)) => {
                    if depth + 1 > opts.bound.max_depth {
                        match opts.bound.on_exceed {
                            OnStackOverflow::RejectPath => {
                                overflowed.insert(state);
                                rejected += 1;
                                continue;
                            }
                            OnStackOverflow::Abort => {
                                return Err(FstError::StackBoundExceeded {
                                    state,
                                    depth: depth + 1,
                                    bound: opts.bound.max_depth,
                                });
                            }
                        }
                    }
                    let k = parens.stack_of[i];
                    let mut pushed = stacks.clone();
                    pushed[k] = trie.push(pushed[k], i);
                    (configs.intern(pushed), true)
                }
                Some(Paren::Close(i)) => {
                    let k = parens.stack_of[i];
                    if trie.top(stacks[k]) != Some(i) {
                        rejected += 1;
                        continue;
                    }
                    let mut popped = stacks.clone();
                    popped[k] = trie.pop(popped[k]);
                    (configs.intern(popped), true)
                }
            };

            let (ilabel, olabel) = if is_paren && !opts.keep_parentheses {
                (EPSILON, EPSILON)
            } else {
                (arc.ilabel, arc.olabel)
            };
            let dst = intern(&mut out, &mut queue, arc.nextstate, next_config);
            out.add_arc(src, Arc::new(ilabel, olabel, arc.weight.clone(), dst));
        }
    }

    if !overflowed.is_empty() {
        log::warn!(
            "mpdt expand: stack bound {} reached at {} states; paths beyond it were dropped",
            opts.bound.max_depth,
            overflowed.len()
        );
    }
    log::debug!(
        "mpdt expand: {} states, {} stack configurations, {rejected} arcs rejected",
        out.num_states(),
        configs.configs.len()
    );

    if opts.connect {
        connect_with(&mut out, &ConnectOptions { policy: opts.policy })?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wfstkit_core::{BooleanWeight, TropicalWeight};

    type T = TropicalWeight;

    const OPEN: Label = 10;
    const CLOSE: Label = 11;

    fn reject(max_depth: usize) -> MPdtExpandOptions {
        MPdtExpandOptions::new(StackBound {
            max_depth,
            on_exceed: OnStackOverflow::RejectPath,
        })
    }

    fn chain<W: Semiring>(labels: &[Label]) -> VectorFst<W> {
        let mut fst = VectorFst::new();
        let mut state = fst.add_state();
        fst.set_start(state);
        for &label in labels {
            let next = fst.add_state();
            fst.add_arc(state, Arc::new(label, label, W::one(), next));
            state = next;
        }
        fst.set_final(state, W::one());
        fst
    }

    /// a^n b^n: push on `OPEN`, move to state 1 on label 3, pop on `CLOSE`.
    fn balanced() -> VectorFst<BooleanWeight> {
        let t = BooleanWeight::one();
        let mut fst = VectorFst::new();
        let s0 = fst.add_state();
        let s1 = fst.add_state();
        fst.set_start(s0);
        fst.set_final(s1, t);
        fst.add_arc(s0, Arc::new(OPEN, OPEN, t, s0));
        fst.add_arc(s0, Arc::new(3, 3, t, s1));
        fst.add_arc(s1, Arc::new(CLOSE, CLOSE, t, s1));
        fst
    }

    fn one_pair() -> ParenAssignment {
        ParenAssignment::new(&[(OPEN, CLOSE)], &[7]).unwrap()
    }

    #[test]
    fn matched_pair_becomes_epsilons() {
        let fst: VectorFst<T> = chain(&[OPEN, 1, CLOSE]);
        let out = mpdt_expand(&fst, &one_pair(), &reject(4)).unwrap();
        assert_eq!(out.num_states(), 4);
        let labels: Vec<_> = (0..3).map(|s| out.arcs(s)[0].ilabel).collect();
        assert_eq!(labels, vec![EPSILON, 1, EPSILON]);
        assert!(out.is_final(3));
    }

    #[test]
    fn keep_parentheses_keeps_labels() {
        let fst: VectorFst<T> = chain(&[OPEN, 1, CLOSE]);
        let opts = MPdtExpandOptions {
            keep_parentheses: true,
            ..reject(4)
        };
        let out = mpdt_expand(&fst, &one_pair(), &opts).unwrap();
        let labels: Vec<_> = (0..3).map(|s| out.arcs(s)[0].ilabel).collect();
        assert_eq!(labels, vec![OPEN, 1, CLOSE]);
    }

    #[test]
    fn unclosed_open_is_not_final() {
        let fst: VectorFst<T> = chain(&[OPEN, 1]);
        let out = mpdt_expand(&fst, &one_pair(), &reject(4)).unwrap();
        assert_eq!(out.num_states(), 0);
        assert_eq!(out.start(), None);
    }

    #[test]
    fn bounded_counting_language() {
        let out = mpdt_expand(&balanced(), &one_pair(), &reject(3)).unwrap();
        // (state, depth) for both states and depths 0..=3.
        assert_eq!(out.num_states(), 8);
        let finals = out.states().filter(|&s| out.is_final(s)).count();
        assert_eq!(finals, 1);
    }

    #[test]
    fn abort_on_overflow() {
        let opts = MPdtExpandOptions::new(StackBound {
            max_depth: 3,
            on_exceed: OnStackOverflow::Abort,
        });
        let err = mpdt_expand(&balanced(), &one_pair(), &opts).unwrap_err();
        assert!(matches!(
            err,
            FstError::StackBoundExceeded {
                state: 0,
                depth: 4,
                bound: 3
            }
        ));
    }

    #[test]
    fn mismatched_close_rejects_the_path() {
        let parens = ParenAssignment::new(&[(10, 11), (20, 21)], &[0, 0]).unwrap();
        let fst: VectorFst<T> = chain(&[10, 21]);
        let out = mpdt_expand(&fst, &parens, &reject(4)).unwrap();
        assert_eq!(out.num_states(), 0);
    }

    #[test]
    fn separate_stacks_allow_crossing() {
        let fst: VectorFst<T> = chain(&[10, 20, 11, 21]);

        let two = ParenAssignment::new(&[(10, 11), (20, 21)], &[1, 2]).unwrap();
        assert_eq!(two.num_stacks(), 2);
        let out = mpdt_expand(&fst, &two, &reject(4)).unwrap();
        assert_eq!(out.num_states(), 5);

        let one = ParenAssignment::new(&[(10, 11), (20, 21)], &[5, 5]).unwrap();
        let out = mpdt_expand(&fst, &one, &reject(4)).unwrap();
        assert_eq!(out.num_states(), 0);
    }

    #[test]
    fn weights_are_carried() {
        let mut fst: VectorFst<T> = chain(&[OPEN, CLOSE]);
        fst.arcs_mut(0)[0].weight = T::new(1.0);
        fst.arcs_mut(1)[0].weight = T::new(2.0);
        let out = mpdt_expand(&fst, &one_pair(), &reject(1)).unwrap();
        assert_eq!(out.arcs(0)[0].weight, T::new(1.0));
        assert_eq!(out.arcs(1)[0].weight, T::new(2.0));
    }

    #[test]
    fn invalid_assignments() {
        assert!(matches!(
            ParenAssignment::new(&[(1, 2)], &[]),
            Err(FstError::InvalidParentheses(_))
        ));
        assert!(matches!(
            ParenAssignment::new(&[(0, 2)], &[1]),
            Err(FstError::InvalidParentheses(_))
        ));
        assert!(matches!(
            ParenAssignment::new(&[(1, 2), (2, 3)], &[1, 1]),
            Err(FstError::InvalidParentheses(_))
        ));
        assert!(matches!(
            ParenAssignment::new(&[(4, 4)], &[1]),
            Err(FstError::InvalidParentheses(_))
        ));
    }

    #[test]
    fn stack_ids_are_densified() {
        let p = ParenAssignment::new(&[(1, 2), (3, 4), (5, 6)], &[900, 3, 900]).unwrap();
        assert_eq!(p.num_stacks(), 2);
        assert_eq!(p.stack_of, vec![1, 0, 1]);
        assert_eq!(p.len(), 3);
    }
}
