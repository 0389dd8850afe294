//! Algebraic properties of the algorithms, checked on seeded random automata.
//!
//! Languages are compared by brute force: every string over a small alphabet
//! up to a fixed length is weighed in both automata.

use hashbrown::HashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use wfstkit_core::{EPSILON, ErrorPolicy, Label, Semiring, StateId};
use wfstkit_fst::connect::{accessible_states, coaccessible_states};
use wfstkit_fst::{
    Arc, BooleanWeight, DecodeOptions, DifferenceOptions, EncodeFlags, EncodeTable, Fst,
    RmEpsilonOptions, TropicalWeight, VectorFst, connect, decode, difference, encode, read_fst,
    rm_epsilon, rm_epsilon_with, write_fst,
};

const ALPHABET: [Label; 3] = [1, 2, 3];
const MAX_LEN: usize = 3;
const TRIALS: u64 = 40;

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Random acceptor; arcs are epsilon with probability `eps`.
fn random_acceptor<W: Semiring>(
    rng: &mut StdRng,
    weight: impl Fn(&mut StdRng) -> W,
    eps: f64,
) -> VectorFst<W> {
    let num_states = rng.gen_range(1..7);
    let mut fst = VectorFst::new();
    for _ in 0..num_states {
        fst.add_state();
    }
    fst.set_start(rng.gen_range(0..num_states));
    for s in 0..num_states {
        if rng.gen_bool(0.35) {
            let w = weight(rng);
            fst.set_final(s, w);
        }
        for _ in 0..rng.gen_range(0..4) {
            let label = if rng.gen_bool(eps) {
                EPSILON
            } else {
                ALPHABET[rng.gen_range(0..ALPHABET.len())]
            };
            let w = weight(rng);
            let to = rng.gen_range(0..num_states);
            fst.add_arc(s, Arc::new(label, label, w, to));
        }
    }
    fst
}

/// Random transducer with independent input and output labels.
fn random_transducer(rng: &mut StdRng) -> VectorFst<TropicalWeight> {
    let num_states = rng.gen_range(1..6);
    let mut fst = VectorFst::new();
    for _ in 0..num_states {
        fst.add_state();
    }
    fst.set_start(0);
    for s in 0..num_states {
        match rng.gen_range(0..3) {
            0 => {}
            1 => fst.set_final(s, TropicalWeight::one()),
            _ => fst.set_final(s, tropical(rng)),
        }
        for _ in 0..rng.gen_range(0..4) {
            let arc = Arc::new(
                rng.gen_range(0..4),
                rng.gen_range(0..4),
                tropical(rng),
                rng.gen_range(0..num_states),
            );
            fst.add_arc(s, arc);
        }
    }
    fst
}

/// Random epsilon-free deterministic unweighted acceptor.
fn random_dfa(rng: &mut StdRng) -> VectorFst<BooleanWeight> {
    let num_states = rng.gen_range(1..5);
    let t = BooleanWeight::one();
    let mut fst = VectorFst::new();
    for _ in 0..num_states {
        fst.add_state();
    }
    fst.set_start(0);
    for s in 0..num_states {
        if rng.gen_bool(0.4) {
            fst.set_final(s, t);
        }
        for &label in &ALPHABET {
            if rng.gen_bool(0.6) {
                fst.add_arc(s, Arc::new(label, label, t, rng.gen_range(0..num_states)));
            }
        }
    }
    fst
}

fn tropical(rng: &mut StdRng) -> TropicalWeight {
    TropicalWeight::new(rng.gen_range(0..8) as f32 * 0.25)
}

fn boolean(_: &mut StdRng) -> BooleanWeight {
    BooleanWeight::one()
}

// ---------------------------------------------------------------------------
// Brute-force evaluation
// ---------------------------------------------------------------------------

fn words() -> Vec<Vec<Label>> {
    let mut all = vec![Vec::new()];
    let mut frontier = vec![Vec::new()];
    for _ in 0..MAX_LEN {
        let mut next = Vec::new();
        for word in &frontier {
            for &label in &ALPHABET {
                let mut w: Vec<Label> = word.clone();
                w.push(label);
                next.push(w);
            }
        }
        all.extend(next.iter().cloned());
        frontier = next;
    }
    all
}

/// Relax epsilon arcs until nothing changes. Terminates for idempotent
/// semirings with no negative cycles, which is all these tests use.
fn eps_closure<W: Semiring>(fst: &VectorFst<W>, mut frontier: HashMap<StateId, W>) -> HashMap<StateId, W> {
    loop {
        let mut changed = false;
        let snapshot: Vec<(StateId, W)> = frontier.iter().map(|(s, w)| (*s, w.clone())).collect();
        for (s, w) in snapshot {
            for arc in fst.arcs(s).iter().filter(|a| a.ilabel == EPSILON) {
                let old = frontier.get(&arc.nextstate).cloned().unwrap_or_else(W::zero);
                let new = old.plus(&w.times(&arc.weight));
                if new != old {
                    frontier.insert(arc.nextstate, new);
                    changed = true;
                }
            }
        }
        if !changed {
            return frontier;
        }
    }
}

/// ⊕-sum over all paths whose input string is `word`.
fn weigh<W: Semiring>(fst: &VectorFst<W>, word: &[Label]) -> W {
    let Some(start) = fst.start() else {
        return W::zero();
    };
    let mut current = eps_closure(fst, HashMap::from([(start, W::one())]));
    for &label in word {
        let mut next: HashMap<StateId, W> = HashMap::new();
        for (s, w) in &current {
            for arc in fst.arcs(*s).iter().filter(|a| a.ilabel == label) {
                let entry = next.entry(arc.nextstate).or_insert_with(W::zero);
                *entry = entry.plus(&w.times(&arc.weight));
            }
        }
        current = eps_closure(fst, next);
    }
    current
        .iter()
        .fold(W::zero(), |acc, (s, w)| acc.plus(&w.times(fst.final_weight(*s))))
}

fn accepts(fst: &VectorFst<BooleanWeight>, word: &[Label]) -> bool {
    weigh(fst, word).is_one()
}

fn assert_same_weights(a: &VectorFst<TropicalWeight>, b: &VectorFst<TropicalWeight>) {
    for word in words() {
        let (x, y) = (weigh(a, &word), weigh(b, &word));
        assert!(
            x.approx_eq(&y, 1e-3),
            "word {word:?}: {x} vs {y}\nleft {a:?}\nright {b:?}"
        );
    }
}

fn has_epsilon_arc<W: Semiring>(fst: &VectorFst<W>) -> bool {
    fst.states().any(|s| fst.arcs(s).iter().any(|a| a.is_epsilon()))
}

// ---------------------------------------------------------------------------
// Connect
// ---------------------------------------------------------------------------

#[test]
fn connect_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..TRIALS {
        let mut once = random_acceptor(&mut rng, tropical, 0.2);
        connect(&mut once).unwrap();
        let mut twice = once.clone();
        connect(&mut twice).unwrap();
        assert_eq!(once, twice);
    }
}

#[test]
fn connect_keeps_only_useful_states_and_the_language() {
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..TRIALS {
        let fst = random_acceptor(&mut rng, tropical, 0.2);
        let mut trimmed = fst.clone();
        connect(&mut trimmed).unwrap();

        assert!(accessible_states(&trimmed).iter().all(|&b| b));
        assert!(coaccessible_states(&trimmed).iter().all(|&b| b));
        assert_same_weights(&fst, &trimmed);
    }
}

// ---------------------------------------------------------------------------
// RmEpsilon
// ---------------------------------------------------------------------------

#[test]
fn rmepsilon_preserves_weights() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..TRIALS {
        let fst = random_acceptor(&mut rng, tropical, 0.4);
        let mut out = fst.clone();
        rm_epsilon(&mut out).unwrap();
        assert!(!has_epsilon_arc(&out));
        assert_same_weights(&fst, &out);
    }
}

#[test]
fn rmepsilon_reverse_mode_preserves_weights() {
    let mut rng = StdRng::seed_from_u64(4);
    let opts = RmEpsilonOptions {
        reverse: true,
        ..Default::default()
    };
    for _ in 0..TRIALS {
        let fst = random_acceptor(&mut rng, tropical, 0.4);
        let mut out = fst.clone();
        rm_epsilon_with(&mut out, &opts).unwrap();
        assert!(!has_epsilon_arc(&out));
        assert_same_weights(&fst, &out);
    }
}

#[test]
fn rmepsilon_without_connect_keeps_state_count() {
    let mut rng = StdRng::seed_from_u64(5);
    let opts = RmEpsilonOptions {
        connect: false,
        ..Default::default()
    };
    for _ in 0..TRIALS {
        let fst = random_acceptor(&mut rng, tropical, 0.4);
        let mut out = fst.clone();
        rm_epsilon_with(&mut out, &opts).unwrap();
        assert_eq!(out.num_states(), fst.num_states());
        assert_same_weights(&fst, &out);
    }
}

#[test]
fn boolean_epsilon_to_final_state() {
    // 0 (start, final) -eps-> 1 (final): the language is {ε}.
    let t = BooleanWeight::one();
    let mut fst: VectorFst<BooleanWeight> = VectorFst::new();
    let s0 = fst.add_state();
    let s1 = fst.add_state();
    fst.set_start(s0);
    fst.set_final(s0, t);
    fst.set_final(s1, t);
    fst.add_arc(s0, Arc::new(0, 0, t, s1));

    rm_epsilon(&mut fst).unwrap();
    assert_eq!(fst.num_states(), 1);
    assert_eq!(fst.start(), Some(0));
    assert_eq!(fst.num_arcs(0), 0);
    assert_eq!(fst.final_weight(0), &BooleanWeight::one());
}

// ---------------------------------------------------------------------------
// Encode / Decode
// ---------------------------------------------------------------------------

#[test]
fn encode_decode_round_trip() {
    let mut rng = StdRng::seed_from_u64(6);
    for flags in [EncodeFlags::LABELS, EncodeFlags::WEIGHTS, EncodeFlags::BOTH] {
        for _ in 0..TRIALS {
            let fst = random_transducer(&mut rng);
            let mut table = EncodeTable::new(flags);
            let mut enc = encode(&fst, &mut table);
            decode(&mut enc, &table, &DecodeOptions::default()).unwrap();
            assert_eq!(enc, fst, "flags {flags:?}");
        }
    }
}

#[test]
fn encode_table_survives_a_file_round_trip() {
    let mut rng = StdRng::seed_from_u64(7);
    let fst = random_transducer(&mut rng);
    let mut table = EncodeTable::new(EncodeFlags::BOTH);
    let enc = encode(&fst, &mut table);

    let mut table_bytes = Vec::new();
    table.write_to(&mut table_bytes).unwrap();
    let mut fst_bytes = Vec::new();
    write_fst(&enc, &mut fst_bytes, ErrorPolicy::Report).unwrap();

    let table = EncodeTable::<TropicalWeight>::read_from(&mut table_bytes.as_slice()).unwrap();
    let mut enc: VectorFst<TropicalWeight> =
        read_fst(&mut fst_bytes.as_slice(), ErrorPolicy::Report).unwrap();
    decode(&mut enc, &table, &DecodeOptions::default()).unwrap();
    assert_eq!(enc, fst);
}

// ---------------------------------------------------------------------------
// Difference
// ---------------------------------------------------------------------------

#[test]
fn difference_is_a_and_not_b() {
    let mut rng = StdRng::seed_from_u64(8);
    for _ in 0..TRIALS {
        let a = random_acceptor(&mut rng, boolean, 0.2);
        let b = random_dfa(&mut rng);
        let d = difference(&a, &b, &DifferenceOptions::default()).unwrap();
        for word in words() {
            assert_eq!(
                accepts(&d, &word),
                accepts(&a, &word) && !accepts(&b, &word),
                "word {word:?}"
            );
        }
    }
}

#[test]
fn difference_of_two_strings_and_one() {
    let t = BooleanWeight::one();
    let mut a: VectorFst<BooleanWeight> = VectorFst::new();
    let s0 = a.add_state();
    let s1 = a.add_state();
    a.set_start(s0);
    a.set_final(s1, t);
    a.add_arc(s0, Arc::new(1, 1, t, s1));
    a.add_arc(s0, Arc::new(2, 2, t, s1));

    let mut b: VectorFst<BooleanWeight> = VectorFst::new();
    let s0 = b.add_state();
    let s1 = b.add_state();
    b.set_start(s0);
    b.set_final(s1, t);
    b.add_arc(s0, Arc::new(1, 1, t, s1));

    let d = difference(&a, &b, &DifferenceOptions::default()).unwrap();
    let accepted: Vec<Vec<Label>> = words().into_iter().filter(|w| accepts(&d, w)).collect();
    assert_eq!(accepted, vec![vec![2]]);
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

#[test]
fn automaton_file_round_trip() {
    let mut rng = StdRng::seed_from_u64(9);
    for _ in 0..TRIALS {
        let fst = random_transducer(&mut rng);
        let mut buf = Vec::new();
        write_fst(&fst, &mut buf, ErrorPolicy::Report).unwrap();
        let back: VectorFst<TropicalWeight> =
            read_fst(&mut buf.as_slice(), ErrorPolicy::Report).unwrap();
        assert_eq!(back, fst);
    }
}
