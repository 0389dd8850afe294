// Structural property bits computed from an automaton.

use std::fmt;
use std::ops::BitOr;

use hashbrown::HashSet;
use wfstkit_core::{EPSILON, Semiring};

use crate::connect::{accessible_states, coaccessible_states};
use crate::fst::Fst;

/// Bit set of structural properties.
///
/// Each property comes as a positive/negative pair; a computed set always
/// holds exactly one bit of every pair. The value is stored verbatim in the
/// binary file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FstProperties(u64);

impl FstProperties {
    /// Every arc has `ilabel == olabel`.
    pub const ACCEPTOR: Self = Self(0x0001);
    pub const NOT_ACCEPTOR: Self = Self(0x0002);
    /// Some arc has an epsilon input or output label.
    pub const EPSILONS: Self = Self(0x0004);
    pub const NO_EPSILONS: Self = Self(0x0008);
    /// No state has two arcs with the same input label.
    pub const I_DETERMINISTIC: Self = Self(0x0010);
    pub const NON_I_DETERMINISTIC: Self = Self(0x0020);
    /// Some arc weight is not `One`, or some final weight is neither `Zero` nor `One`.
    pub const WEIGHTED: Self = Self(0x0040);
    pub const UNWEIGHTED: Self = Self(0x0080);
    /// Every state is reachable from the start.
    pub const ACCESSIBLE: Self = Self(0x0100);
    pub const NOT_ACCESSIBLE: Self = Self(0x0200);
    /// Every state reaches a final state.
    pub const COACCESSIBLE: Self = Self(0x0400);
    pub const NOT_COACCESSIBLE: Self = Self(0x0800);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Compute every property of `fst`.
    pub fn compute<W: Semiring, F: Fst<W>>(fst: &F) -> Self {
        let mut acceptor = true;
        let mut epsilons = false;
        let mut deterministic = true;
        let mut weighted = false;
        let mut seen = HashSet::new();

        for state in fst.states() {
            let fw = fst.final_weight(state);
            if !fw.is_zero() && !fw.is_one() {
                weighted = true;
            }
            seen.clear();
            for arc in fst.arcs(state) {
                if arc.ilabel != arc.olabel {
                    acceptor = false;
                }
                if arc.ilabel == EPSILON || arc.olabel == EPSILON {
                    epsilons = true;
                }
                if !seen.insert(arc.ilabel) {
                    deterministic = false;
                }
                if !arc.weight.is_one() {
                    weighted = true;
                }
            }
        }

        let accessible = accessible_states(fst).iter().all(|&b| b);
        let coaccessible = coaccessible_states(fst).iter().all(|&b| b);

        let pick = |cond: bool, yes: Self, no: Self| if cond { yes } else { no };
        pick(acceptor, Self::ACCEPTOR, Self::NOT_ACCEPTOR)
            | pick(epsilons, Self::EPSILONS, Self::NO_EPSILONS)
            | pick(deterministic, Self::I_DETERMINISTIC, Self::NON_I_DETERMINISTIC)
            | pick(weighted, Self::WEIGHTED, Self::UNWEIGHTED)
            | pick(accessible, Self::ACCESSIBLE, Self::NOT_ACCESSIBLE)
            | pick(coaccessible, Self::COACCESSIBLE, Self::NOT_COACCESSIBLE)
    }
}

impl BitOr for FstProperties {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for FstProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}
