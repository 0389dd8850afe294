// Semiring capability trait shared by every algorithm.

use std::fmt::Debug;
use std::hash::Hash;
use std::ops::BitOr;

/// Algebraic properties a semiring may have.
///
/// Algorithms consult these to decide whether a computation is guaranteed to
/// converge (e.g. epsilon-closure over cyclic epsilon paths).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SemiringProperties(u32);

impl SemiringProperties {
    /// `Times` distributes over `Plus` from the left.
    pub const LEFT_SEMIRING: Self = Self(0x01);
    /// `Times` distributes over `Plus` from the right.
    pub const RIGHT_SEMIRING: Self = Self(0x02);
    /// Both left and right distributive.
    pub const SEMIRING: Self = Self(0x03);
    /// `Times` is commutative.
    pub const COMMUTATIVE: Self = Self(0x04);
    /// `Plus(a, a) == a`.
    pub const IDEMPOTENT: Self = Self(0x08);
    /// `Plus(a, b)` is always `a` or `b`.
    pub const PATH: Self = Self(0x10);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SemiringProperties {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// A weight type forming a semiring.
///
/// Implementations must satisfy the usual laws: `Plus` is associative and
/// commutative with identity `zero()`, `Times` is associative with identity
/// `one()`, and `zero()` annihilates under `Times`. `no_weight()` is a
/// sentinel outside the semiring that signals an invalid value; it must
/// propagate through `plus` and `times` and is never stored in a well-formed
/// automaton.
///
/// `reverse` maps a weight into the reversed semiring. Every weight shipped by
/// this crate is commutative, so the reversed semiring is the type itself.
pub trait Semiring: Clone + Debug + PartialEq + Eq + Hash {
    /// Additive identity, absorbing under `times`.
    fn zero() -> Self;

    /// Multiplicative identity.
    fn one() -> Self;

    /// Invalid-value sentinel.
    fn no_weight() -> Self;

    fn plus(&self, rhs: &Self) -> Self;

    fn times(&self, rhs: &Self) -> Self;

    /// Whether this value is a member of the semiring (i.e. not `no_weight`).
    fn is_member(&self) -> bool;

    /// Name written into file headers to identify the weight type.
    fn weight_type() -> &'static str;

    fn properties() -> SemiringProperties;

    fn reverse(&self) -> Self {
        self.clone()
    }

    /// Equality up to `delta`; exact for non-numeric weights.
    fn approx_eq(&self, other: &Self, _delta: f32) -> bool {
        self == other
    }

    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    fn is_one(&self) -> bool {
        *self == Self::one()
    }
}
