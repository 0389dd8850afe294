// Concrete semiring weights: Boolean, tropical and log.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{Read, Write};
use std::str::FromStr;

use crate::codec::{Codec, CodecError};
use crate::semiring::{Semiring, SemiringProperties};

/// Text used for `no_weight()` when printing.
const BAD_NUMBER: &str = "BadNumber";

/// Error returned when a weight cannot be parsed from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("bad {weight_type} weight: {text:?}")]
pub struct ParseWeightError {
    pub weight_type: &'static str,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Boolean
// ---------------------------------------------------------------------------

/// Boolean semiring: `Plus` is or, `Times` is and.
///
/// Idempotent, commutative and a path semiring, so epsilon-closure always
/// converges. The third state is the `no_weight` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BooleanWeight(u8);

impl BooleanWeight {
    const FALSE: u8 = 0;
    const TRUE: u8 = 1;
    const INVALID: u8 = 2;

    pub fn new(value: bool) -> Self {
        Self(value as u8)
    }

    /// `None` for the `no_weight` sentinel.
    pub fn value(self) -> Option<bool> {
        match self.0 {
            Self::FALSE => Some(false),
            Self::TRUE => Some(true),
            _ => None,
        }
    }
}

impl Semiring for BooleanWeight {
    fn zero() -> Self {
        Self(Self::FALSE)
    }

    fn one() -> Self {
        Self(Self::TRUE)
    }

    fn no_weight() -> Self {
        Self(Self::INVALID)
    }

    fn plus(&self, rhs: &Self) -> Self {
        match (self.value(), rhs.value()) {
            (Some(a), Some(b)) => Self::new(a || b),
            _ => Self::no_weight(),
        }
    }

    fn times(&self, rhs: &Self) -> Self {
        match (self.value(), rhs.value()) {
            (Some(a), Some(b)) => Self::new(a && b),
            _ => Self::no_weight(),
        }
    }

    fn is_member(&self) -> bool {
        self.value().is_some()
    }

    fn weight_type() -> &'static str {
        "boolean"
    }

    fn properties() -> SemiringProperties {
        SemiringProperties::SEMIRING
            | SemiringProperties::COMMUTATIVE
            | SemiringProperties::IDEMPOTENT
            | SemiringProperties::PATH
    }
}

impl fmt::Display for BooleanWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(true) => f.write_str("1"),
            Some(false) => f.write_str("0"),
            None => f.write_str(BAD_NUMBER),
        }
    }
}

impl FromStr for BooleanWeight {
    type Err = ParseWeightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" | "true" => Ok(Self::one()),
            "0" | "false" => Ok(Self::zero()),
            _ => Err(ParseWeightError {
                weight_type: Self::weight_type(),
                text: s.to_string(),
            }),
        }
    }
}

impl Codec for BooleanWeight {
    fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), CodecError> {
        self.0.write_to(writer)
    }

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, CodecError> {
        let raw = u8::read_from(reader)?;
        if raw > Self::INVALID {
            return Err(CodecError::Malformed(format!("invalid boolean weight byte {raw}")));
        }
        Ok(Self(raw))
    }
}

// ---------------------------------------------------------------------------
// Float weights
// ---------------------------------------------------------------------------

/// Bits used for equality and hashing: `-0.0` folds into `0.0`, every other
/// value (NaN payloads included) compares by its exact bit pattern.
#[inline]
fn canonical_bits(v: f32) -> u32 {
    if v == 0.0 { 0 } else { v.to_bits() }
}

#[inline]
fn float_approx_eq(a: f32, b: f32, delta: f32) -> bool {
    if a.is_nan() || b.is_nan() {
        return a.is_nan() && b.is_nan();
    }
    a <= b + delta && b <= a + delta
}

fn float_member(v: f32) -> bool {
    !v.is_nan() && v != f32::NEG_INFINITY
}

fn fmt_float(v: f32, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if v.is_nan() {
        f.write_str(BAD_NUMBER)
    } else if v == f32::INFINITY {
        f.write_str("Infinity")
    } else if v == f32::NEG_INFINITY {
        f.write_str("-Infinity")
    } else {
        write!(f, "{v}")
    }
}

fn parse_float(s: &str, weight_type: &'static str) -> Result<f32, ParseWeightError> {
    s.parse::<f32>().map_err(|_| ParseWeightError {
        weight_type,
        text: s.to_string(),
    })
}

macro_rules! float_weight_common {
    ($name:ident) => {
        impl $name {
            pub fn new(value: f32) -> Self {
                Self(value)
            }

            pub fn value(self) -> f32 {
                self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                canonical_bits(self.0) == canonical_bits(other.0)
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                state.write_u32(canonical_bits(self.0));
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt_float(self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = ParseWeightError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_float(s, <Self as Semiring>::weight_type()).map(Self)
            }
        }

        impl Codec for $name {
            fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), CodecError> {
                self.0.write_to(writer)
            }

            fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, CodecError> {
                f32::read_from(reader).map(Self)
            }
        }
    };
}

/// Tropical semiring over `f32`: `Plus` is min, `Times` is addition,
/// `Zero` is +inf and `One` is 0.
///
/// Idempotent, commutative and a path semiring. Epsilon-closure converges as
/// long as no epsilon cycle has negative total weight.
#[derive(Debug, Clone, Copy)]
pub struct TropicalWeight(f32);

float_weight_common!(TropicalWeight);

impl Semiring for TropicalWeight {
    fn zero() -> Self {
        Self(f32::INFINITY)
    }

    fn one() -> Self {
        Self(0.0)
    }

    fn no_weight() -> Self {
        Self(f32::NAN)
    }

    fn plus(&self, rhs: &Self) -> Self {
        if !self.is_member() || !rhs.is_member() {
            return Self::no_weight();
        }
        if self.0 <= rhs.0 { *self } else { *rhs }
    }

    fn times(&self, rhs: &Self) -> Self {
        if !self.is_member() || !rhs.is_member() {
            return Self::no_weight();
        }
        if self.0 == f32::INFINITY || rhs.0 == f32::INFINITY {
            return Self::zero();
        }
        Self(self.0 + rhs.0)
    }

    fn is_member(&self) -> bool {
        float_member(self.0)
    }

    fn weight_type() -> &'static str {
        "tropical"
    }

    fn properties() -> SemiringProperties {
        SemiringProperties::SEMIRING
            | SemiringProperties::COMMUTATIVE
            | SemiringProperties::IDEMPOTENT
            | SemiringProperties::PATH
    }

    fn approx_eq(&self, other: &Self, delta: f32) -> bool {
        float_approx_eq(self.0, other.0, delta)
    }
}

/// Log semiring over `f32`: `Plus` is `-log(e^-a + e^-b)`, `Times` is
/// addition, `Zero` is +inf and `One` is 0.
///
/// Commutative but not idempotent. Epsilon cycles converge only
/// approximately, up to the closure's `delta`.
#[derive(Debug, Clone, Copy)]
pub struct LogWeight(f32);

float_weight_common!(LogWeight);

impl Semiring for LogWeight {
    fn zero() -> Self {
        Self(f32::INFINITY)
    }

    fn one() -> Self {
        Self(0.0)
    }

    fn no_weight() -> Self {
        Self(f32::NAN)
    }

    fn plus(&self, rhs: &Self) -> Self {
        if !self.is_member() || !rhs.is_member() {
            return Self::no_weight();
        }
        let (a, b) = (self.0, rhs.0);
        if a == f32::INFINITY {
            return *rhs;
        }
        if b == f32::INFINITY {
            return *self;
        }
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self(lo - (-(hi - lo)).exp().ln_1p())
    }

    fn times(&self, rhs: &Self) -> Self {
        if !self.is_member() || !rhs.is_member() {
            return Self::no_weight();
        }
        if self.0 == f32::INFINITY || rhs.0 == f32::INFINITY {
            return Self::zero();
        }
        Self(self.0 + rhs.0)
    }

    fn is_member(&self) -> bool {
        float_member(self.0)
    }

    fn weight_type() -> &'static str {
        "log"
    }

    fn properties() -> SemiringProperties {
        SemiringProperties::SEMIRING | SemiringProperties::COMMUTATIVE
    }

    fn approx_eq(&self, other: &Self, delta: f32) -> bool {
        float_approx_eq(self.0, other.0, delta)
    }
}
