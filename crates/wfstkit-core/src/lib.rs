//! Shared building blocks for the wfstkit weighted finite-state transducer
//! library.
//!
//! # Architecture
//!
//! - [`semiring`] -- The [`Semiring`] capability trait all algorithms are generic over
//! - [`weights`] -- Concrete weights: Boolean, tropical and log
//! - [`codec`] -- Type-directed binary serialization used by every on-disk format
//! - [`compact_set`] -- Ordered integer set with O(1) membership for dense ranges
//! - [`policy`] -- Error severity switch threaded into algorithm entry points

pub mod codec;
pub mod compact_set;
pub mod policy;
pub mod semiring;
pub mod weights;

pub use codec::{Codec, CodecError};
pub use compact_set::{CompactKey, CompactSet};
pub use policy::ErrorPolicy;
pub use semiring::{Semiring, SemiringProperties};
pub use weights::{BooleanWeight, LogWeight, ParseWeightError, TropicalWeight};

/// Arc label. Label 0 is epsilon.
pub type Label = u32;

/// Dense state identifier, an index into an automaton's state arena.
pub type StateId = u32;

/// The reserved epsilon label: no symbol consumed or emitted.
pub const EPSILON: Label = 0;

/// Label value that never appears on an arc; the empty-set sentinel for label sets.
pub const NO_LABEL: Label = u32::MAX;

/// State value that never names a real state.
pub const NO_STATE_ID: StateId = u32::MAX;

/// Default convergence threshold for approximate weight equality.
pub const DEFAULT_DELTA: f32 = 1.0 / 1024.0;
