//! Weighted finite-state transducer engine.
//!
//! Automata are arenas of states ([`VectorFst`]); arcs are owned by their
//! source state and refer to their destination by [`StateId`]. Every
//! algorithm is generic over a [`Semiring`] weight.
//!
//! # Architecture
//!
//! - [`arc`] -- Arc record
//! - [`fst`] -- Read-only [`Fst`] view and the mutable [`VectorFst`] arena
//! - [`properties`] -- Structural property bits (acceptor, epsilons, determinism, ...)
//! - [`format`] -- Binary automaton file format
//! - [`text`] -- Text automata and label pair/triple files
//! - [`info`] -- Summary statistics
//! - [`connect`] -- Trim states not on any accepting path
//! - [`reverse`] -- Reverse an automaton
//! - [`rmepsilon`] -- Epsilon removal via weighted epsilon-closure
//! - [`encode`] -- Bijective label/weight encoding and its inverse
//! - [`difference`] -- Completion, complementation and difference of acceptors
//! - [`mpdt`] -- Expansion of bounded-stack multi-pushdown transducers

pub mod arc;
pub mod connect;
pub mod difference;
pub mod encode;
pub mod format;
pub mod fst;
pub mod info;
pub mod mpdt;
pub mod properties;
pub mod reverse;
pub mod rmepsilon;
pub mod text;

pub use arc::Arc;
pub use connect::{ConnectOptions, connect, connect_with};
pub use difference::{DifferenceOptions, complement, difference};
pub use encode::{DecodeOptions, EncodeFlags, EncodeTable, EncodeTuple, decode, encode};
pub use format::{FstHeader, read_fst, write_fst};
pub use fst::{Fst, VectorFst};
pub use info::FstInfo;
pub use mpdt::{MPdtExpandOptions, OnStackOverflow, ParenAssignment, StackBound, mpdt_expand};
pub use properties::FstProperties;
pub use reverse::reverse;
pub use rmepsilon::{RmEpsilonOptions, epsilon_closure, rm_epsilon, rm_epsilon_with};

pub use wfstkit_core::{
    BooleanWeight, CodecError, EPSILON, ErrorPolicy, Label, LogWeight, NO_LABEL, Semiring,
    StateId, TropicalWeight,
};

/// Error type for automaton IO and algorithms.
#[derive(Debug, thiserror::Error)]
pub enum FstError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid magic number in {what} header")]
    InvalidMagic { what: &'static str },
    #[error("weight type mismatch: expected {expected}, got {actual}")]
    WeightTypeMismatch { expected: String, actual: String },
    #[error("unsupported weight type: {0}")]
    UnsupportedWeightType(String),
    #[error("state {state}, arc {arc}: destination {target} is not a valid state")]
    DanglingArc {
        state: StateId,
        arc: usize,
        target: StateId,
    },
    #[error("start state {0} is not a valid state")]
    InvalidStart(StateId),
    #[error("state {state}: weight is not a member of the semiring")]
    InvalidWeight { state: StateId },
    #[error("no entry for code {code} in encode table")]
    MissingEncoding { code: Label },
    #[error("{what} must be an acceptor")]
    NotAcceptor { what: &'static str },
    #[error("state {state}: not deterministic on label {label}")]
    NotDeterministic { state: StateId, label: Label },
    #[error("state {state}: automaton must be unweighted")]
    NotUnweighted { state: StateId },
    #[error("invalid parentheses: {0}")]
    InvalidParentheses(String),
    #[error("state {state}: stack depth {depth} exceeds bound {bound}")]
    StackBoundExceeded {
        state: StateId,
        depth: usize,
        bound: usize,
    },
    #[error("state {state}: epsilon-closure did not converge within {limit} relaxations")]
    EpsilonClosureDiverged { state: StateId, limit: usize },
    #[error("{source_name}, line {line}: {message}")]
    Parse {
        source_name: String,
        line: usize,
        message: String,
    },
    #[error("malformed input: {0}")]
    Malformed(String),
}
