//! Error types shared across crates.

use thiserror::Error;

/// Failure of a checked [`XAmount`](crate::XAmount) operation.
///
/// Amount arithmetic never saturates or wraps; every overflow surfaces as one
/// of these variants.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount overflow")]
    Overflow,

    #[error("amount underflow")]
    Underflow,

    #[error("amount must not be negative: {0} nano")]
    Negative(i64),

    #[error("invalid decimal amount: {0}")]
    Parse(String),
}

/// Failure to parse a hex-encoded hash.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseHashError {
    #[error("expected {expected} hex characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid hex character at position {0}")]
    InvalidCharacter(usize),
}
