//! Shared error type
//!
//! One error enum for the whole crate, with a variant per failure category.
//! Callers at the protocol boundary match on the variant to decide between
//! "discard this input" (`OutOfRange`, `Malformed`), "tear the session down"
//! (`InvalidElement`, `InvalidProof`, `UnexpectedMessage`) and "ask again
//! later" (`NotFinished`). `ShortRead` is a transport-level condition and
//! never a protocol verdict.

#![forbid(unsafe_code)]

/// Errors surfaced by the SMP core.
#[derive(Debug, thiserror::Error)]
pub enum SmpError {
    /// A value does not fit the fixed-width wire field it was destined for,
    /// or a negative integer was handed to the MPI encoder.
    #[error("value out of range: {0}")]
    OutOfRange(String),

    /// Already-received bytes do not parse as the expected structure.
    #[error("malformed wire data: {0}")]
    Malformed(&'static str),

    /// A received group element lies outside `[2, p-2]`.
    #[error("group element outside the valid range [2, p-2]")]
    InvalidElement,

    /// A zero-knowledge proof failed to verify.
    #[error("zero-knowledge proof rejected")]
    InvalidProof,

    /// A message arrived while the state machine was not in the step that
    /// expects it, or the session was already torn down.
    #[error("message cannot be handled in the current protocol step")]
    UnexpectedMessage,

    /// The protocol result was requested before the exchange completed.
    #[error("the protocol has not finished yet")]
    NotFinished,

    /// The underlying byte source yielded fewer bytes than requested.
    #[error("transport read failed: {0}")]
    ShortRead(#[from] std::io::Error),
}
