//! Crate root: public surface and protocol-wide invariants
//!
//! An implementation of the Socialist Millionaires' Protocol (SMP): a
//! two-party zero-knowledge exchange that tells both peers whether their
//! secrets are equal, and nothing else. Four TLV-framed messages flow between
//! an initiator and a responder; every received value is range-checked and
//! every proof verified before it is used.
//!
//! ## Invariants
//!
//! - **Group.** Arithmetic happens in the multiplicative group modulo a
//!   1536-bit safe prime (generator 2 by default); secret exponents live
//!   modulo the subgroup order `q = (p-1)/2`. Received elements must lie in
//!   `[2, p-2]`.
//! - **Fiat-Shamir.** Proof challenges are SHA-256 over a one-byte step
//!   version (1 through 8) followed by the MPI encoding of every transcript
//!   value. The wire encoding and the hash share one serializer, so both
//!   sides hash identical bytes.
//! - **State discipline.** A session's position is a tagged union; each
//!   transition consumes the old state and produces the next. Cryptographic
//!   or sequencing violations are terminal: the session poisons itself and
//!   only a fresh one can retry.
//! - **Randomness.** Blinding secrets come from an injected CSPRNG, fresh per
//!   proof, never cached.
//!
//! The core is synchronous and transport-agnostic: hand [`Tlv`]s to
//! [`SmpStateMachine::transit`] and ship the replies however you like.
//! [`Tlv::read_from`] is provided for byte-stream transports.

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms)]

/// Group parameters (modulus, subgroup order, generator).
pub mod config;
/// The crate-wide error type.
pub mod error;
/// Multiplicative group arithmetic.
pub mod group;
/// Fiat-Shamir challenge hashing.
pub mod hash;
/// The four protocol messages and their TLV codec.
pub mod msgs;
/// Sigma-protocol proof construction and verification.
pub mod proofs;
/// The protocol state machine.
pub mod state;
/// Byte-level wire primitives (fixed ints, MPI, TLV).
pub mod wire;

pub use config::Config;
pub use error::SmpError;
pub use group::GroupElement;
pub use msgs::{SmpMessage1, SmpMessage2, SmpMessage3, SmpMessage4};
pub use proofs::{ProofDiscreteLog, ProofEqualDiscreteCoordinates, ProofEqualDiscreteLogs};
pub use state::{Secret, SmpState, SmpStateMachine};
pub use wire::{Byte, Int, Mpi, Short, Tlv};
