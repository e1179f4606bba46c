//! Fiat-Shamir challenge hash
//!
//! `smp_hash` turns a proof transcript into a deterministic challenge
//! integer: one version byte, then every argument in MPI wire encoding,
//! hashed with SHA-256 and read back as a big-endian integer. The version
//! byte binds each proof to its position in the four-message exchange
//! (values 1 through 8), so a proof lifted from one sub-step cannot be
//! replayed at another.
//!
//! The byte layout is shared with [`crate::wire`]; prover and verifier must
//! serialize identically or every proof fails.

#![forbid(unsafe_code)]

use num_bigint::{BigInt, Sign};
use sha2::{Digest, Sha256};

use crate::wire::{Byte, Mpi};

/// Hash a challenge-version byte and a sequence of non-negative integers
/// into a challenge integer.
pub fn smp_hash(version: u8, args: &[&BigInt]) -> BigInt {
    let mut hasher = Sha256::new();
    hasher.update(Byte(version).to_bytes());
    for arg in args {
        let mpi = Mpi::new((*arg).clone()).expect("challenge hash inputs are non-negative");
        hasher.update(mpi.to_bytes());
    }
    BigInt::from_bytes_be(Sign::Plus, &hasher.finalize())
}
