//! Protocol configuration
//!
//! An immutable bundle of the group parameters every component consumes: the
//! safe-prime modulus `p`, the subgroup order `q = (p-1)/2`, the generator
//! `g`, and the byte size of `p`. A `Config` is built once and passed by
//! reference into the state machine; there is no process-wide default
//! singleton. All wire encodings derived from these parameters are
//! big-endian.

#![forbid(unsafe_code)]

use num_bigint::{BigInt, Sign};

use crate::group::GroupElement;

/// The 1536-bit MODP safe prime (RFC 3526 group 5) used by the OTR
/// instantiation of the protocol.
const OTR_MODULUS_HEX: &str = "ffffffffffffffffc90fdaa22168c234c4c6628b80dc1cd1\
                               29024e088a67cc74020bbea63b139b22514a08798e3404dd\
                               ef9519b3cd3a431b302b0a6df25f14374fe1356d6d51c245\
                               e485b576625e7ec6f44c42e9a637ed6b0bff5cb6f406b7ed\
                               ee386bfb5a899fa5ae9f24117c4b1fe649286651ece45b3d\
                               c2007cb8a163bf0598da48361c55d39a69163fa8fd24cf5f\
                               83655d23dca3ad961c62f356208552bb9ed529077096966d\
                               670c354e4abc9804f1746c08ca237327ffffffffffffffff";

/// Immutable group parameters shared by every component of a session.
#[derive(Clone, Debug)]
pub struct Config {
    modulus: BigInt,
    q: BigInt,
    g: GroupElement,
    modulus_size: usize,
}

impl Config {
    /// Build a configuration from a safe prime `modulus` and a `generator`.
    /// The subgroup order and byte size are derived.
    pub fn new(modulus: BigInt, generator: BigInt) -> Self {
        let q = (&modulus - 1u32) >> 1u32;
        let modulus_size = ((modulus.bits() + 7) / 8) as usize;
        let g = GroupElement::new(modulus.clone(), generator);
        Self { modulus, q, g, modulus_size }
    }

    /// The standard instantiation: the 1536-bit MODP group with generator 2.
    pub fn otr1536() -> Self {
        let bytes = hex::decode(OTR_MODULUS_HEX).expect("modulus constant is valid hex");
        Self::new(BigInt::from_bytes_be(Sign::Plus, &bytes), BigInt::from(2u32))
    }

    /// The modulus `p`.
    #[inline]
    pub fn modulus(&self) -> &BigInt {
        &self.modulus
    }

    /// The subgroup order `q = (p - 1) / 2`; secret exponents live modulo `q`.
    #[inline]
    pub fn q(&self) -> &BigInt {
        &self.q
    }

    /// The group generator `g`.
    #[inline]
    pub fn generator(&self) -> &GroupElement {
        &self.g
    }

    /// The byte size of the modulus.
    #[inline]
    pub fn modulus_size(&self) -> usize {
        self.modulus_size
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::otr1536()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otr1536_parameters() {
        let config = Config::otr1536();
        assert_eq!(config.modulus().bits(), 1536);
        assert_eq!(config.modulus_size(), 192);
        assert_eq!(*config.generator().value(), BigInt::from(2u32));
        // q = (p - 1) / 2 exactly.
        assert_eq!(config.q() * 2 + 1, *config.modulus());
    }
}
