//! Multiplicative group arithmetic
//!
//! Elements of `(Z/nZ)*` as immutable `(n, value)` pairs. Every operation
//! returns a fresh element; nothing is mutated in place. Operands of a binary
//! operation must share the same modulus — mixing moduli is a caller bug and
//! trips an `assert!`, not a protocol error.
//!
//! The protocol-level range requirement `2 <= value <= p-2` is deliberately
//! *not* enforced at construction: transient values such as the identity are
//! legal intermediates. The state machine checks the range on every received
//! element before it is used.

#![forbid(unsafe_code)]

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

/// An element of the multiplicative group modulo `n`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupElement {
    n: BigInt,
    value: BigInt,
}

impl GroupElement {
    /// Wrap `value` as an element modulo `n`. The value is stored as given
    /// (no reduction), so out-of-range wire values stay visible to the
    /// validity check.
    pub fn new(n: BigInt, value: BigInt) -> Self {
        Self { n, value }
    }

    /// The neutral element `1` of this group.
    pub fn identity(&self) -> Self {
        Self { n: self.n.clone(), value: BigInt::one() }
    }

    /// The modular multiplicative inverse.
    ///
    /// Only defined for values coprime to `n`; protocol elements are
    /// validated (or constructed) as such before inversion, so a failure
    /// here is a caller bug.
    pub fn inverse(&self) -> Self {
        let value = self
            .value
            .modinv(&self.n)
            .expect("inverse of a value not coprime to the modulus");
        Self { n: self.n.clone(), value }
    }

    /// Group composition: multiplication modulo `n`.
    pub fn operate(&self, other: &Self) -> Self {
        assert_eq!(self.n, other.n, "group operation requires matching moduli");
        Self {
            n: self.n.clone(),
            value: (&self.value * &other.value).mod_floor(&self.n),
        }
    }

    /// Right-to-left double-and-add exponentiation.
    ///
    /// A negative exponent exponentiates the inverse by the negated value;
    /// a zero exponent yields the identity.
    pub fn exponentiate(&self, exponent: &BigInt) -> Self {
        if exponent.is_negative() {
            return self.inverse().exponentiate(&-exponent);
        }
        let mut acc = self.identity();
        let mut base = Self {
            n: self.n.clone(),
            value: self.value.mod_floor(&self.n),
        };
        let mut exp = exponent.clone();
        while !exp.is_zero() {
            if exp.is_odd() {
                acc = acc.operate(&base);
            }
            base = base.operate(&base);
            exp >>= 1u32;
        }
        acc
    }

    /// The residue this element carries, in `[0, n)` for any element produced
    /// by a group operation.
    #[inline]
    pub fn value(&self) -> &BigInt {
        &self.value
    }

    /// The modulus `n` of this element's group.
    #[inline]
    pub fn modulus(&self) -> &BigInt {
        &self.n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::RandBigInt;
    use rand::{rngs::StdRng, SeedableRng};

    fn modulus() -> BigInt {
        BigInt::from(1_000_003u64) // prime
    }

    fn elem(v: u64) -> GroupElement {
        GroupElement::new(modulus(), BigInt::from(v))
    }

    #[test]
    fn zero_exponent_is_identity() {
        let g = elem(7);
        assert_eq!(g.exponentiate(&BigInt::from(0)), g.identity());
    }

    #[test]
    fn inverse_cancels() {
        let g = elem(1234);
        let a = BigInt::from(98765u64);
        let prod = g.exponentiate(&a).operate(&g.exponentiate(&(-&a)));
        assert_eq!(prod, g.identity());
    }

    #[test]
    fn exponents_add_under_composition() {
        let mut rng = StdRng::seed_from_u64(1);
        let n = modulus();
        for _ in 0..20 {
            let g = GroupElement::new(n.clone(), rng.gen_bigint_range(&BigInt::from(2), &n));
            let a = rng.gen_bigint_range(&BigInt::from(0), &n);
            let b = rng.gen_bigint_range(&BigInt::from(0), &n);
            let lhs = g.exponentiate(&(&a + &b));
            let rhs = g.exponentiate(&a).operate(&g.exponentiate(&b));
            assert_eq!(lhs, rhs);
        }
    }

    #[test]
    fn matches_modpow() {
        let mut rng = StdRng::seed_from_u64(2);
        let n = modulus();
        for _ in 0..50 {
            let base = rng.gen_bigint_range(&BigInt::from(2), &n);
            let exp = rng.gen_bigint_range(&BigInt::from(0), &BigInt::from(1u64 << 40));
            let g = GroupElement::new(n.clone(), base.clone());
            assert_eq!(*g.exponentiate(&exp).value(), base.modpow(&exp, &n));
        }
    }

    #[test]
    fn operate_reduces_modulo_n() {
        let g = elem(1_000_002); // p - 1, i.e. -1
        assert_eq!(*g.operate(&g).value(), BigInt::one());
    }

    #[test]
    #[should_panic(expected = "matching moduli")]
    fn mismatched_moduli_panic() {
        let g = elem(5);
        let h = GroupElement::new(BigInt::from(17), BigInt::from(3));
        let _ = g.operate(&h);
    }
}
