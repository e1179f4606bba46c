//! Zero-knowledge proof primitives
//!
//! Three Schnorr-style sigma protocols made non-interactive with the
//! challenge hash from [`crate::hash`]:
//!
//! - [`ProofDiscreteLog`] — knowledge of `x` with `y = g^x`.
//! - [`ProofEqualDiscreteCoordinates`] — `(p, q) = (g0^r, g1^r * g2^x)` for
//!   one secret pair `(r, x)`.
//! - [`ProofEqualDiscreteLogs`] — `y0 = g0^x` and `y1 = g1^x` for the same
//!   `x`.
//!
//! Each `make_*` takes the challenge version byte that pins the proof to its
//! protocol sub-step, the blinding randomness, and the subgroup order `q`
//! the responses are reduced by. Blinding values must be fresh per proof;
//! reuse leaks the secret exponent. `verify_*` recomputes the challenge from
//! the public values and returns a plain `bool` — mapping a `false` to a
//! protocol error is the state machine's job.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use num_bigint::BigInt;
use num_integer::Integer;

use crate::group::GroupElement;
use crate::hash::smp_hash;

/// Proof of knowledge of a discrete logarithm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofDiscreteLog {
    pub c: BigInt,
    pub d: BigInt,
}

/// Proof that two commitments share their discrete coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofEqualDiscreteCoordinates {
    pub c: BigInt,
    pub d0: BigInt,
    pub d1: BigInt,
}

/// Proof that two values share one discrete logarithm under different bases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofEqualDiscreteLogs {
    pub c: BigInt,
    pub d: BigInt,
}

/// Prove knowledge of `exponent` such that `y = g^exponent`.
pub fn make_proof_discrete_log(
    version: u8,
    g: &GroupElement,
    exponent: &BigInt,
    random_value: &BigInt,
    q: &BigInt,
) -> ProofDiscreteLog {
    let c = smp_hash(version, &[g.exponentiate(random_value).value()]);
    let d = (random_value - exponent * &c).mod_floor(q);
    ProofDiscreteLog { c, d }
}

/// Check a [`ProofDiscreteLog`] against the public key `y`.
pub fn verify_proof_discrete_log(
    version: u8,
    proof: &ProofDiscreteLog,
    g: &GroupElement,
    y: &GroupElement,
) -> bool {
    let commitment = g.exponentiate(&proof.d).operate(&y.exponentiate(&proof.c));
    proof.c == smp_hash(version, &[commitment.value()])
}

/// Prove `(y0, y1) = (g0^exponent0, g1^exponent0 * g2^exponent1)`.
#[allow(clippy::too_many_arguments)]
pub fn make_proof_equal_discrete_coordinates(
    version: u8,
    g0: &GroupElement,
    g1: &GroupElement,
    g2: &GroupElement,
    exponent0: &BigInt,
    exponent1: &BigInt,
    random_value0: &BigInt,
    random_value1: &BigInt,
    q: &BigInt,
) -> ProofEqualDiscreteCoordinates {
    let c = smp_hash(
        version,
        &[
            g0.exponentiate(random_value0).value(),
            g1.exponentiate(random_value0)
                .operate(&g2.exponentiate(random_value1))
                .value(),
        ],
    );
    let d0 = (random_value0 - exponent0 * &c).mod_floor(q);
    let d1 = (random_value1 - exponent1 * &c).mod_floor(q);
    ProofEqualDiscreteCoordinates { c, d0, d1 }
}

/// Check a [`ProofEqualDiscreteCoordinates`] against the commitments
/// `(y0, y1)`.
pub fn verify_proof_equal_discrete_coordinates(
    version: u8,
    g0: &GroupElement,
    g1: &GroupElement,
    g2: &GroupElement,
    y0: &GroupElement,
    y1: &GroupElement,
    proof: &ProofEqualDiscreteCoordinates,
) -> bool {
    let part0 = g0
        .exponentiate(&proof.d0)
        .operate(&y0.exponentiate(&proof.c));
    let part1 = g1
        .exponentiate(&proof.d0)
        .operate(&g2.exponentiate(&proof.d1))
        .operate(&y1.exponentiate(&proof.c));
    proof.c == smp_hash(version, &[part0.value(), part1.value()])
}

/// Prove `y0 = g0^exponent` and `y1 = g1^exponent` for one `exponent`.
pub fn make_proof_equal_discrete_logs(
    version: u8,
    g0: &GroupElement,
    g1: &GroupElement,
    exponent: &BigInt,
    random_value: &BigInt,
    q: &BigInt,
) -> ProofEqualDiscreteLogs {
    let c = smp_hash(
        version,
        &[
            g0.exponentiate(random_value).value(),
            g1.exponentiate(random_value).value(),
        ],
    );
    let d = (random_value - exponent * &c).mod_floor(q);
    ProofEqualDiscreteLogs { c, d }
}

/// Check a [`ProofEqualDiscreteLogs`] against the pair `(y0, y1)`.
pub fn verify_proof_equal_discrete_logs(
    version: u8,
    g0: &GroupElement,
    g1: &GroupElement,
    y0: &GroupElement,
    y1: &GroupElement,
    proof: &ProofEqualDiscreteLogs,
) -> bool {
    let part0 = g0.exponentiate(&proof.d).operate(&y0.exponentiate(&proof.c));
    let part1 = g1.exponentiate(&proof.d).operate(&y1.exponentiate(&proof.c));
    proof.c == smp_hash(version, &[part0.value(), part1.value()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use num_bigint::RandBigInt;
    use num_traits::Zero;
    use rand::{rngs::StdRng, SeedableRng};

    fn secret(rng: &mut StdRng, config: &Config) -> BigInt {
        rng.gen_bigint_range(&BigInt::zero(), config.q())
    }

    fn random_element(rng: &mut StdRng, config: &Config) -> GroupElement {
        config.generator().exponentiate(&secret(rng, config))
    }

    #[test]
    fn discrete_log_roundtrip_and_tamper() {
        let config = Config::otr1536();
        let mut rng = StdRng::seed_from_u64(10);
        let g = random_element(&mut rng, &config);
        let x = secret(&mut rng, &config);
        let r = secret(&mut rng, &config);
        let y = g.exponentiate(&x);

        let proof = make_proof_discrete_log(1, &g, &x, &r, config.q());
        assert!(verify_proof_discrete_log(1, &proof, &g, &y));

        // Wrong challenge version.
        assert!(!verify_proof_discrete_log(2, &proof, &g, &y));
        // Tampered response.
        let mut bad = proof.clone();
        bad.d += 1;
        assert!(!verify_proof_discrete_log(1, &bad, &g, &y));
        // Substituted public key.
        let other = random_element(&mut rng, &config);
        assert!(!verify_proof_discrete_log(1, &proof, &g, &other));
    }

    #[test]
    fn equal_discrete_coordinates_roundtrip_and_tamper() {
        let config = Config::otr1536();
        let mut rng = StdRng::seed_from_u64(11);
        let g0 = random_element(&mut rng, &config);
        let g1 = random_element(&mut rng, &config);
        let g2 = random_element(&mut rng, &config);
        let x0 = secret(&mut rng, &config);
        let x1 = secret(&mut rng, &config);
        let r0 = secret(&mut rng, &config);
        let r1 = secret(&mut rng, &config);
        let y0 = g0.exponentiate(&x0);
        let y1 = g1.exponentiate(&x0).operate(&g2.exponentiate(&x1));

        let proof = make_proof_equal_discrete_coordinates(
            1,
            &g0,
            &g1,
            &g2,
            &x0,
            &x1,
            &r0,
            &r1,
            config.q(),
        );
        assert!(verify_proof_equal_discrete_coordinates(
            1, &g0, &g1, &g2, &y0, &y1, &proof
        ));

        let mut bad = proof.clone();
        bad.d1 += 1;
        assert!(!verify_proof_equal_discrete_coordinates(
            1, &g0, &g1, &g2, &y0, &y1, &bad
        ));
    }

    #[test]
    fn equal_discrete_logs_roundtrip_and_tamper() {
        let config = Config::otr1536();
        let mut rng = StdRng::seed_from_u64(12);
        let g0 = random_element(&mut rng, &config);
        let g1 = random_element(&mut rng, &config);
        let x = secret(&mut rng, &config);
        let r = secret(&mut rng, &config);
        let y0 = g0.exponentiate(&x);
        let y1 = g1.exponentiate(&x);

        let proof = make_proof_equal_discrete_logs(1, &g0, &g1, &x, &r, config.q());
        assert!(verify_proof_equal_discrete_logs(1, &g0, &g1, &y0, &y1, &proof));

        let mut bad = proof.clone();
        bad.c += 1;
        assert!(!verify_proof_equal_discrete_logs(1, &g0, &g1, &y0, &y1, &bad));
        // Unrelated second value.
        let other = random_element(&mut rng, &config);
        assert!(!verify_proof_equal_discrete_logs(
            1, &g0, &g1, &y0, &other, &proof
        ));
    }
}
