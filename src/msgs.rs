//! Protocol message codec
//!
//! One struct per round of the exchange, each with a fixed TLV type code and
//! a canonical flattening of its fields into a sequence of MPIs:
//!
//! | message | TLV type | MPIs |
//! |---|---|---|
//! | [`SmpMessage1`] | 2 | 6 |
//! | [`SmpMessage2`] | 3 | 11 |
//! | [`SmpMessage3`] | 4 | 8 |
//! | [`SmpMessage4`] | 5 | 3 |
//!
//! The TLV payload is a 4-byte MPI count followed by the MPIs themselves.
//! `from_tlv` checks the type code and the count against the message arity
//! and rebuilds group elements under the configured modulus; range and proof
//! validation stay with the state machine.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use num_bigint::BigInt;

use crate::config::Config;
use crate::error::SmpError;
use crate::group::GroupElement;
use crate::proofs::{ProofDiscreteLog, ProofEqualDiscreteCoordinates, ProofEqualDiscreteLogs};
use crate::wire::{Int, Mpi, Short, Tlv};

/// TLV type code of the first protocol message.
pub const TLV_TYPE_SMP_MESSAGE1: u16 = 2;
/// TLV type code of the second protocol message.
pub const TLV_TYPE_SMP_MESSAGE2: u16 = 3;
/// TLV type code of the third protocol message.
pub const TLV_TYPE_SMP_MESSAGE3: u16 = 4;
/// TLV type code of the fourth protocol message.
pub const TLV_TYPE_SMP_MESSAGE4: u16 = 5;

/// Serialize wire values as `count:u32 || MPI...` wrapped in a TLV.
fn tlv_from_values(typ: u16, values: &[&BigInt]) -> Result<Tlv, SmpError> {
    let count = Int::checked(values.len()).expect("wire value count fits four bytes");
    let mut payload = count.to_bytes().to_vec();
    for value in values {
        payload.extend_from_slice(&Mpi::new((*value).clone())?.to_bytes());
    }
    Tlv::new(Short(typ), payload)
}

/// Check the type code, then parse exactly `expected_count` MPIs.
fn values_from_tlv(
    tlv: &Tlv,
    expected_type: u16,
    expected_count: usize,
) -> Result<Vec<BigInt>, SmpError> {
    if tlv.typ().0 != expected_type {
        return Err(SmpError::Malformed(
            "TLV type code does not match the message type",
        ));
    }
    let bytes = tlv.value();
    if bytes.len() < Int::WIDTH {
        return Err(SmpError::Malformed("SMP message is missing its MPI count"));
    }
    let declared = Int::from_bytes(&bytes[..Int::WIDTH])?.0 as usize;
    if declared != expected_count {
        return Err(SmpError::Malformed(
            "MPI count does not match the message arity",
        ));
    }
    let mut rest = &bytes[Int::WIDTH..];
    let mut values = Vec::with_capacity(expected_count);
    for _ in 0..expected_count {
        let (mpi, tail) = Mpi::consume(rest)?;
        values.push(mpi.into_value());
        rest = tail;
    }
    Ok(values)
}

/// Round 1: the initiator's DH public values with their knowledge proofs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmpMessage1 {
    pub g2a: GroupElement,
    pub g2a_proof: ProofDiscreteLog,
    pub g3a: GroupElement,
    pub g3a_proof: ProofDiscreteLog,
}

impl SmpMessage1 {
    /// Flatten into the canonical TLV record.
    pub fn to_tlv(&self) -> Result<Tlv, SmpError> {
        tlv_from_values(
            TLV_TYPE_SMP_MESSAGE1,
            &[
                self.g2a.value(),
                &self.g2a_proof.c,
                &self.g2a_proof.d,
                self.g3a.value(),
                &self.g3a_proof.c,
                &self.g3a_proof.d,
            ],
        )
    }

    /// Parse from a TLV; public group values are rebuilt under the config's
    /// modulus.
    pub fn from_tlv(tlv: &Tlv, config: &Config) -> Result<Self, SmpError> {
        let values = values_from_tlv(tlv, TLV_TYPE_SMP_MESSAGE1, 6)?;
        let [g2a, c2, d2, g3a, c3, d3]: [BigInt; 6] =
            values.try_into().expect("arity was checked");
        Ok(Self {
            g2a: GroupElement::new(config.modulus().clone(), g2a),
            g2a_proof: ProofDiscreteLog { c: c2, d: d2 },
            g3a: GroupElement::new(config.modulus().clone(), g3a),
            g3a_proof: ProofDiscreteLog { c: c3, d: d3 },
        })
    }
}

/// Round 2: the responder's DH values plus its blinded commitment pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmpMessage2 {
    pub g2b: GroupElement,
    pub g2b_proof: ProofDiscreteLog,
    pub g3b: GroupElement,
    pub g3b_proof: ProofDiscreteLog,
    pub pb: GroupElement,
    pub qb: GroupElement,
    pub pbqb_proof: ProofEqualDiscreteCoordinates,
}

impl SmpMessage2 {
    pub fn to_tlv(&self) -> Result<Tlv, SmpError> {
        tlv_from_values(
            TLV_TYPE_SMP_MESSAGE2,
            &[
                self.g2b.value(),
                &self.g2b_proof.c,
                &self.g2b_proof.d,
                self.g3b.value(),
                &self.g3b_proof.c,
                &self.g3b_proof.d,
                self.pb.value(),
                self.qb.value(),
                &self.pbqb_proof.c,
                &self.pbqb_proof.d0,
                &self.pbqb_proof.d1,
            ],
        )
    }

    pub fn from_tlv(tlv: &Tlv, config: &Config) -> Result<Self, SmpError> {
        let values = values_from_tlv(tlv, TLV_TYPE_SMP_MESSAGE2, 11)?;
        let [g2b, c2, d2, g3b, c3, d3, pb, qb, c, d0, d1]: [BigInt; 11] =
            values.try_into().expect("arity was checked");
        Ok(Self {
            g2b: GroupElement::new(config.modulus().clone(), g2b),
            g2b_proof: ProofDiscreteLog { c: c2, d: d2 },
            g3b: GroupElement::new(config.modulus().clone(), g3b),
            g3b_proof: ProofDiscreteLog { c: c3, d: d3 },
            pb: GroupElement::new(config.modulus().clone(), pb),
            qb: GroupElement::new(config.modulus().clone(), qb),
            pbqb_proof: ProofEqualDiscreteCoordinates { c, d0, d1 },
        })
    }
}

/// Round 3: the initiator's commitment pair and its partial `R`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmpMessage3 {
    pub pa: GroupElement,
    pub qa: GroupElement,
    pub paqa_proof: ProofEqualDiscreteCoordinates,
    pub ra: GroupElement,
    pub ra_proof: ProofEqualDiscreteLogs,
}

impl SmpMessage3 {
    pub fn to_tlv(&self) -> Result<Tlv, SmpError> {
        tlv_from_values(
            TLV_TYPE_SMP_MESSAGE3,
            &[
                self.pa.value(),
                self.qa.value(),
                &self.paqa_proof.c,
                &self.paqa_proof.d0,
                &self.paqa_proof.d1,
                self.ra.value(),
                &self.ra_proof.c,
                &self.ra_proof.d,
            ],
        )
    }

    pub fn from_tlv(tlv: &Tlv, config: &Config) -> Result<Self, SmpError> {
        let values = values_from_tlv(tlv, TLV_TYPE_SMP_MESSAGE3, 8)?;
        let [pa, qa, c, d0, d1, ra, cr, dr]: [BigInt; 8] =
            values.try_into().expect("arity was checked");
        Ok(Self {
            pa: GroupElement::new(config.modulus().clone(), pa),
            qa: GroupElement::new(config.modulus().clone(), qa),
            paqa_proof: ProofEqualDiscreteCoordinates { c, d0, d1 },
            ra: GroupElement::new(config.modulus().clone(), ra),
            ra_proof: ProofEqualDiscreteLogs { c: cr, d: dr },
        })
    }
}

/// Round 4: the responder's partial `R`, closing the exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmpMessage4 {
    pub rb: GroupElement,
    pub rb_proof: ProofEqualDiscreteLogs,
}

impl SmpMessage4 {
    pub fn to_tlv(&self) -> Result<Tlv, SmpError> {
        tlv_from_values(
            TLV_TYPE_SMP_MESSAGE4,
            &[self.rb.value(), &self.rb_proof.c, &self.rb_proof.d],
        )
    }

    pub fn from_tlv(tlv: &Tlv, config: &Config) -> Result<Self, SmpError> {
        let values = values_from_tlv(tlv, TLV_TYPE_SMP_MESSAGE4, 3)?;
        let [rb, c, d]: [BigInt; 3] = values.try_into().expect("arity was checked");
        Ok(Self {
            rb: GroupElement::new(config.modulus().clone(), rb),
            rb_proof: ProofEqualDiscreteLogs { c, d },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::otr1536()
    }

    fn elem(config: &Config, v: u64) -> GroupElement {
        GroupElement::new(config.modulus().clone(), BigInt::from(v))
    }

    fn sample_message2(config: &Config) -> SmpMessage2 {
        SmpMessage2 {
            g2b: elem(config, 11),
            g2b_proof: ProofDiscreteLog { c: BigInt::from(1), d: BigInt::from(2) },
            g3b: elem(config, 13),
            g3b_proof: ProofDiscreteLog { c: BigInt::from(3), d: BigInt::from(4) },
            pb: elem(config, 17),
            qb: elem(config, 19),
            pbqb_proof: ProofEqualDiscreteCoordinates {
                c: BigInt::from(5),
                d0: BigInt::from(6),
                d1: BigInt::from(7),
            },
        }
    }

    #[test]
    fn message1_round_trips() {
        let config = config();
        let msg = SmpMessage1 {
            g2a: elem(&config, 5),
            g2a_proof: ProofDiscreteLog { c: BigInt::from(1), d: BigInt::from(2) },
            g3a: elem(&config, 7),
            g3a_proof: ProofDiscreteLog { c: BigInt::from(3), d: BigInt::from(4) },
        };
        let tlv = msg.to_tlv().unwrap();
        assert_eq!(tlv.typ().0, TLV_TYPE_SMP_MESSAGE1);
        assert_eq!(SmpMessage1::from_tlv(&tlv, &config).unwrap(), msg);
    }

    #[test]
    fn message2_round_trips() {
        let config = config();
        let msg = sample_message2(&config);
        let tlv = msg.to_tlv().unwrap();
        assert_eq!(SmpMessage2::from_tlv(&tlv, &config).unwrap(), msg);
    }

    #[test]
    fn message3_round_trips() {
        let config = config();
        let msg = SmpMessage3 {
            pa: elem(&config, 23),
            qa: elem(&config, 29),
            paqa_proof: ProofEqualDiscreteCoordinates {
                c: BigInt::from(1),
                d0: BigInt::from(2),
                d1: BigInt::from(3),
            },
            ra: elem(&config, 31),
            ra_proof: ProofEqualDiscreteLogs { c: BigInt::from(4), d: BigInt::from(5) },
        };
        let tlv = msg.to_tlv().unwrap();
        assert_eq!(SmpMessage3::from_tlv(&tlv, &config).unwrap(), msg);
    }

    #[test]
    fn message4_round_trips() {
        let config = config();
        let msg = SmpMessage4 {
            rb: elem(&config, 37),
            rb_proof: ProofEqualDiscreteLogs { c: BigInt::from(6), d: BigInt::from(7) },
        };
        let tlv = msg.to_tlv().unwrap();
        assert_eq!(SmpMessage4::from_tlv(&tlv, &config).unwrap(), msg);
    }

    #[test]
    fn wrong_type_code_is_rejected() {
        let config = config();
        let tlv = sample_message2(&config).to_tlv().unwrap();
        assert!(matches!(
            SmpMessage1::from_tlv(&tlv, &config),
            Err(SmpError::Malformed(_))
        ));
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let config = config();
        // A type-2 TLV carrying only five wire values.
        let five = BigInt::from(5);
        let values: Vec<&BigInt> = std::iter::repeat(&five).take(5).collect();
        let tlv = tlv_from_values(TLV_TYPE_SMP_MESSAGE1, &values).unwrap();
        assert!(matches!(
            SmpMessage1::from_tlv(&tlv, &config),
            Err(SmpError::Malformed(_))
        ));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let config = config();
        let mut bytes = sample_message2(&config).to_tlv().unwrap().to_bytes();
        // Chop the final MPI short, fixing up the TLV length field.
        bytes.truncate(bytes.len() - 1);
        let shortened = (bytes.len() - 4) as u16;
        bytes[2..4].copy_from_slice(&shortened.to_be_bytes());
        let tlv = Tlv::from_bytes(&bytes).unwrap();
        assert!(matches!(
            SmpMessage2::from_tlv(&tlv, &config),
            Err(SmpError::Malformed(_))
        ));
    }
}
