//! Protocol state machine
//!
//! Drives the four-message exchange from either role to a verified boolean
//! outcome. The same code runs the initiator (Alice) and the responder
//! (Bob): a session started with `transit(None)` initiates, a session first
//! handed a Message 1 responds.
//!
//! ## Shape
//! - The position of a session is a [`SmpState`] value; every transition
//!   consumes the old state and produces a new one. There is no partially
//!   filled record: each variant holds exactly what later steps need.
//! - `transit` is synchronous and does no I/O. Waiting for bytes is the
//!   transport's job; the caller hands in one decoded [`Tlv`] at a time and
//!   serializes calls per session.
//! - Blinding randomness comes from the injected rng, drawn fresh below `q`
//!   for every proof.
//!
//! ## Validation discipline
//! Every received group element must lie in `[2, p-2]` and every proof must
//! verify under its step's challenge version (1 through 8 across the four
//! rounds). A violation, like a message arriving in the wrong step, is
//! terminal: the machine poisons itself and every later `transit` fails with
//! the sequencing error. Recovery is a new session, never a retry.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use num_bigint::{BigInt, RandBigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{rngs::OsRng, CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::Config;
use crate::error::SmpError;
use crate::group::GroupElement;
use crate::msgs::{
    SmpMessage1, SmpMessage2, SmpMessage3, SmpMessage4, TLV_TYPE_SMP_MESSAGE1,
    TLV_TYPE_SMP_MESSAGE2, TLV_TYPE_SMP_MESSAGE3, TLV_TYPE_SMP_MESSAGE4,
};
use crate::proofs::{
    make_proof_discrete_log, make_proof_equal_discrete_coordinates,
    make_proof_equal_discrete_logs, verify_proof_discrete_log,
    verify_proof_equal_discrete_coordinates, verify_proof_equal_discrete_logs,
    ProofDiscreteLog, ProofEqualDiscreteCoordinates, ProofEqualDiscreteLogs,
};
use crate::wire::Tlv;

/// A comparison secret. Reduced modulo the subgroup order when it enters a
/// state machine.
#[derive(Clone, Debug)]
pub struct Secret(BigInt);

impl From<BigInt> for Secret {
    fn from(value: BigInt) -> Self {
        Self(value)
    }
}

impl From<u64> for Secret {
    fn from(value: u64) -> Self {
        Self(BigInt::from(value))
    }
}

impl From<&[u8]> for Secret {
    /// Bytes are read as a big-endian magnitude.
    fn from(bytes: &[u8]) -> Self {
        Self(BigInt::from_bytes_be(Sign::Plus, bytes))
    }
}

impl From<&str> for Secret {
    /// Strings are hashed with SHA-256 and the digest read as a big-endian
    /// magnitude, so arbitrary-length pass-phrases compare correctly.
    fn from(s: &str) -> Self {
        Self(BigInt::from_bytes_be(Sign::Plus, &Sha256::digest(s.as_bytes())))
    }
}

/// The protocol position of one session.
///
/// Variants carry exactly the values the remaining steps consume; `l`/`r`
/// suffixes mean local and remote, `p_init`/`p_resp` are the initiator's and
/// responder's commitments in role order.
#[derive(Clone, Debug)]
pub enum SmpState {
    /// Nothing exchanged yet. `transit(None)` initiates; a Message 1
    /// responds.
    Initial,
    /// Initiator: Message 1 sent, awaiting the responder's Message 2.
    AwaitingMessage2 { s2: BigInt, s3: BigInt },
    /// Responder: Message 2 sent, awaiting the initiator's Message 3.
    AwaitingMessage3 {
        s3: BigInt,
        g3r: GroupElement,
        g2: GroupElement,
        g3: GroupElement,
        pl: GroupElement,
        ql: GroupElement,
    },
    /// Initiator: Message 3 sent, awaiting the responder's Message 4.
    AwaitingMessage4 {
        s3: BigInt,
        g3r: GroupElement,
        pl: GroupElement,
        ql: GroupElement,
        pr: GroupElement,
        qr: GroupElement,
    },
    /// Terminal: the combined value is known and the result can be read.
    Finished {
        p_init: GroupElement,
        p_resp: GroupElement,
        rab: GroupElement,
    },
}

/// One SMP session, from either role.
pub struct SmpStateMachine<R: RngCore + CryptoRng = OsRng> {
    config: Config,
    x: BigInt,
    rng: R,
    /// `None` once a terminal error poisoned the session.
    state: Option<SmpState>,
}

/// Map a received TLV to the step check: the expected type proceeds, another
/// SMP message type is a sequencing violation, anything else is not an SMP
/// message at all.
fn expect_smp_message(tlv: &Tlv, expected: u16) -> Result<(), SmpError> {
    let typ = tlv.typ().0;
    if typ == expected {
        Ok(())
    } else if (TLV_TYPE_SMP_MESSAGE1..=TLV_TYPE_SMP_MESSAGE4).contains(&typ) {
        Err(SmpError::UnexpectedMessage)
    } else {
        Err(SmpError::Malformed("TLV is not an SMP protocol message"))
    }
}

impl SmpStateMachine<OsRng> {
    /// Start a session drawing randomness from the operating system.
    pub fn new(secret: impl Into<Secret>, config: &Config) -> Self {
        Self::with_rng(secret, config, OsRng)
    }
}

impl<R: RngCore + CryptoRng> SmpStateMachine<R> {
    /// Start a session with an explicit randomness source. Tests substitute
    /// a seeded rng here; production uses [`SmpStateMachine::new`].
    pub fn with_rng(secret: impl Into<Secret>, config: &Config, rng: R) -> Self {
        let x = secret.into().0.mod_floor(config.q());
        Self {
            config: config.clone(),
            x,
            rng,
            state: Some(SmpState::Initial),
        }
    }

    /// Advance the session: `None` initiates from [`SmpState::Initial`], a
    /// message advances whichever step expects it. Returns the reply to send,
    /// if any. Any error is terminal for the session.
    pub fn transit(&mut self, msg: Option<Tlv>) -> Result<Option<Tlv>, SmpError> {
        if self.is_finished() {
            // The verdict stays readable; only the transit is refused.
            return Err(SmpError::UnexpectedMessage);
        }
        let state = self.state.take().ok_or(SmpError::UnexpectedMessage)?;
        let (next, reply) = self.step(state, msg)?;
        self.state = Some(next);
        Ok(reply)
    }

    /// Whether the exchange has completed and a result is available.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, Some(SmpState::Finished { .. }))
    }

    /// The protocol verdict: `true` iff both secrets were equal. Fails with
    /// [`SmpError::NotFinished`] before the exchange completes.
    pub fn get_result(&self) -> Result<bool, SmpError> {
        match &self.state {
            Some(SmpState::Finished { p_init, p_resp, rab }) => {
                Ok(*rab == p_init.operate(&p_resp.inverse()))
            }
            _ => Err(SmpError::NotFinished),
        }
    }

    fn step(
        &mut self,
        state: SmpState,
        msg: Option<Tlv>,
    ) -> Result<(SmpState, Option<Tlv>), SmpError> {
        match (state, msg) {
            (SmpState::Initial, None) => self.initiate(),
            (SmpState::Initial, Some(tlv)) => {
                expect_smp_message(&tlv, TLV_TYPE_SMP_MESSAGE1)?;
                self.handle_message1(&tlv)
            }
            (SmpState::AwaitingMessage2 { s2, s3 }, Some(tlv)) => {
                expect_smp_message(&tlv, TLV_TYPE_SMP_MESSAGE2)?;
                self.handle_message2(s2, s3, &tlv)
            }
            (SmpState::AwaitingMessage3 { s3, g3r, g2, g3, pl, ql }, Some(tlv)) => {
                expect_smp_message(&tlv, TLV_TYPE_SMP_MESSAGE3)?;
                self.handle_message3(s3, g3r, g2, g3, pl, ql, &tlv)
            }
            (SmpState::AwaitingMessage4 { s3, g3r, pl, ql, pr, qr }, Some(tlv)) => {
                expect_smp_message(&tlv, TLV_TYPE_SMP_MESSAGE4)?;
                self.handle_message4(s3, g3r, pl, ql, pr, qr, &tlv)
            }
            (SmpState::Finished { .. }, _) | (_, None) => Err(SmpError::UnexpectedMessage),
        }
    }

    /// Alice, step 0: send `g2a`, `g3a` with knowledge proofs.
    fn initiate(&mut self) -> Result<(SmpState, Option<Tlv>), SmpError> {
        let s2 = self.random_secret();
        let s3 = self.random_secret();
        let (g2a, g2a_proof) = self.make_dh_pubkey(1, &s2);
        let (g3a, g3a_proof) = self.make_dh_pubkey(2, &s3);
        let reply = SmpMessage1 { g2a, g2a_proof, g3a, g3a_proof }.to_tlv()?;
        debug!("initiated SMP exchange");
        Ok((SmpState::AwaitingMessage2 { s2, s3 }, Some(reply)))
    }

    /// Bob, step 1: verify Alice's DH values, send our own plus the blinded
    /// commitment pair `(pb, qb)`.
    fn handle_message1(&mut self, tlv: &Tlv) -> Result<(SmpState, Option<Tlv>), SmpError> {
        let msg = SmpMessage1::from_tlv(tlv, &self.config)?;
        if !self.is_valid_element(&msg.g2a) || !self.is_valid_element(&msg.g3a) {
            return Err(SmpError::InvalidElement);
        }
        if !self.verify_dh_pubkey(1, &msg.g2a, &msg.g2a_proof) {
            return Err(SmpError::InvalidProof);
        }
        if !self.verify_dh_pubkey(2, &msg.g3a, &msg.g3a_proof) {
            return Err(SmpError::InvalidProof);
        }

        let s2 = self.random_secret();
        let s3 = self.random_secret();
        let (g2b, g2b_proof) = self.make_dh_pubkey(3, &s2);
        let (g3b, g3b_proof) = self.make_dh_pubkey(4, &s3);
        let g2 = msg.g2a.exponentiate(&s2);
        let g3 = msg.g3a.exponentiate(&s3);
        let (pb, qb, pbqb_proof) = self.make_pl_ql(5, &g2, &g3);

        let reply = SmpMessage2 {
            g2b,
            g2b_proof,
            g3b,
            g3b_proof,
            pb: pb.clone(),
            qb: qb.clone(),
            pbqb_proof,
        }
        .to_tlv()?;
        debug!("verified message 1, replying with message 2");
        Ok((
            SmpState::AwaitingMessage3 { s3, g3r: msg.g3a, g2, g3, pl: pb, ql: qb },
            Some(reply),
        ))
    }

    /// Alice, step 2: verify Bob's DH values and commitments, send our own
    /// `(pa, qa)` and the partial `ra`.
    fn handle_message2(
        &mut self,
        s2: BigInt,
        s3: BigInt,
        tlv: &Tlv,
    ) -> Result<(SmpState, Option<Tlv>), SmpError> {
        let msg = SmpMessage2::from_tlv(tlv, &self.config)?;
        if !self.is_valid_element(&msg.g2b)
            || !self.is_valid_element(&msg.g3b)
            || !self.is_valid_element(&msg.pb)
            || !self.is_valid_element(&msg.qb)
        {
            return Err(SmpError::InvalidElement);
        }
        if !self.verify_dh_pubkey(3, &msg.g2b, &msg.g2b_proof) {
            return Err(SmpError::InvalidProof);
        }
        if !self.verify_dh_pubkey(4, &msg.g3b, &msg.g3b_proof) {
            return Err(SmpError::InvalidProof);
        }

        let g2 = msg.g2b.exponentiate(&s2);
        let g3 = msg.g3b.exponentiate(&s3);
        if !self.verify_pl_ql(5, &g2, &g3, &msg.pb, &msg.qb, &msg.pbqb_proof) {
            return Err(SmpError::InvalidProof);
        }

        let (pa, qa, paqa_proof) = self.make_pl_ql(6, &g2, &g3);
        let (ra, ra_proof) = self.make_rl(7, &s3, &qa, &msg.qb);

        let reply = SmpMessage3 {
            pa: pa.clone(),
            qa: qa.clone(),
            paqa_proof,
            ra,
            ra_proof,
        }
        .to_tlv()?;
        debug!("verified message 2, replying with message 3");
        Ok((
            SmpState::AwaitingMessage4 {
                s3,
                g3r: msg.g3b,
                pl: pa,
                ql: qa,
                pr: msg.pb,
                qr: msg.qb,
            },
            Some(reply),
        ))
    }

    /// Bob, step 3: verify Alice's commitments and partial `ra`, reply with
    /// our partial `rb` and learn the result.
    #[allow(clippy::too_many_arguments)]
    fn handle_message3(
        &mut self,
        s3: BigInt,
        g3r: GroupElement,
        g2: GroupElement,
        g3: GroupElement,
        pl: GroupElement,
        ql: GroupElement,
        tlv: &Tlv,
    ) -> Result<(SmpState, Option<Tlv>), SmpError> {
        let msg = SmpMessage3::from_tlv(tlv, &self.config)?;
        if !self.is_valid_element(&msg.pa)
            || !self.is_valid_element(&msg.qa)
            || !self.is_valid_element(&msg.ra)
        {
            return Err(SmpError::InvalidElement);
        }
        if !self.verify_pl_ql(6, &g2, &g3, &msg.pa, &msg.qa, &msg.paqa_proof) {
            return Err(SmpError::InvalidProof);
        }
        if !self.verify_rl(7, &g3r, &msg.ra, &msg.ra_proof, &msg.qa, &ql) {
            return Err(SmpError::InvalidProof);
        }

        let (rb, rb_proof) = self.make_rl(8, &s3, &msg.qa, &ql);
        let rab = msg.ra.exponentiate(&s3);
        let reply = SmpMessage4 { rb, rb_proof }.to_tlv()?;
        debug!("verified message 3, replying with message 4; result known");
        Ok((
            SmpState::Finished { p_init: msg.pa, p_resp: pl, rab },
            Some(reply),
        ))
    }

    /// Alice, step 4: verify Bob's partial `rb` and learn the result. No
    /// reply.
    #[allow(clippy::too_many_arguments)]
    fn handle_message4(
        &mut self,
        s3: BigInt,
        g3r: GroupElement,
        pl: GroupElement,
        ql: GroupElement,
        pr: GroupElement,
        qr: GroupElement,
        tlv: &Tlv,
    ) -> Result<(SmpState, Option<Tlv>), SmpError> {
        let msg = SmpMessage4::from_tlv(tlv, &self.config)?;
        if !self.is_valid_element(&msg.rb) {
            return Err(SmpError::InvalidElement);
        }
        if !self.verify_rl(8, &g3r, &msg.rb, &msg.rb_proof, &ql, &qr) {
            return Err(SmpError::InvalidProof);
        }

        let rab = msg.rb.exponentiate(&s3);
        debug!("verified message 4; result known");
        Ok((SmpState::Finished { p_init: pl, p_resp: pr, rab }, None))
    }

    // ------------------------------ Helpers ------------------------------

    /// Uniform draw from `[0, q)`.
    fn random_secret(&mut self) -> BigInt {
        self.rng.gen_bigint_range(&BigInt::zero(), self.config.q())
    }

    /// `2 <= value <= p - 2`, checked on every received element.
    fn is_valid_element(&self, g: &GroupElement) -> bool {
        let upper = self.config.modulus() - 1u32;
        *g.value() > BigInt::one() && *g.value() < upper
    }

    /// A DH public value `g1^secret` with its knowledge proof.
    fn make_dh_pubkey(&mut self, version: u8, secret: &BigInt) -> (GroupElement, ProofDiscreteLog) {
        let r = self.random_secret();
        let g1 = self.config.generator();
        let pubkey = g1.exponentiate(secret);
        let proof = make_proof_discrete_log(version, g1, secret, &r, self.config.q());
        (pubkey, proof)
    }

    fn verify_dh_pubkey(
        &self,
        version: u8,
        pubkey: &GroupElement,
        proof: &ProofDiscreteLog,
    ) -> bool {
        verify_proof_discrete_log(version, proof, self.config.generator(), pubkey)
    }

    /// Our blinded commitment pair `(pL, qL) = (g3^r, g1^r * g2^x)` with its
    /// coordinates proof.
    fn make_pl_ql(
        &mut self,
        version: u8,
        g2: &GroupElement,
        g3: &GroupElement,
    ) -> (GroupElement, GroupElement, ProofEqualDiscreteCoordinates) {
        let r = self.random_secret();
        let r0 = self.random_secret();
        let r1 = self.random_secret();
        let g1 = self.config.generator();
        let pl = g3.exponentiate(&r);
        let ql = g1.exponentiate(&r).operate(&g2.exponentiate(&self.x));
        let proof = make_proof_equal_discrete_coordinates(
            version,
            g3,
            g1,
            g2,
            &r,
            &self.x,
            &r0,
            &r1,
            self.config.q(),
        );
        (pl, ql, proof)
    }

    fn verify_pl_ql(
        &self,
        version: u8,
        g2: &GroupElement,
        g3: &GroupElement,
        pr: &GroupElement,
        qr: &GroupElement,
        proof: &ProofEqualDiscreteCoordinates,
    ) -> bool {
        verify_proof_equal_discrete_coordinates(
            version,
            g3,
            self.config.generator(),
            g2,
            pr,
            qr,
            proof,
        )
    }

    /// Our partial `R = (qa/qb)^s3` with its equal-logs proof.
    fn make_rl(
        &mut self,
        version: u8,
        s3: &BigInt,
        qa: &GroupElement,
        qb: &GroupElement,
    ) -> (GroupElement, ProofEqualDiscreteLogs) {
        let r = self.random_secret();
        let g1 = self.config.generator();
        let qa_div_qb = qa.operate(&qb.inverse());
        let rl = qa_div_qb.exponentiate(s3);
        let proof =
            make_proof_equal_discrete_logs(version, g1, &qa_div_qb, s3, &r, self.config.q());
        (rl, proof)
    }

    /// Check the remote partial `R` against the remote DH key `g3r` over the
    /// same `qa/qb` ratio.
    fn verify_rl(
        &self,
        version: u8,
        g3r: &GroupElement,
        rr: &GroupElement,
        proof: &ProofEqualDiscreteLogs,
        qa: &GroupElement,
        qb: &GroupElement,
    ) -> bool {
        let qa_div_qb = qa.operate(&qb.inverse());
        verify_proof_equal_discrete_logs(
            version,
            self.config.generator(),
            &qa_div_qb,
            g3r,
            rr,
            proof,
        )
    }
}
