//! The EdDSA verification gadget
//!
//! Verifies `s·B = R + h·A` on the embedded curve, where the challenge
//! `h = H(R.x, R.y, A.x, A.y, m_0, m_1, ...)` is the LongsightL sponge over
//! the point coordinates and the message packed into field chunks. The
//! verifier is pure: no key-prefix hashing, no cofactor clearing

use ark_ed_on_bn254::constraints::EdwardsVar;
use ark_r1cs_std::{
    alloc::AllocVar,
    boolean::Boolean,
    eq::EqGadget,
    fields::fp::FpVar,
    groups::CurveVar,
    R1CSVar, ToBitsGadget,
};
use ark_relations::r1cs::SynthesisError;
use constants::{EmbeddedCurveProjective, ScalarField, MESSAGE_CHUNK_BITS};
use settlement_crypto::eddsa::base_point;

use super::longsight::LongsightSpongeGadget;

/// Verifies EdDSA signatures over bit-vector messages
#[derive(Clone, Debug)]
pub struct EdDSAGadget;

impl EdDSAGadget {
    /// Constrain `(sig_r, sig_s)` to be a valid signature on `msg_bits`
    /// under `pk` and the fixed base point
    pub fn verify(
        pk: &EdwardsVar,
        sig_r: &EdwardsVar,
        sig_s_bits: &[Boolean<ScalarField>],
        msg_bits: &[Boolean<ScalarField>],
    ) -> Result<(), SynthesisError> {
        let challenge = Self::challenge(pk, sig_r, msg_bits)?;
        let challenge_bits = challenge.to_bits_le()?;

        let base = EdwardsVar::new_constant(
            pk.cs(),
            EmbeddedCurveProjective::from(base_point()),
        )?;
        let lhs = base.scalar_mul_le(sig_s_bits.iter())?;
        let rhs = sig_r.clone() + pk.scalar_mul_le(challenge_bits.iter())?;

        lhs.enforce_equal(&rhs)
    }

    /// Compute the signature challenge wire
    fn challenge(
        pk: &EdwardsVar,
        sig_r: &EdwardsVar,
        msg_bits: &[Boolean<ScalarField>],
    ) -> Result<FpVar<ScalarField>, SynthesisError> {
        let mut inputs = vec![
            sig_r.x.clone(),
            sig_r.y.clone(),
            pk.x.clone(),
            pk.y.clone(),
        ];
        for chunk in msg_bits.chunks(MESSAGE_CHUNK_BITS) {
            inputs.push(Boolean::le_bits_to_fp_var(chunk)?);
        }

        LongsightSpongeGadget::new().hash(&inputs)
    }
}
