//! Merkle update gadgets: prove an old leaf under the pre-root, write the
//! new leaf and emit the post-root
//!
//! Inclusion and recomputation share the same sibling wires; that reuse is
//! what binds "the leaf that was read" to "the leaf that is written" without
//! an explicit key-equality constraint

use ark_ed_on_bn254::constraints::EdwardsVar;
use ark_r1cs_std::{boolean::Boolean, fields::fp::FpVar};
use ark_relations::r1cs::SynthesisError;
use constants::ScalarField;
use settlement_crypto::merkle::leaf_iv;

use crate::zk_gadgets::{bits::DualVar, longsight::LongsightGadget, merkle::MerklePathGadget};

/// Updates one trading-history leaf
///
/// The leaf duplicates the filled amount to fit the 2-ary compressor. The
/// new filled amount is the old one plus the order's sell fill; the cap
/// against the order amount is the caller's constraint
#[derive(Clone, Debug)]
pub struct UpdateFilledGadget {
    /// The root after the update
    pub new_root: FpVar<ScalarField>,
    /// The updated cumulative fill
    pub filled_after: FpVar<ScalarField>,
}

impl UpdateFilledGadget {
    /// Prove the old leaf and emit the updated root
    pub fn apply(
        root_before: &FpVar<ScalarField>,
        address_bits: &[Boolean<ScalarField>],
        filled_before: &DualVar<ScalarField>,
        fill: &DualVar<ScalarField>,
        proof: &[FpVar<ScalarField>],
    ) -> Result<Self, SynthesisError> {
        let filled_after = &filled_before.packed + &fill.packed;

        let leaf_before = LongsightGadget::compress(
            leaf_iv(),
            &[filled_before.packed.clone(), filled_before.packed.clone()],
        )?;
        MerklePathGadget::compute_and_constrain_root(
            &leaf_before,
            address_bits,
            proof,
            root_before,
        )?;

        let leaf_after =
            LongsightGadget::compress(leaf_iv(), &[filled_after.clone(), filled_after.clone()])?;
        let new_root = MerklePathGadget::compute_root(&leaf_after, address_bits, proof)?;

        Ok(Self {
            new_root,
            filled_after,
        })
    }
}

/// Updates one account leaf
///
/// Both the before and after leaves re-hash the same public key and token
/// wires; only the balance changes
#[derive(Clone, Debug)]
pub struct UpdateBalanceGadget {
    /// The root after the update
    pub new_root: FpVar<ScalarField>,
}

impl UpdateBalanceGadget {
    /// Prove the old leaf and emit the updated root
    pub fn apply(
        root_before: &FpVar<ScalarField>,
        address_bits: &[Boolean<ScalarField>],
        key: &EdwardsVar,
        token: &FpVar<ScalarField>,
        balance_before: &FpVar<ScalarField>,
        balance_after: &FpVar<ScalarField>,
        proof: &[FpVar<ScalarField>],
    ) -> Result<Self, SynthesisError> {
        let leaf_before = LongsightGadget::compress(
            leaf_iv(),
            &[
                key.x.clone(),
                key.y.clone(),
                token.clone(),
                balance_before.clone(),
            ],
        )?;
        MerklePathGadget::compute_and_constrain_root(
            &leaf_before,
            address_bits,
            proof,
            root_before,
        )?;

        let leaf_after = LongsightGadget::compress(
            leaf_iv(),
            &[
                key.x.clone(),
                key.y.clone(),
                token.clone(),
                balance_after.clone(),
            ],
        )?;
        let new_root = MerklePathGadget::compute_root(&leaf_after, address_bits, proof)?;

        Ok(Self { new_root })
    }
}
