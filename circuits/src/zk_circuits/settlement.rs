//! The circuit top: chains the ring settlements, threads both root chains
//! and binds everything to the single public input
//!
//! Two bit-order conventions meet here. Field decompositions are
//! little-endian while SHA-256 speaks most-significant-bit first; the
//! per-chunk reversal in the stream flattener and the `digest[255-i] =
//! public[i]` remap reconcile them, and the on-chain verifier re-derives the
//! identical byte stream

use ark_crypto_primitives::crh::sha256::constraints::Sha256Gadget;
use ark_r1cs_std::{
    alloc::AllocVar,
    boolean::Boolean,
    eq::EqGadget,
    fields::fp::FpVar,
    uint8::UInt8,
    ToBitsGadget,
};
use ark_relations::{
    ns,
    r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError},
};
use circuit_types::settlement::SettlementBatch;
use constants::{ScalarField, ROOT_BITS};
use settlement_crypto::fields::scalar_to_bits_le;
use tracing::debug;

use super::ring_settlement::{RingSettlementGadget, RingSettlementVar};

/// The statement the circuit proves against: the single public input
#[derive(Clone, Debug)]
pub struct SettlementStatement {
    /// The SHA-256 commitment over the public-data stream, reduced into the
    /// scalar field
    pub public_data_hash: ScalarField,
}

/// The settlement circuit over a batch of rings
///
/// The constraint structure depends only on the number of rings and the
/// fixed tree depths, so proving and verifying keys generated from a
/// [`blank`](Self::blank) instance fit every batch of the same shape
#[derive(Clone, Debug)]
pub struct SettlementCircuit {
    /// The public statement
    pub statement: SettlementStatement,
    /// The private witness
    pub witness: SettlementBatch,
}

impl SettlementCircuit {
    /// Build a circuit over a batch and its declared public input
    pub fn new(statement: SettlementStatement, witness: SettlementBatch) -> Self {
        Self { statement, witness }
    }

    /// A circuit with vacuous content, for constraint generation
    pub fn blank(num_rings: usize) -> Self {
        Self {
            statement: SettlementStatement {
                public_data_hash: ScalarField::from(0u64),
            },
            witness: SettlementBatch::blank(num_rings),
        }
    }

    /// A 256-bit dual view of a root: boolean witnesses plus their packing
    fn alloc_root_dual(
        cs: ConstraintSystemRef<ScalarField>,
        value: &ScalarField,
    ) -> Result<(FpVar<ScalarField>, Vec<Boolean<ScalarField>>), SynthesisError> {
        let bits = scalar_to_bits_le(value, ROOT_BITS)
            .into_iter()
            .map(|bit| Boolean::new_witness(cs.clone(), || Ok(bit)))
            .collect::<Result<Vec<_>, SynthesisError>>()?;
        let packed = Boolean::le_bits_to_fp_var(&bits)?;

        Ok((packed, bits))
    }
}

impl ConstraintSynthesizer<ScalarField> for SettlementCircuit {
    fn generate_constraints(
        self,
        cs: ConstraintSystemRef<ScalarField>,
    ) -> Result<(), SynthesisError> {
        let num_rings = self.witness.rings.len();

        let public_hash = FpVar::new_input(ns!(cs, "public_data_hash"), || {
            Ok(self.statement.public_data_hash)
        })?;

        // The four roots, each as packed-plus-bits
        let (history_before, history_before_bits) =
            Self::alloc_root_dual(cs.clone(), &self.witness.history_root_before)?;
        let (history_after, history_after_bits) =
            Self::alloc_root_dual(cs.clone(), &self.witness.history_root_after)?;
        let (accounts_before, accounts_before_bits) =
            Self::alloc_root_dual(cs.clone(), &self.witness.accounts_root_before)?;
        let (accounts_after, accounts_after_bits) =
            Self::alloc_root_dual(cs.clone(), &self.witness.accounts_root_after)?;

        let mut public_chunks = vec![
            history_before_bits,
            history_after_bits,
            accounts_before_bits,
            accounts_after_bits,
        ];

        // Chain the rings; each ring's post-roots seed the next ring's
        // pre-roots, independently per tree
        let mut history_root = history_before;
        let mut accounts_root = accounts_before;
        for settlement in self.witness.rings.iter() {
            let ring_var = RingSettlementVar::new_witness(cs.clone(), settlement)?;
            let output = RingSettlementGadget::apply(&ring_var, &history_root, &accounts_root)?;

            history_root = output.new_history_root;
            accounts_root = output.new_accounts_root;
            public_chunks.extend(output.public_data);
        }

        // Both chains must land on the declared after-roots
        history_root.enforce_equal(&history_after)?;
        accounts_root.enforce_equal(&accounts_after)?;

        // Flatten the chunks most-significant-bit first and collect the
        // stream into bytes for the digest
        let stream: Vec<Boolean<ScalarField>> = public_chunks
            .iter()
            .flat_map(|chunk| chunk.iter().rev().cloned())
            .collect();
        let bytes: Vec<UInt8<ScalarField>> = stream
            .chunks(8)
            .map(|byte_bits| {
                let le_bits: Vec<Boolean<ScalarField>> =
                    byte_bits.iter().rev().cloned().collect();
                UInt8::from_bits_le(&le_bits)
            })
            .collect();

        let digest = Sha256Gadget::digest(&bytes)?;
        let mut digest_msb = Vec::with_capacity(ROOT_BITS);
        for byte in digest.0.iter() {
            let le_bits = byte.to_bits_le()?;
            digest_msb.extend(le_bits.into_iter().rev());
        }

        // Bind the digest to the public input, reconciling the two bit
        // orders: bit i of the packed input is digest bit 255 - i. The raw
        // digest may exceed the field order; the packing reduces it exactly
        // as the native hasher does
        let remapped: Vec<Boolean<ScalarField>> = (0..ROOT_BITS)
            .map(|i| digest_msb[ROOT_BITS - 1 - i].clone())
            .collect();
        Boolean::le_bits_to_fp_var(&remapped)?.enforce_equal(&public_hash)?;

        debug!(
            num_rings,
            num_constraints = cs.num_constraints(),
            "built settlement circuit"
        );

        Ok(())
    }
}
