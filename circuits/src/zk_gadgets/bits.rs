//! Gadgets binding packed field elements to fixed-width bit vectors
//!
//! The boolean decomposition here is the sole range check in the circuit:
//! a value witnessed at width `N` cannot exceed `2^N - 1` on any satisfying
//! assignment

use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::{
    alloc::AllocVar,
    boolean::Boolean,
    eq::EqGadget,
    fields::fp::FpVar,
    R1CSVar,
};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

/// A field element together with its constrained fixed-width little-endian
/// bit decomposition
///
/// The packed wire is the linear combination `Σ 2^i · b_i` of the bit wires,
/// so the two views are bound by construction
#[derive(Clone, Debug)]
pub struct DualVar<F: PrimeField> {
    /// The packed view of the value
    pub packed: FpVar<F>,
    /// The little-endian boolean view of the value
    pub bits: Vec<Boolean<F>>,
}

impl<F: PrimeField> DualVar<F> {
    /// Allocate a value as `width` boolean witnesses and derive the packed
    /// wire from them
    ///
    /// Bits of the value above `width` are dropped; callers validate ranges
    /// natively before witnessing
    pub fn new_witness(
        cs: ConstraintSystemRef<F>,
        value: &F,
        width: usize,
    ) -> Result<Self, SynthesisError> {
        let mut bit_values = value.into_bigint().to_bits_le();
        bit_values.resize(width, false);

        let bits = bit_values
            .into_iter()
            .map(|bit| Boolean::new_witness(cs.clone(), || Ok(bit)))
            .collect::<Result<Vec<_>, SynthesisError>>()?;
        let packed = Boolean::le_bits_to_fp_var(&bits)?;

        Ok(Self { packed, bits })
    }

    /// Decompose an existing wire into `width` bits, constraining the bits
    /// to repack to it
    ///
    /// Unsatisfiable when the wire's value does not fit in `width` bits;
    /// this is how the circuit asserts ranges on computed values
    pub fn from_fp(fp: &FpVar<F>, width: usize) -> Result<Self, SynthesisError> {
        let cs = fp.cs();
        let value = fp.value().unwrap_or_default();

        let mut bit_values = value.into_bigint().to_bits_le();
        bit_values.resize(width, false);

        let bits = bit_values
            .into_iter()
            .map(|bit| Boolean::new_witness(cs.clone(), || Ok(bit)))
            .collect::<Result<Vec<_>, SynthesisError>>()?;

        let repacked = Boolean::le_bits_to_fp_var(&bits)?;
        repacked.enforce_equal(fp)?;

        Ok(Self {
            packed: fp.clone(),
            bits,
        })
    }
}
