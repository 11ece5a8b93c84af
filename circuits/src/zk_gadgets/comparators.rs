//! Gadgets for binary comparison operators

use ark_ff::PrimeField;
use ark_r1cs_std::{
    boolean::Boolean,
    eq::EqGadget,
    fields::{fp::FpVar, FieldVar},
};
use ark_relations::r1cs::SynthesisError;
use constants::COMPARISON_BITS;

use crate::scalar_2_to_m;

use super::bits::DualVar;

/// A gadget comparing two values of at most [`COMPARISON_BITS`] bits
///
/// The encoding follows the classic comparison shape: decompose
/// `2^n + b - a` into `n + 1` bits, whose top bit is exactly `a <= b`.
/// Operands wider than `n` bits leave the decomposition unsatisfiable
#[derive(Clone, Debug)]
pub struct LeqGadget;

impl LeqGadget {
    /// Compute the pair `(a < b, a <= b)` as boolean wires
    pub fn leq<F: PrimeField>(
        a: &FpVar<F>,
        b: &FpVar<F>,
    ) -> Result<(Boolean<F>, Boolean<F>), SynthesisError> {
        let shift = FpVar::constant(scalar_2_to_m::<F>(COMPARISON_BITS));
        let alpha = shift + b - a;
        let alpha = DualVar::from_fp(&alpha, COMPARISON_BITS + 1)?;

        // The top bit is set iff b >= a
        let leq = alpha.bits[COMPARISON_BITS].clone();

        // Strict inequality additionally requires a nonzero difference
        let low_bits = Boolean::le_bits_to_fp_var(&alpha.bits[..COMPARISON_BITS])?;
        let nonzero = low_bits.is_neq(&FpVar::zero())?;
        let lt = leq.and(&nonzero)?;

        Ok((lt, leq))
    }

    /// Assert `a <= b`
    pub fn constrain_leq<F: PrimeField>(
        a: &FpVar<F>,
        b: &FpVar<F>,
    ) -> Result<(), SynthesisError> {
        let (_lt, leq) = Self::leq(a, b)?;
        leq.enforce_equal(&Boolean::constant(true))
    }
}

#[cfg(test)]
mod comparators_tests {
    use ark_r1cs_std::{alloc::AllocVar, fields::fp::FpVar, R1CSVar};
    use ark_relations::r1cs::{ConstraintSystem, ConstraintSystemRef};
    use constants::ScalarField;

    use super::LeqGadget;

    /// Allocate a pair of witnesses in a fresh system
    fn alloc_pair(a: u128, b: u128) -> (ConstraintSystemRef<ScalarField>, FpVar<ScalarField>, FpVar<ScalarField>) {
        let cs = ConstraintSystem::<ScalarField>::new_ref();
        let a = FpVar::new_witness(cs.clone(), || Ok(ScalarField::from(a))).unwrap();
        let b = FpVar::new_witness(cs.clone(), || Ok(ScalarField::from(b))).unwrap();

        (cs, a, b)
    }

    /// The comparison wires take the expected values on ordered inputs
    #[test]
    fn test_leq_wires() {
        let (cs, a, b) = alloc_pair(5, 10);
        let (lt, leq) = LeqGadget::leq(&a, &b).unwrap();

        assert!(lt.value().unwrap());
        assert!(leq.value().unwrap());
        assert!(cs.is_satisfied().unwrap());
    }

    /// Equal inputs satisfy leq but not lt
    #[test]
    fn test_leq_equal() {
        let (cs, a, b) = alloc_pair(7, 7);
        let (lt, leq) = LeqGadget::leq(&a, &b).unwrap();

        assert!(!lt.value().unwrap());
        assert!(leq.value().unwrap());
        assert!(cs.is_satisfied().unwrap());
    }

    /// The assertion form rejects descending inputs
    #[test]
    fn test_constrain_leq() {
        let (cs, a, b) = alloc_pair(3, 1 << 90);
        LeqGadget::constrain_leq(&a, &b).unwrap();
        assert!(cs.is_satisfied().unwrap());

        let (cs, a, b) = alloc_pair(1 << 90, 3);
        LeqGadget::constrain_leq(&a, &b).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
