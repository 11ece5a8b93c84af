//! Arithmetic gadgets over balances

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::SynthesisError;
use constants::AMOUNT_BITS;

use super::bits::DualVar;

/// An atomic transfer: subtract a delta from one balance and add it to
/// another
///
/// Both results are decomposed to [`AMOUNT_BITS`] bits, which implicitly
/// asserts the source covers the delta; an underflow wraps into a huge field
/// value that cannot repack
#[derive(Clone, Debug)]
pub struct SubAddGadget;

impl SubAddGadget {
    /// Apply the transfer, returning the wires `(from - delta, to + delta)`
    pub fn sub_add<F: PrimeField>(
        from: &FpVar<F>,
        to: &FpVar<F>,
        delta: &FpVar<F>,
    ) -> Result<(FpVar<F>, FpVar<F>), SynthesisError> {
        let new_from = from - delta;
        let new_to = to + delta;

        let new_from = DualVar::from_fp(&new_from, AMOUNT_BITS)?.packed;
        let new_to = DualVar::from_fp(&new_to, AMOUNT_BITS)?.packed;

        Ok((new_from, new_to))
    }
}

#[cfg(test)]
mod arithmetic_tests {
    use ark_r1cs_std::{alloc::AllocVar, fields::fp::FpVar, R1CSVar};
    use ark_relations::r1cs::ConstraintSystem;
    use constants::ScalarField;

    use super::SubAddGadget;

    /// A covered transfer satisfies the system and moves the delta
    #[test]
    fn test_transfer() {
        let cs = ConstraintSystem::<ScalarField>::new_ref();
        let from = FpVar::new_witness(cs.clone(), || Ok(ScalarField::from(100u64))).unwrap();
        let to = FpVar::new_witness(cs.clone(), || Ok(ScalarField::from(7u64))).unwrap();
        let delta = FpVar::new_witness(cs.clone(), || Ok(ScalarField::from(40u64))).unwrap();

        let (new_from, new_to) = SubAddGadget::sub_add(&from, &to, &delta).unwrap();
        assert_eq!(new_from.value().unwrap(), ScalarField::from(60u64));
        assert_eq!(new_to.value().unwrap(), ScalarField::from(47u64));
        assert!(cs.is_satisfied().unwrap());
    }

    /// An uncovered transfer leaves the system unsatisfiable
    #[test]
    fn test_underflow() {
        let cs = ConstraintSystem::<ScalarField>::new_ref();
        let from = FpVar::new_witness(cs.clone(), || Ok(ScalarField::from(39u64))).unwrap();
        let to = FpVar::new_witness(cs.clone(), || Ok(ScalarField::from(0u64))).unwrap();
        let delta = FpVar::new_witness(cs.clone(), || Ok(ScalarField::from(40u64))).unwrap();

        SubAddGadget::sub_add(&from, &to, &delta).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
