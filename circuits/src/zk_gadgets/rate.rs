//! The rate checker: fills must respect the order's quoted exchange rate

use ark_ff::PrimeField;
use ark_r1cs_std::fields::{fp::FpVar, FieldVar};
use ark_relations::r1cs::SynthesisError;

/// Enforces `fill_s / fill_b = amount_s / amount_b` without division, via a
/// shared cross-product wire:
///
///   `amount_s · fill_b = invariant`
///   `amount_b · fill_s = invariant`
///
/// All operands are 96-bit, so the products stay far below the field order
#[derive(Clone, Debug)]
pub struct RateCheckerGadget;

impl RateCheckerGadget {
    /// Constrain the fill pair to the order's rate
    pub fn check_rate<F: PrimeField>(
        fill_s: &FpVar<F>,
        fill_b: &FpVar<F>,
        amount_s: &FpVar<F>,
        amount_b: &FpVar<F>,
    ) -> Result<(), SynthesisError> {
        let invariant = amount_s * fill_b;
        amount_b.mul_equals(fill_s, &invariant)
    }
}

#[cfg(test)]
mod rate_tests {
    use ark_r1cs_std::{alloc::AllocVar, fields::fp::FpVar};
    use ark_relations::r1cs::{ConstraintSystem, ConstraintSystemRef};
    use constants::ScalarField;

    use super::RateCheckerGadget;

    /// Allocate the four operands and apply the gadget
    fn check(fill_s: u64, fill_b: u64, amount_s: u64, amount_b: u64) -> ConstraintSystemRef<ScalarField> {
        let cs = ConstraintSystem::<ScalarField>::new_ref();
        let vars: Vec<FpVar<ScalarField>> = [fill_s, fill_b, amount_s, amount_b]
            .into_iter()
            .map(|v| FpVar::new_witness(cs.clone(), || Ok(ScalarField::from(v))).unwrap())
            .collect();

        RateCheckerGadget::check_rate(&vars[0], &vars[1], &vars[2], &vars[3]).unwrap();
        cs
    }

    /// Proportional fills satisfy the invariant, including partial fills
    #[test]
    fn test_rate_holds() {
        assert!(check(1000, 2000, 1000, 2000).is_satisfied().unwrap());
        assert!(check(500, 1000, 1000, 2000).is_satisfied().unwrap());
        assert!(check(0, 0, 1000, 2000).is_satisfied().unwrap());
    }

    /// A price deviation of one unit breaks the invariant
    #[test]
    fn test_rate_violated() {
        assert!(!check(500, 999, 1000, 2000).is_satisfied().unwrap());
        assert!(!check(500, 1001, 1000, 2000).is_satisfied().unwrap());
    }
}
