//! The in-circuit LongsightL permutation
//!
//! Mirrors the native implementation round for round; both sides read the
//! same parameter tables, so a native hash and its gadget counterpart agree
//! on every input

use ark_r1cs_std::fields::{fp::FpVar, FieldVar};
use ark_relations::r1cs::SynthesisError;
use constants::ScalarField;
use settlement_crypto::hash::{
    LongsightParams, LONGSIGHT_T3_PARAMS, LONGSIGHT_T5_PARAMS, SIGNATURE_IV,
};

/// The fixed-arity compression gadget
#[derive(Clone, Debug)]
pub struct LongsightGadget;

impl LongsightGadget {
    /// Compress a fixed-arity input list under the given IV; the circuit
    /// analog of the native `compress`
    pub fn compress(
        iv: ScalarField,
        inputs: &[FpVar<ScalarField>],
    ) -> Result<FpVar<ScalarField>, SynthesisError> {
        let params = match inputs.len() {
            2 => &*LONGSIGHT_T3_PARAMS,
            4 => &*LONGSIGHT_T5_PARAMS,
            n => panic!("unsupported compression arity {n}"),
        };

        let mut state = Vec::with_capacity(params.width);
        state.push(FpVar::constant(iv));
        state.extend_from_slice(inputs);

        Self::permute(params, &mut state)?;
        Ok(state[1].clone())
    }

    /// Permute a state of wires in place
    pub fn permute(
        params: &LongsightParams,
        state: &mut [FpVar<ScalarField>],
    ) -> Result<(), SynthesisError> {
        assert_eq!(state.len(), params.width, "state width mismatch");

        let half = params.full_rounds / 2;
        for round in 0..half {
            Self::full_round(params, state, round)?;
        }

        for round in 0..params.partial_rounds {
            Self::partial_round(params, state, half + round)?;
        }

        for round in 0..half {
            Self::full_round(params, state, half + params.partial_rounds + round)?;
        }

        Ok(())
    }

    /// A full round: constants, S-box everywhere, mix
    fn full_round(
        params: &LongsightParams,
        state: &mut [FpVar<ScalarField>],
        round: usize,
    ) -> Result<(), SynthesisError> {
        Self::add_round_constants(params, state, round);
        for elem in state.iter_mut() {
            *elem = Self::sbox(elem)?;
        }
        Self::mix(params, state);

        Ok(())
    }

    /// A partial round: constants, S-box on the first element only, mix
    fn partial_round(
        params: &LongsightParams,
        state: &mut [FpVar<ScalarField>],
        round: usize,
    ) -> Result<(), SynthesisError> {
        Self::add_round_constants(params, state, round);
        state[0] = Self::sbox(&state[0])?;
        Self::mix(params, state);

        Ok(())
    }

    /// Add the round's constants element-wise
    fn add_round_constants(
        params: &LongsightParams,
        state: &mut [FpVar<ScalarField>],
        round: usize,
    ) {
        for (elem, rc) in state.iter_mut().zip(params.round_constants[round].iter()) {
            *elem += FpVar::constant(*rc);
        }
    }

    /// The x^5 S-box
    fn sbox(x: &FpVar<ScalarField>) -> Result<FpVar<ScalarField>, SynthesisError> {
        let x2 = x.square()?;
        let x4 = x2.square()?;

        Ok(x4 * x)
    }

    /// Multiply the state by the MDS matrix; constant coefficients keep this
    /// constraint-free
    fn mix(params: &LongsightParams, state: &mut [FpVar<ScalarField>]) {
        let mixed: Vec<FpVar<ScalarField>> = (0..state.len())
            .map(|i| {
                state
                    .iter()
                    .enumerate()
                    .map(|(j, elem)| elem * FpVar::constant(params.mds[i][j]))
                    .fold(FpVar::zero(), |acc, term| acc + term)
            })
            .collect();

        state.clone_from_slice(&mixed);
    }
}

/// The in-circuit analog of the native challenge sponge
#[derive(Clone, Debug)]
pub struct LongsightSpongeGadget {
    /// The sponge state wires
    state: Vec<FpVar<ScalarField>>,
    /// The next rate index to absorb at
    next_index: usize,
}

/// The number of rate elements in the sponge state
const SPONGE_RATE: usize = 2;
/// The number of capacity elements in the sponge state
const SPONGE_CAPACITY: usize = 1;

impl LongsightSpongeGadget {
    /// Construct a sponge seeded with the signature-domain IV
    pub fn new() -> Self {
        let mut state = vec![FpVar::zero(); SPONGE_RATE + SPONGE_CAPACITY];
        state[0] = FpVar::constant(*SIGNATURE_IV);

        Self {
            state,
            next_index: 0,
        }
    }

    /// Absorb a sequence and squeeze a single output
    pub fn hash(
        mut self,
        seq: &[FpVar<ScalarField>],
    ) -> Result<FpVar<ScalarField>, SynthesisError> {
        for input in seq {
            self.absorb(input)?;
        }
        self.squeeze()
    }

    /// Absorb a single wire into the sponge
    fn absorb(&mut self, x: &FpVar<ScalarField>) -> Result<(), SynthesisError> {
        if self.next_index == SPONGE_RATE {
            LongsightGadget::permute(&LONGSIGHT_T3_PARAMS, &mut self.state)?;
            self.next_index = 0;
        }

        let entry = SPONGE_CAPACITY + self.next_index;
        self.state[entry] = &self.state[entry] + x;
        self.next_index += 1;

        Ok(())
    }

    /// Squeeze a single output from the sponge
    fn squeeze(&mut self) -> Result<FpVar<ScalarField>, SynthesisError> {
        LongsightGadget::permute(&LONGSIGHT_T3_PARAMS, &mut self.state)?;
        Ok(self.state[SPONGE_CAPACITY].clone())
    }
}

impl Default for LongsightSpongeGadget {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod longsight_tests {
    use ark_r1cs_std::{alloc::AllocVar, fields::fp::FpVar, R1CSVar};
    use ark_relations::r1cs::ConstraintSystem;
    use constants::ScalarField;
    use settlement_crypto::hash::{compress, LongsightSponge, MERKLE_TREE_IVS, SIGNATURE_IV};

    use super::{LongsightGadget, LongsightSpongeGadget};

    /// The gadget agrees with the native compressor at both arities
    #[test]
    fn test_gadget_matches_native() {
        let cs = ConstraintSystem::<ScalarField>::new_ref();
        let inputs: Vec<ScalarField> = (1u64..5).map(ScalarField::from).collect();
        let vars: Vec<FpVar<ScalarField>> = inputs
            .iter()
            .map(|v| FpVar::new_witness(cs.clone(), || Ok(*v)).unwrap())
            .collect();
        let iv = MERKLE_TREE_IVS[3];

        let two = LongsightGadget::compress(iv, &vars[..2]).unwrap();
        assert_eq!(two.value().unwrap(), compress(iv, &inputs[..2]));

        let four = LongsightGadget::compress(iv, &vars).unwrap();
        assert_eq!(four.value().unwrap(), compress(iv, &inputs));

        assert!(cs.is_satisfied().unwrap());
    }

    /// The sponge gadget agrees with the native sponge on an odd-length
    /// absorb schedule
    #[test]
    fn test_sponge_matches_native() {
        let cs = ConstraintSystem::<ScalarField>::new_ref();
        let inputs: Vec<ScalarField> = (10u64..16).map(ScalarField::from).collect();
        let vars: Vec<FpVar<ScalarField>> = inputs
            .iter()
            .map(|v| FpVar::new_witness(cs.clone(), || Ok(*v)).unwrap())
            .collect();

        let expected = LongsightSponge::new(*SIGNATURE_IV).hash(&inputs);
        let squeezed = LongsightSpongeGadget::new().hash(&vars).unwrap();

        assert_eq!(squeezed.value().unwrap(), expected);
        assert!(cs.is_satisfied().unwrap());
    }
}
