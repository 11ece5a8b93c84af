//! Implementation of the LongsightL permutation used as the Merkle-tree
//! compressor and the signature challenge hash
//!
//! The permutation is Poseidon-style: an x^5 S-box over the system scalar
//! field with 12 full rounds and 5 partial rounds, instantiated at widths 3
//! and 5. Parameters are derived deterministically from fixed seeds so that
//! the native hasher, the circuit gadget and the contract-side verifier
//! agree bit-for-bit

mod parameters;
pub use parameters::*;

use ark_ff::{Field, Zero};
use constants::ScalarField;

/// Compress a fixed-arity list of inputs into a single field element
///
/// The state is seeded as `[iv, inputs...]` and permuted once; the output is
/// the first rate element. Supported arities are 2 (width-3 permutation) and
/// 4 (width-5 permutation)
pub fn compress(iv: ScalarField, inputs: &[ScalarField]) -> ScalarField {
    let params = match inputs.len() {
        2 => &*LONGSIGHT_T3_PARAMS,
        4 => &*LONGSIGHT_T5_PARAMS,
        n => panic!("unsupported compression arity {n}"),
    };

    let mut state = Vec::with_capacity(params.width);
    state.push(iv);
    state.extend_from_slice(inputs);

    permute(params, &mut state);
    state[1]
}

/// Permute a state vector in place under the given parameters
///
/// The round schedule is half the full rounds, then the partial rounds, then
/// the remaining full rounds
pub fn permute(params: &LongsightParams, state: &mut [ScalarField]) {
    assert_eq!(state.len(), params.width, "state width mismatch");

    let half = params.full_rounds / 2;
    for round in 0..half {
        full_round(params, state, round);
    }

    for round in 0..params.partial_rounds {
        partial_round(params, state, half + round);
    }

    for round in 0..half {
        full_round(params, state, half + params.partial_rounds + round);
    }
}

/// Apply a full round: add round constants, S-box every element, mix
fn full_round(params: &LongsightParams, state: &mut [ScalarField], round: usize) {
    add_round_constants(params, state, round);
    for elem in state.iter_mut() {
        *elem = sbox(elem);
    }
    mix(params, state);
}

/// Apply a partial round: add round constants, S-box the first element, mix
fn partial_round(params: &LongsightParams, state: &mut [ScalarField], round: usize) {
    add_round_constants(params, state, round);
    state[0] = sbox(&state[0]);
    mix(params, state);
}

/// Add the round's constants element-wise to the state
fn add_round_constants(params: &LongsightParams, state: &mut [ScalarField], round: usize) {
    for (elem, rc) in state.iter_mut().zip(params.round_constants[round].iter()) {
        *elem += rc;
    }
}

/// The x^5 S-box
fn sbox(x: &ScalarField) -> ScalarField {
    let x2 = x.square();
    let x4 = x2.square();

    x4 * x
}

/// Multiply the state by the MDS matrix
fn mix(params: &LongsightParams, state: &mut [ScalarField]) {
    let mut mixed = vec![ScalarField::zero(); state.len()];
    for (i, mixed_elem) in mixed.iter_mut().enumerate() {
        for (j, state_elem) in state.iter().enumerate() {
            *mixed_elem += params.mds[i][j] * state_elem;
        }
    }

    state.copy_from_slice(&mixed);
}

/// A sponge construction over the width-3 permutation, used for hashing the
/// signature challenge
///
/// Inputs are absorbed into the rate portion of the state; the permutation
/// runs lazily once the rate is full, and once more on the transition to
/// squeezing
pub struct LongsightSponge {
    /// The internal state of the sponge
    state: Vec<ScalarField>,
    /// The next rate index to absorb an input at
    next_index: usize,
    /// Whether the sponge has transitioned to squeezing
    squeezing: bool,
}

/// The number of rate elements in the sponge's state
const SPONGE_RATE: usize = 2;
/// The number of capacity elements in the sponge's state
const SPONGE_CAPACITY: usize = 1;

impl LongsightSponge {
    /// Construct a sponge with the given IV in its capacity slot
    pub fn new(iv: ScalarField) -> Self {
        let mut state = vec![ScalarField::zero(); SPONGE_RATE + SPONGE_CAPACITY];
        state[0] = iv;

        Self {
            state,
            next_index: 0,
            squeezing: false,
        }
    }

    /// Absorb the sequence and squeeze a single output
    pub fn hash(mut self, seq: &[ScalarField]) -> ScalarField {
        self.absorb_batch(seq);
        self.squeeze()
    }

    /// Absorb a single input into the sponge
    pub fn absorb(&mut self, x: &ScalarField) {
        assert!(!self.squeezing, "cannot absorb while squeezing");

        if self.next_index == SPONGE_RATE {
            permute(&LONGSIGHT_T3_PARAMS, &mut self.state);
            self.next_index = 0;
        }

        self.state[SPONGE_CAPACITY + self.next_index] += x;
        self.next_index += 1;
    }

    /// Absorb a batch of inputs
    pub fn absorb_batch(&mut self, xs: &[ScalarField]) {
        xs.iter().for_each(|x| self.absorb(x));
    }

    /// Squeeze a single output from the sponge
    pub fn squeeze(&mut self) -> ScalarField {
        if !self.squeezing {
            permute(&LONGSIGHT_T3_PARAMS, &mut self.state);
            self.squeezing = true;
        }

        self.state[SPONGE_CAPACITY]
    }
}
