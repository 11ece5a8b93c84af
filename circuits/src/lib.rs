//! The ring-settlement circuit and the gadgets it is composed from
//!
//! Constraint generation and witness assignment happen in a single pass over
//! the gadget tree: allocating a variable assigns it, and every constraint
//! is appended to the shared `ConstraintSystemRef`. The builder is owned by
//! the circuit top; gadgets borrow it through the variables they operate on

#![deny(unsafe_code)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(missing_docs)]

pub mod zk_circuits;
pub mod zk_gadgets;

use ark_ff::PrimeField;
use num_bigint::BigUint;

/// Represents `2^m` as a field element
pub(crate) fn scalar_2_to_m<F: PrimeField>(m: usize) -> F {
    F::from(BigUint::from(1u8) << m)
}
