//! Groups error types for witness generation and validation
//!
//! A constraint system either is or is not satisfied; these errors exist to
//! name the first failing check while the witness is being assembled, before
//! a prover is ever invoked

use std::fmt::{Display, Formatter, Result};

/// An error encountered while building or validating a settlement witness
///
/// Every variant corresponds to a family of circuit constraints that the
/// offending witness would leave unsatisfied
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettlementError {
    /// A witness value does not fit in its declared bit-width
    RangeViolation(String),
    /// An order's EdDSA signature does not verify
    SignatureInvalid(String),
    /// A leaf's recomputed pre-root differs from the supplied root
    MerkleMismatch(String),
    /// A balance transfer would underflow its source
    ArithmeticOverflow(String),
    /// A fill violates the order's rate cross-product invariant
    RateMismatch(String),
    /// A match-feasibility or fill-cap bound does not hold
    MatchInfeasible(String),
    /// A computed post-root does not equal the declared next root
    RootDiscontinuity(String),
    /// The public-data digest disagrees with the declared public input
    HashMismatch(String),
}

impl Display for SettlementError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            SettlementError::RangeViolation(msg) => write!(f, "range violation: {msg}"),
            SettlementError::SignatureInvalid(msg) => write!(f, "signature invalid: {msg}"),
            SettlementError::MerkleMismatch(msg) => write!(f, "merkle mismatch: {msg}"),
            SettlementError::ArithmeticOverflow(msg) => write!(f, "arithmetic overflow: {msg}"),
            SettlementError::RateMismatch(msg) => write!(f, "rate mismatch: {msg}"),
            SettlementError::MatchInfeasible(msg) => write!(f, "match infeasible: {msg}"),
            SettlementError::RootDiscontinuity(msg) => write!(f, "root discontinuity: {msg}"),
            SettlementError::HashMismatch(msg) => write!(f, "hash mismatch: {msg}"),
        }
    }
}
