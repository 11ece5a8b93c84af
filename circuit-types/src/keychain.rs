//! Key types for the accounts tree
//!
//! Accounts are keyed by an EdDSA public key on the embedded curve; the
//! native scheme lives in `settlement-crypto` and is re-exported here so
//! witness types can name it directly

pub use settlement_crypto::eddsa::{base_point, verify, Keypair, Point, Signature};

/// A public key binding an account leaf to its owner
pub type PublicKey = Point;
