//! Defines system-wide constants for the ring-settlement proof system

#![deny(unsafe_code)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(missing_docs)]

use ark_ec::Group;

// ------------------------------------
// | System Specific Type Definitions |
// ------------------------------------

/// The curve that our proof system operates over
pub type SystemCurve = ark_bn254::Bn254;

/// The curve group that our proof system operates over
pub type SystemCurveGroup = ark_bn254::G1Projective;

/// The scalar field the proof system is defined over; all witness values
/// live in this field
pub type ScalarField = <ark_bn254::G1Projective as Group>::ScalarField;

/// The curve used for signatures, embedded in the scalar field of the
/// system curve
pub type EmbeddedCurveConfig = ark_ed_on_bn254::EdwardsConfig;

/// The affine representation of a point on the embedded curve
pub type EmbeddedCurveAffine = ark_ed_on_bn254::EdwardsAffine;

/// The projective representation of a point on the embedded curve
pub type EmbeddedCurveProjective = ark_ed_on_bn254::EdwardsProjective;

/// The scalar field of the embedded curve's prime-order subgroup
pub type EmbeddedScalarField = ark_ed_on_bn254::Fr;

// -------------------------
// | System-Wide Constants |
// -------------------------

/// The depth of the trading-history tree; leaves are addressed by the
/// concatenation of an order ID and the order's sell account index
pub const TREE_DEPTH_FILLED: usize = ORDER_ID_BITS + ACCOUNT_BITS;

/// The depth of the accounts tree; leaves are addressed by a bare account
/// index
pub const TREE_DEPTH_ACCOUNTS: usize = ACCOUNT_BITS;

/// The bit-width of a dex identifier
pub const DEX_ID_BITS: usize = 16;

/// The bit-width of an order identifier, i.e. the index of the order in the
/// owner's slice of the trading-history tree
pub const ORDER_ID_BITS: usize = 4;

/// The bit-width of an accounts-tree index
pub const ACCOUNT_BITS: usize = 24;

/// The bit-width of all token amounts: order amounts, fills and balances
pub const AMOUNT_BITS: usize = 96;

/// The operand width of the comparison gadget
pub const COMPARISON_BITS: usize = 128;

/// The number of bits used to witness an EdDSA `s` scalar; the size of the
/// embedded curve's scalar field
pub const EMBEDDED_SCALAR_BITS: usize = 251;

/// The bit-width of the Merkle roots and the public-data digest as they
/// appear in the public-data stream
pub const ROOT_BITS: usize = 256;

/// The number of message bits packed into one field element when hashing a
/// signed order message
pub const MESSAGE_CHUNK_BITS: usize = 240;

/// The total bit-length of the canonical order signing message:
/// `dex_id ∥ order_id ∥ account_s ∥ account_b ∥ account_f ∥ amount_s ∥
/// amount_b ∥ amount_f ∥ wallet_f`
pub const ORDER_MESSAGE_BITS: usize =
    DEX_ID_BITS + ORDER_ID_BITS + 3 * ACCOUNT_BITS + 3 * AMOUNT_BITS + ACCOUNT_BITS;

/// The bit-length of the public transfer record one order contributes to the
/// public-data stream
pub const ORDER_RECORD_BITS: usize =
    DEX_ID_BITS + ORDER_ID_BITS + 2 * ACCOUNT_BITS + AMOUNT_BITS + ACCOUNT_BITS + AMOUNT_BITS;

// --------------------------
// | Hash Derivation Seeds |
// --------------------------

/// The derivation seed for the width-3 permutation's round constants
pub const LONGSIGHT_T3_SEED: &str = "LongsightL-t3-12f-5p";

/// The derivation seed for the width-5 permutation's round constants
pub const LONGSIGHT_T5_SEED: &str = "LongsightL-t5-12f-5p";

/// The derivation seed for the per-level Merkle tree IVs
pub const MERKLE_IV_SEED: &str = "SettlementMerkleTree";

/// The derivation seed for the signature challenge sponge IV
pub const SIGNATURE_IV_SEED: &str = "SettlementSignature";
