//! Helpers for manipulating values within a field and translating between
//! field elements, bit vectors and bigints

use ark_ff::{BigInteger, PrimeField};
use constants::{EmbeddedScalarField, ScalarField};
use num_bigint::BigUint;

// -----------
// | Helpers |
// -----------

/// Convert a scalar to a BigUint
pub fn scalar_to_biguint(a: &ScalarField) -> BigUint {
    (*a).into()
}

/// Convert a BigUint to a scalar, reducing modulo the field order
pub fn biguint_to_scalar(a: &BigUint) -> ScalarField {
    ScalarField::from(a.clone())
}

/// Convert an embedded-curve scalar to a BigUint
pub fn embedded_scalar_to_biguint(a: &EmbeddedScalarField) -> BigUint {
    (*a).into()
}

/// Reduce a scalar of the proof system's field into the embedded curve's
/// scalar field
pub fn scalar_to_embedded(a: &ScalarField) -> EmbeddedScalarField {
    EmbeddedScalarField::from(scalar_to_biguint(a))
}

// --------------------
// | Bit Manipulation |
// --------------------

/// Decompose a scalar into its low `width` bits, little-endian
///
/// Bits above `width` are dropped; range enforcement is the caller's concern
pub fn scalar_to_bits_le(a: &ScalarField, width: usize) -> Vec<bool> {
    let mut bits = a.into_bigint().to_bits_le();
    bits.resize(width, false);

    bits
}

/// Decompose an embedded-curve scalar into its low `width` bits,
/// little-endian
pub fn embedded_scalar_to_bits_le(a: &EmbeddedScalarField, width: usize) -> Vec<bool> {
    let mut bits = a.into_bigint().to_bits_le();
    bits.resize(width, false);

    bits
}

/// Pack a little-endian bit vector into a scalar
pub fn bits_le_to_scalar(bits: &[bool]) -> ScalarField {
    let mut value = BigUint::default();
    for bit in bits.iter().rev() {
        value <<= 1;
        if *bit {
            value += 1u8;
        }
    }

    biguint_to_scalar(&value)
}

/// Pack a little-endian bit vector into fixed-size field chunks
///
/// Each chunk packs up to `chunk_bits` consecutive bits little-endian; the
/// final chunk may be shorter
pub fn bits_le_to_chunks(bits: &[bool], chunk_bits: usize) -> Vec<ScalarField> {
    bits.chunks(chunk_bits).map(bits_le_to_scalar).collect()
}

/// Collect a most-significant-bit-first bit stream into bytes
///
/// The stream length must be a multiple of eight; the first bit of the
/// stream becomes the high bit of the first byte
pub fn bits_msb_to_bytes(bits: &[bool]) -> Vec<u8> {
    assert!(bits.len() % 8 == 0, "bit stream is not byte aligned");

    bits.chunks(8)
        .map(|byte_bits| {
            byte_bits
                .iter()
                .fold(0u8, |acc, bit| (acc << 1) | (*bit as u8))
        })
        .collect()
}

// -------------------------
// | Serde Helper Modules |
// -------------------------

/// A serde module serializing a scalar as a decimal string
pub mod ser_scalar {
    use constants::ScalarField;
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{biguint_to_scalar, scalar_to_biguint};

    /// Serialize a scalar as its decimal representation
    pub fn serialize<S: Serializer>(val: &ScalarField, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&scalar_to_biguint(val).to_string())
    }

    /// Deserialize a scalar from its decimal representation
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<ScalarField, D::Error> {
        let decimal = String::deserialize(d)?;
        let val = decimal
            .parse::<BigUint>()
            .map_err(serde::de::Error::custom)?;

        Ok(biguint_to_scalar(&val))
    }
}

/// A serde module serializing an embedded-curve scalar as a decimal string
pub mod ser_embedded_scalar {
    use constants::EmbeddedScalarField;
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::embedded_scalar_to_biguint;

    /// Serialize an embedded scalar as its decimal representation
    pub fn serialize<S: Serializer>(val: &EmbeddedScalarField, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&embedded_scalar_to_biguint(val).to_string())
    }

    /// Deserialize an embedded scalar from its decimal representation
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<EmbeddedScalarField, D::Error> {
        let decimal = String::deserialize(d)?;
        let val = decimal
            .parse::<BigUint>()
            .map_err(serde::de::Error::custom)?;

        Ok(EmbeddedScalarField::from(val))
    }
}
