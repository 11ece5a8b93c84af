//! Defines the native types exchanged with the settlement circuit: orders,
//! rings, per-ring witness data and whole-batch witnesses, together with the
//! public-data commitment they are bound to

#![deny(unsafe_code)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(missing_docs)]

pub mod errors;
pub mod keychain;
pub mod order;
pub mod ring;
pub mod settlement;
pub mod transfers;

/// Decompose an unsigned integer into its low `width` bits, little-endian
pub fn int_to_bits_le(value: u128, width: usize) -> Vec<bool> {
    (0..width).map(|i| (value >> i) & 1 == 1).collect()
}

/// A serde module serializing a 96-bit amount as a decimal string
pub mod ser_amount {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize an amount as its decimal representation
    pub fn serialize<S: Serializer>(val: &u128, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&val.to_string())
    }

    /// Deserialize an amount from its decimal representation
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
        let decimal = String::deserialize(d)?;
        decimal.parse::<u128>().map_err(serde::de::Error::custom)
    }
}

/// A serde module serializing a Merkle path as a list of decimal strings
pub mod ser_scalar_vec {
    use constants::ScalarField;
    use num_bigint::BigUint;
    use serde::{ser::SerializeSeq, Deserialize, Deserializer, Serializer};
    use settlement_crypto::fields::{biguint_to_scalar, scalar_to_biguint};

    /// Serialize a list of scalars as decimal strings
    pub fn serialize<S: Serializer>(val: &[ScalarField], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(val.len()))?;
        for elem in val {
            seq.serialize_element(&scalar_to_biguint(elem).to_string())?;
        }
        seq.end()
    }

    /// Deserialize a list of scalars from decimal strings
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<ScalarField>, D::Error> {
        let decimals = Vec::<String>::deserialize(d)?;
        decimals
            .into_iter()
            .map(|decimal| {
                decimal
                    .parse::<BigUint>()
                    .map(|val| biguint_to_scalar(&val))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}
