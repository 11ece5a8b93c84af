//! Native EdDSA over the embedded curve
//!
//! Signatures follow the pure-EdDSA shape: the challenge is a LongsightL
//! sponge over `(R, A, M)` with the message packed into field chunks, and
//! verification checks `s·B = R + h·A` against the fixed base point

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{BigInteger, PrimeField, UniformRand, Zero};
use constants::{
    EmbeddedCurveAffine, EmbeddedCurveProjective, EmbeddedScalarField, ScalarField,
    MESSAGE_CHUNK_BITS,
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    fields::{bits_le_to_chunks, bits_msb_to_bytes, scalar_to_embedded, ser_embedded_scalar,
        ser_scalar},
    hash::{LongsightSponge, SIGNATURE_IV},
};

// ----------
// | Points |
// ----------

/// The affine representation of a point on the embedded curve
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// The x coordinate of the point
    #[serde(with = "ser_scalar")]
    pub x: ScalarField,
    /// The y coordinate of the point
    #[serde(with = "ser_scalar")]
    pub y: ScalarField,
}

impl Point {
    /// The additive identity of the curve
    pub fn identity() -> Self {
        Point::from(EmbeddedCurveProjective::zero())
    }

    /// Check that the point is on the curve
    pub fn is_on_curve(&self) -> bool {
        EmbeddedCurveAffine::new_unchecked(self.x, self.y).is_on_curve()
    }

    /// View the point as an arkworks affine point
    pub fn to_affine(self) -> EmbeddedCurveAffine {
        EmbeddedCurveAffine::new_unchecked(self.x, self.y)
    }
}

impl From<EmbeddedCurveProjective> for Point {
    fn from(value: EmbeddedCurveProjective) -> Self {
        let affine = value.into_affine();
        Point {
            x: affine.x,
            y: affine.y,
        }
    }
}

/// The base point signatures are verified against
pub fn base_point() -> EmbeddedCurveAffine {
    EmbeddedCurveAffine::generator()
}

// --------------
// | Signatures |
// --------------

/// An EdDSA signature
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// The commitment point `R = k·B`
    pub r: Point,
    /// The response scalar `s = k + h·sk`
    #[serde(with = "ser_embedded_scalar")]
    pub s: EmbeddedScalarField,
}

/// An EdDSA keypair
#[derive(Copy, Clone, Debug)]
pub struct Keypair {
    /// The secret scalar
    sk: EmbeddedScalarField,
    /// The public key `A = sk·B`
    pub pk: Point,
}

impl Keypair {
    /// Sample a fresh keypair
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let sk = EmbeddedScalarField::rand(rng);
        let pk = Point::from(base_point() * sk);

        Self { sk, pk }
    }

    /// Sign a little-endian message bit vector
    pub fn sign(&self, msg_bits: &[bool]) -> Signature {
        let k = self.nonce(msg_bits);
        let r = Point::from(base_point() * k);

        let h = challenge(&r, &self.pk, msg_bits);
        let s = k + scalar_to_embedded(&h) * self.sk;

        Signature { r, s }
    }

    /// Derive the deterministic per-message nonce
    fn nonce(&self, msg_bits: &[bool]) -> EmbeddedScalarField {
        let mut padded = msg_bits.to_vec();
        while padded.len() % 8 != 0 {
            padded.push(false);
        }

        let mut hasher = Sha256::new();
        hasher.update(self.sk.into_bigint().to_bytes_be());
        hasher.update(bits_msb_to_bytes(&padded));

        EmbeddedScalarField::from_be_bytes_mod_order(&hasher.finalize())
    }
}

/// Compute the signature challenge `h = H(R.x, R.y, A.x, A.y, m_0, m_1, ...)`
///
/// The message bits pack little-endian into fixed-width chunks; the sponge
/// is seeded with the signature-domain IV
pub fn challenge(r: &Point, pk: &Point, msg_bits: &[bool]) -> ScalarField {
    let mut inputs = vec![r.x, r.y, pk.x, pk.y];
    inputs.extend(bits_le_to_chunks(msg_bits, MESSAGE_CHUNK_BITS));

    LongsightSponge::new(*SIGNATURE_IV).hash(&inputs)
}

/// Verify a signature over a message bit vector
pub fn verify(pk: &Point, msg_bits: &[bool], sig: &Signature) -> bool {
    if !pk.is_on_curve() || !sig.r.is_on_curve() {
        return false;
    }

    let h = scalar_to_embedded(&challenge(&sig.r, pk, msg_bits));
    let lhs = base_point() * sig.s;
    let rhs = EmbeddedCurveProjective::from(sig.r.to_affine()) + pk.to_affine() * h;

    lhs == rhs
}

#[cfg(test)]
mod eddsa_tests {
    use rand::thread_rng;

    use super::{verify, Keypair};

    /// A fixed test message
    fn test_message() -> Vec<bool> {
        (0..404).map(|i| i % 3 == 0).collect()
    }

    /// Signatures round-trip through verification
    #[test]
    fn test_sign_verify() {
        let mut rng = thread_rng();
        let keypair = Keypair::random(&mut rng);

        let msg = test_message();
        let sig = keypair.sign(&msg);
        assert!(verify(&keypair.pk, &msg, &sig));
    }

    /// A modified message breaks the signature
    #[test]
    fn test_modified_message() {
        let mut rng = thread_rng();
        let keypair = Keypair::random(&mut rng);

        let msg = test_message();
        let sig = keypair.sign(&msg);

        let mut tampered = msg;
        tampered[0] = !tampered[0];
        assert!(!verify(&keypair.pk, &tampered, &sig));
    }

    /// A signature does not verify under a different key
    #[test]
    fn test_wrong_key() {
        let mut rng = thread_rng();
        let keypair = Keypair::random(&mut rng);
        let other = Keypair::random(&mut rng);

        let msg = test_message();
        let sig = keypair.sign(&msg);
        assert!(!verify(&other.pk, &msg, &sig));
    }
}
