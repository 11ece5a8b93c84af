//! The order gadget: witness an order's fields, rebuild its signing message
//! from the bit wires and verify the owner's signature
//!
//! Membership of the public key in the accounts tree is not checked here;
//! the balance updates downstream re-hash the key into every touched leaf,
//! which binds it to the pre-root

use ark_ed_on_bn254::constraints::EdwardsVar;
use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::{alloc::AllocVar, boolean::Boolean, fields::fp::FpVar};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use circuit_types::order::Order;
use constants::{
    EmbeddedCurveProjective, ScalarField, ACCOUNT_BITS, AMOUNT_BITS, DEX_ID_BITS,
    EMBEDDED_SCALAR_BITS, ORDER_ID_BITS, ORDER_MESSAGE_BITS,
};
use settlement_crypto::eddsa::Point;

use crate::zk_gadgets::{bits::DualVar, eddsa::EdDSAGadget};

/// An order allocated in the constraint system
///
/// Packed fields carry their bit decompositions, which double as the order's
/// range checks and as the raw material of the signing message and the
/// public-data records
#[derive(Clone, Debug)]
pub struct OrderVar {
    /// The dex identifier
    pub dex_id: DualVar<ScalarField>,
    /// The order's trading-history index
    pub order_id: DualVar<ScalarField>,
    /// The sell-account index
    pub account_s: DualVar<ScalarField>,
    /// The buy-account index
    pub account_b: DualVar<ScalarField>,
    /// The fee-account index
    pub account_f: DualVar<ScalarField>,
    /// The fee-wallet index
    pub wallet_f: DualVar<ScalarField>,
    /// The sell amount
    pub amount_s: DualVar<ScalarField>,
    /// The buy amount
    pub amount_b: DualVar<ScalarField>,
    /// The fee amount
    pub amount_f: DualVar<ScalarField>,
    /// The sold token
    pub token_s: FpVar<ScalarField>,
    /// The bought token
    pub token_b: FpVar<ScalarField>,
    /// The fee token
    pub token_f: FpVar<ScalarField>,
    /// The owner's public key
    pub public_key: EdwardsVar,
    /// The signature's commitment point
    pub sig_r: EdwardsVar,
    /// The signature's response scalar, bitwise
    pub sig_s_bits: Vec<Boolean<ScalarField>>,
}

impl OrderVar {
    /// Witness an order in the constraint system
    pub fn new_witness(
        cs: ConstraintSystemRef<ScalarField>,
        order: &Order,
    ) -> Result<Self, SynthesisError> {
        let dual = |value: u128, width: usize| {
            DualVar::new_witness(cs.clone(), &ScalarField::from(value), width)
        };

        let dex_id = dual(order.dex_id as u128, DEX_ID_BITS)?;
        let order_id = dual(order.order_id as u128, ORDER_ID_BITS)?;
        let account_s = dual(order.account_s as u128, ACCOUNT_BITS)?;
        let account_b = dual(order.account_b as u128, ACCOUNT_BITS)?;
        let account_f = dual(order.account_f as u128, ACCOUNT_BITS)?;
        let wallet_f = dual(order.wallet_f as u128, ACCOUNT_BITS)?;
        let amount_s = dual(order.amount_s, AMOUNT_BITS)?;
        let amount_b = dual(order.amount_b, AMOUNT_BITS)?;
        let amount_f = dual(order.amount_f, AMOUNT_BITS)?;

        let token_s = FpVar::new_witness(cs.clone(), || Ok(order.token_s))?;
        let token_b = FpVar::new_witness(cs.clone(), || Ok(order.token_b))?;
        let token_f = FpVar::new_witness(cs.clone(), || Ok(order.token_f))?;

        let public_key = alloc_point(cs.clone(), &order.public_key)?;
        let sig_r = alloc_point(cs.clone(), &order.signature.r)?;

        let mut s_bits = order.signature.s.into_bigint().to_bits_le();
        s_bits.resize(EMBEDDED_SCALAR_BITS, false);
        let sig_s_bits = s_bits
            .into_iter()
            .map(|bit| Boolean::new_witness(cs.clone(), || Ok(bit)))
            .collect::<Result<Vec<_>, SynthesisError>>()?;

        Ok(Self {
            dex_id,
            order_id,
            account_s,
            account_b,
            account_f,
            wallet_f,
            amount_s,
            amount_b,
            amount_f,
            token_s,
            token_b,
            token_f,
            public_key,
            sig_r,
            sig_s_bits,
        })
    }

    /// The canonical signing message, rebuilt from the order's own bit wires
    /// in the same fixed order the native side packs it
    pub fn message_bits(&self) -> Vec<Boolean<ScalarField>> {
        let mut bits = Vec::with_capacity(ORDER_MESSAGE_BITS);
        bits.extend_from_slice(&self.dex_id.bits);
        bits.extend_from_slice(&self.order_id.bits);
        bits.extend_from_slice(&self.account_s.bits);
        bits.extend_from_slice(&self.account_b.bits);
        bits.extend_from_slice(&self.account_f.bits);
        bits.extend_from_slice(&self.amount_s.bits);
        bits.extend_from_slice(&self.amount_b.bits);
        bits.extend_from_slice(&self.amount_f.bits);
        bits.extend_from_slice(&self.wallet_f.bits);

        bits
    }

    /// The trading-history address of the order: order ID bits, then the
    /// sell-account bits
    pub fn history_address_bits(&self) -> Vec<Boolean<ScalarField>> {
        let mut bits = Vec::with_capacity(ORDER_ID_BITS + ACCOUNT_BITS);
        bits.extend_from_slice(&self.order_id.bits);
        bits.extend_from_slice(&self.account_s.bits);

        bits
    }
}

/// Witness a native curve point
pub(crate) fn alloc_point(
    cs: ConstraintSystemRef<ScalarField>,
    point: &Point,
) -> Result<EdwardsVar, SynthesisError> {
    EdwardsVar::new_witness(cs, || Ok(EmbeddedCurveProjective::from(point.to_affine())))
}

/// Applies the order's constraints: the signature check over the rebuilt
/// message
#[derive(Clone, Debug)]
pub struct OrderGadget;

impl OrderGadget {
    /// Verify the order's signature
    pub fn apply(order: &OrderVar) -> Result<(), SynthesisError> {
        EdDSAGadget::verify(
            &order.public_key,
            &order.sig_r,
            &order.sig_s_bits,
            &order.message_bits(),
        )
    }
}
