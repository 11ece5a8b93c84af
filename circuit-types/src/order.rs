//! The order type and its canonical signing message

use constants::{
    ScalarField, ACCOUNT_BITS, AMOUNT_BITS, DEX_ID_BITS, ORDER_ID_BITS, ORDER_MESSAGE_BITS,
};
use serde::{Deserialize, Serialize};
use settlement_crypto::fields::ser_scalar;

use crate::{
    int_to_bits_le,
    keychain::{Keypair, PublicKey, Signature},
};

/// A signed limit order
///
/// The three account indices address the accounts tree once per token leg:
/// the sold token, the bought token and the fee token. The fee wallet index
/// addresses the leaf credited with the order's fee
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    /// The dex the order was placed on
    pub dex_id: u16,
    /// The order's index in the owner's slice of the trading-history tree
    pub order_id: u8,
    /// The accounts-tree index of the sell-token account
    pub account_s: u32,
    /// The accounts-tree index of the buy-token account
    pub account_b: u32,
    /// The accounts-tree index of the fee-token account
    pub account_f: u32,
    /// The accounts-tree index of the fee wallet credited by this order
    pub wallet_f: u32,
    /// The maximum amount of the sell token to trade
    #[serde(with = "crate::ser_amount")]
    pub amount_s: u128,
    /// The amount of the buy token asked in return
    #[serde(with = "crate::ser_amount")]
    pub amount_b: u128,
    /// The fee paid when the order fully fills
    #[serde(with = "crate::ser_amount")]
    pub amount_f: u128,
    /// The sold token's identifier
    #[serde(with = "ser_scalar")]
    pub token_s: ScalarField,
    /// The bought token's identifier
    #[serde(with = "ser_scalar")]
    pub token_b: ScalarField,
    /// The fee token's identifier
    #[serde(with = "ser_scalar")]
    pub token_f: ScalarField,
    /// The owner's public key
    pub public_key: PublicKey,
    /// The owner's signature over the canonical message
    pub signature: Signature,
}

impl Order {
    /// The canonical signing message: the little-endian concatenation of the
    /// order's packed fields in a fixed order
    pub fn message_bits(&self) -> Vec<bool> {
        let mut bits = Vec::with_capacity(ORDER_MESSAGE_BITS);
        bits.extend(int_to_bits_le(self.dex_id as u128, DEX_ID_BITS));
        bits.extend(int_to_bits_le(self.order_id as u128, ORDER_ID_BITS));
        bits.extend(int_to_bits_le(self.account_s as u128, ACCOUNT_BITS));
        bits.extend(int_to_bits_le(self.account_b as u128, ACCOUNT_BITS));
        bits.extend(int_to_bits_le(self.account_f as u128, ACCOUNT_BITS));
        bits.extend(int_to_bits_le(self.amount_s, AMOUNT_BITS));
        bits.extend(int_to_bits_le(self.amount_b, AMOUNT_BITS));
        bits.extend(int_to_bits_le(self.amount_f, AMOUNT_BITS));
        bits.extend(int_to_bits_le(self.wallet_f as u128, ACCOUNT_BITS));

        debug_assert_eq!(bits.len(), ORDER_MESSAGE_BITS);
        bits
    }

    /// Sign the order in place under the given keypair
    pub fn sign(&mut self, keypair: &Keypair) {
        self.public_key = keypair.pk;
        self.signature = keypair.sign(&self.message_bits());
    }

    /// Verify the order's signature under its public key
    pub fn verify_signature(&self) -> bool {
        settlement_crypto::eddsa::verify(&self.public_key, &self.message_bits(), &self.signature)
    }

    /// The trading-history tree address of this order: order ID bits first,
    /// then the sell account index
    pub fn history_address(&self) -> u64 {
        (self.order_id as u64) | ((self.account_s as u64) << ORDER_ID_BITS)
    }

    /// Check that every packed field fits its declared width
    pub fn check_ranges(&self) -> bool {
        self.order_id < 1 << ORDER_ID_BITS
            && self.account_s < 1 << ACCOUNT_BITS
            && self.account_b < 1 << ACCOUNT_BITS
            && self.account_f < 1 << ACCOUNT_BITS
            && self.wallet_f < 1 << ACCOUNT_BITS
            && self.amount_s < 1 << AMOUNT_BITS
            && self.amount_b < 1 << AMOUNT_BITS
            && self.amount_f < 1 << AMOUNT_BITS
    }
}

#[cfg(test)]
mod order_tests {
    use constants::ScalarField;
    use rand::thread_rng;
    use settlement_crypto::eddsa::Keypair;

    use super::Order;

    /// Build an unsigned order with placeholder keys
    fn unsigned_order() -> Order {
        let keypair = Keypair::random(&mut thread_rng());
        Order {
            dex_id: 0,
            order_id: 1,
            account_s: 10,
            account_b: 11,
            account_f: 12,
            wallet_f: 13,
            amount_s: 1000,
            amount_b: 2000,
            amount_f: 10,
            token_s: ScalarField::from(1u64),
            token_b: ScalarField::from(2u64),
            token_f: ScalarField::from(3u64),
            public_key: keypair.pk,
            signature: keypair.sign(&[false; 8]),
        }
    }

    /// Signing binds the message; mutating a signed field breaks it
    #[test]
    fn test_sign_and_verify() {
        let mut rng = thread_rng();
        let keypair = Keypair::random(&mut rng);

        let mut order = unsigned_order();
        order.sign(&keypair);
        assert!(order.verify_signature());

        order.amount_s += 1;
        assert!(!order.verify_signature());
    }

    /// The fee wallet index is part of the signed message
    #[test]
    fn test_wallet_in_message() {
        let mut rng = thread_rng();
        let keypair = Keypair::random(&mut rng);

        let mut order = unsigned_order();
        order.sign(&keypair);

        order.wallet_f += 1;
        assert!(!order.verify_signature());
    }

    /// Orders survive a serde round trip
    #[test]
    fn test_serde_round_trip() {
        let mut order = unsigned_order();
        order.sign(&Keypair::random(&mut thread_rng()));

        let json = serde_json::to_string(&order).unwrap();
        let parsed: Order = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.amount_s, order.amount_s);
        assert_eq!(parsed.token_b, order.token_b);
        assert!(parsed.verify_signature());
    }
}
