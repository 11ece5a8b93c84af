//! The public transfer records and the public-data digest binding a batch to
//! its single public input
//!
//! Each chunk of the stream is a packed field emitted most-significant-bit
//! first; the on-chain verifier reassembles the identical byte stream and
//! recomputes the SHA-256 digest, so this ordering is load-bearing

use constants::{
    ScalarField, ACCOUNT_BITS, AMOUNT_BITS, DEX_ID_BITS, ORDER_ID_BITS, ROOT_BITS,
};
use num_bigint::BigUint;
use settlement_crypto::fields::{bits_msb_to_bytes, biguint_to_scalar, scalar_to_bits_le};
use sha2::{Digest, Sha256};

use crate::{int_to_bits_le, order::Order, ring::Ring, settlement::SettlementBatch};

/// The little-endian bit chunks one order contributes to the public-data
/// stream: its identifying fields, the counterparty's receiving account and
/// the order's realized sell and fee fills
pub fn order_record_chunks(
    order: &Order,
    counterparty: &Order,
    fill_s: u128,
    fill_f: u128,
) -> Vec<Vec<bool>> {
    vec![
        int_to_bits_le(order.dex_id as u128, DEX_ID_BITS),
        int_to_bits_le(order.order_id as u128, ORDER_ID_BITS),
        int_to_bits_le(order.account_s as u128, ACCOUNT_BITS),
        int_to_bits_le(counterparty.account_b as u128, ACCOUNT_BITS),
        int_to_bits_le(fill_s, AMOUNT_BITS),
        int_to_bits_le(order.account_f as u128, ACCOUNT_BITS),
        int_to_bits_le(fill_f, AMOUNT_BITS),
    ]
}

/// The little-endian bit chunks one ring contributes: one record per order
pub fn ring_record_chunks(ring: &Ring) -> Vec<Vec<bool>> {
    let mut chunks = order_record_chunks(
        &ring.order_a,
        &ring.order_b,
        ring.fill_s_a,
        ring.fill_f_a,
    );
    chunks.extend(order_record_chunks(
        &ring.order_b,
        &ring.order_a,
        ring.fill_s_b,
        ring.fill_f_b,
    ));

    chunks
}

/// Flatten chunk lists into the hashed bit stream: within each chunk bits
/// are emitted most-significant first, then chunks are concatenated
pub fn flatten_reverse(chunks: &[Vec<bool>]) -> Vec<bool> {
    chunks
        .iter()
        .flat_map(|chunk| chunk.iter().rev().copied())
        .collect()
}

/// The full public-data bit stream of a batch:
/// `historyBefore ∥ historyAfter ∥ accountsBefore ∥ accountsAfter ∥ rings`
pub fn public_data_bits(batch: &SettlementBatch) -> Vec<bool> {
    let mut chunks = vec![
        scalar_to_bits_le(&batch.history_root_before, ROOT_BITS),
        scalar_to_bits_le(&batch.history_root_after, ROOT_BITS),
        scalar_to_bits_le(&batch.accounts_root_before, ROOT_BITS),
        scalar_to_bits_le(&batch.accounts_root_after, ROOT_BITS),
    ];
    for settlement in batch.rings.iter() {
        chunks.extend(ring_record_chunks(&settlement.ring));
    }

    flatten_reverse(&chunks)
}

/// The batch's public input: the SHA-256 digest of the public-data stream,
/// read as a big-endian integer and reduced into the scalar field
pub fn public_data_hash(batch: &SettlementBatch) -> ScalarField {
    let bytes = bits_msb_to_bytes(&public_data_bits(batch));
    let digest = Sha256::digest(&bytes);

    biguint_to_scalar(&BigUint::from_bytes_be(&digest))
}

#[cfg(test)]
mod transfers_tests {
    use constants::{ScalarField, AMOUNT_BITS, ORDER_RECORD_BITS, ROOT_BITS};

    use crate::settlement::SettlementBatch;

    use super::{flatten_reverse, public_data_bits, public_data_hash, ring_record_chunks};

    /// A record carries the advertised number of bits
    #[test]
    fn test_record_width() {
        let batch = SettlementBatch::blank(1);
        let chunks = ring_record_chunks(&batch.rings[0].ring);

        let total: usize = chunks.iter().map(Vec::len).sum();
        assert_eq!(total, 2 * ORDER_RECORD_BITS);
    }

    /// The stream is byte aligned and starts with the four roots
    #[test]
    fn test_stream_shape() {
        let batch = SettlementBatch::blank(2);
        let bits = public_data_bits(&batch);

        assert_eq!(bits.len(), 4 * ROOT_BITS + 2 * 2 * ORDER_RECORD_BITS);
        assert_eq!(bits.len() % 8, 0);
    }

    /// Chunk flattening reverses within a chunk but not across chunks
    #[test]
    fn test_flatten_reverse() {
        let chunks = vec![vec![true, false], vec![false, false, true]];
        assert_eq!(
            flatten_reverse(&chunks),
            vec![false, true, true, false, false]
        );
    }

    /// The digest is sensitive to the fills a ring reports
    #[test]
    fn test_digest_binds_fills() {
        let mut batch = SettlementBatch::blank(1);
        let base = public_data_hash(&batch);

        batch.rings[0].ring.fill_s_a = 1;
        assert_ne!(public_data_hash(&batch), base);

        batch.rings[0].ring.fill_s_a = 1 << (AMOUNT_BITS - 1);
        assert_ne!(public_data_hash(&batch), base);
    }

    /// The digest is sensitive to every root
    #[test]
    fn test_digest_binds_roots() {
        let mut batch = SettlementBatch::blank(1);
        let base = public_data_hash(&batch);

        batch.accounts_root_after = ScalarField::from(1u64);
        assert_ne!(public_data_hash(&batch), base);
    }
}
