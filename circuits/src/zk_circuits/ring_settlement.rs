//! The ring-settlement gadget: one two-sided match, settled end to end
//!
//! A ring turns into a fixed DAG of sub-gadgets: two verified orders, four
//! balance transfers, two trading-history updates and eight account updates
//! threading the two roots, plus the rate, token and feasibility checks

use ark_ed_on_bn254::constraints::EdwardsVar;
use ark_r1cs_std::{alloc::AllocVar, boolean::Boolean, eq::EqGadget, fields::fp::FpVar};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use circuit_types::settlement::RingSettlement;
use constants::{ScalarField, AMOUNT_BITS};

use crate::zk_gadgets::{
    arithmetic::SubAddGadget,
    bits::DualVar,
    comparators::LeqGadget,
    rate::RateCheckerGadget,
};

use super::{
    merkle_update::{UpdateBalanceGadget, UpdateFilledGadget},
    order::{alloc_point, OrderGadget, OrderVar},
};

/// A ring settlement's witness, allocated in the constraint system
#[derive(Clone, Debug)]
pub struct RingSettlementVar {
    /// The first matched order
    pub order_a: OrderVar,
    /// The second matched order
    pub order_b: OrderVar,
    /// Order A's realized sell amount
    pub fill_s_a: DualVar<ScalarField>,
    /// Order A's quoted buy amount
    pub fill_b_a: DualVar<ScalarField>,
    /// Order A's fee
    pub fill_f_a: DualVar<ScalarField>,
    /// Order B's realized sell amount
    pub fill_s_b: DualVar<ScalarField>,
    /// Order B's quoted buy amount
    pub fill_b_b: DualVar<ScalarField>,
    /// Order B's fee
    pub fill_f_b: DualVar<ScalarField>,
    /// Order A's cumulative fill before the ring
    pub filled_a_before: DualVar<ScalarField>,
    /// Order B's cumulative fill before the ring
    pub filled_b_before: DualVar<ScalarField>,
    /// Pre-balances of the eight touched account legs
    pub balances_before: BalancesVar,
    /// The owner key bound to order A's fee-wallet leaf
    pub fee_wallet_key_a: EdwardsVar,
    /// The owner key bound to order B's fee-wallet leaf
    pub fee_wallet_key_b: EdwardsVar,
    /// Sibling paths of the two trading-history updates
    pub proof_filled_a: Vec<FpVar<ScalarField>>,
    /// Sibling path of order B's trading-history update
    pub proof_filled_b: Vec<FpVar<ScalarField>>,
    /// Sibling paths of the eight balance updates, in threading order
    pub balance_proofs: Vec<Vec<FpVar<ScalarField>>>,
}

/// The eight pre-balances a ring touches, each range-checked on allocation
#[derive(Clone, Debug)]
pub struct BalancesVar {
    /// Order A's sell-account balance
    pub s_a: DualVar<ScalarField>,
    /// Order A's buy-account balance
    pub b_a: DualVar<ScalarField>,
    /// Order A's fee-account balance
    pub f_a: DualVar<ScalarField>,
    /// Order B's sell-account balance
    pub s_b: DualVar<ScalarField>,
    /// Order B's buy-account balance
    pub b_b: DualVar<ScalarField>,
    /// Order B's fee-account balance
    pub f_b: DualVar<ScalarField>,
    /// Order A's fee-wallet balance
    pub w_a: DualVar<ScalarField>,
    /// Order B's fee-wallet balance
    pub w_b: DualVar<ScalarField>,
}

impl RingSettlementVar {
    /// Witness a ring settlement in the constraint system
    pub fn new_witness(
        cs: ConstraintSystemRef<ScalarField>,
        settlement: &RingSettlement,
    ) -> Result<Self, SynthesisError> {
        let ring = &settlement.ring;
        let order_a = OrderVar::new_witness(cs.clone(), &ring.order_a)?;
        let order_b = OrderVar::new_witness(cs.clone(), &ring.order_b)?;

        let amount = |value: u128| {
            DualVar::new_witness(cs.clone(), &ScalarField::from(value), AMOUNT_BITS)
        };

        let balances_before = BalancesVar {
            s_a: amount(settlement.balance_s_a.balance_before)?,
            b_a: amount(settlement.balance_b_a.balance_before)?,
            f_a: amount(settlement.balance_f_a.balance_before)?,
            s_b: amount(settlement.balance_s_b.balance_before)?,
            b_b: amount(settlement.balance_b_b.balance_before)?,
            f_b: amount(settlement.balance_f_b.balance_before)?,
            w_a: amount(settlement.balance_w_a.balance_before)?,
            w_b: amount(settlement.balance_w_b.balance_before)?,
        };

        let balance_proofs = [
            &settlement.balance_s_a,
            &settlement.balance_b_a,
            &settlement.balance_f_a,
            &settlement.balance_s_b,
            &settlement.balance_b_b,
            &settlement.balance_f_b,
            &settlement.balance_w_a,
            &settlement.balance_w_b,
        ]
        .into_iter()
        .map(|update| alloc_path(cs.clone(), &update.proof))
        .collect::<Result<Vec<_>, SynthesisError>>()?;

        Ok(Self {
            fill_s_a: amount(ring.fill_s_a)?,
            fill_b_a: amount(ring.fill_b_a)?,
            fill_f_a: amount(ring.fill_f_a)?,
            fill_s_b: amount(ring.fill_s_b)?,
            fill_b_b: amount(ring.fill_b_b)?,
            fill_f_b: amount(ring.fill_f_b)?,
            filled_a_before: amount(settlement.filled_a.filled_before)?,
            filled_b_before: amount(settlement.filled_b.filled_before)?,
            fee_wallet_key_a: alloc_point(cs.clone(), &settlement.fee_wallet_key_a)?,
            fee_wallet_key_b: alloc_point(cs.clone(), &settlement.fee_wallet_key_b)?,
            proof_filled_a: alloc_path(cs.clone(), &settlement.filled_a.proof)?,
            proof_filled_b: alloc_path(cs, &settlement.filled_b.proof)?,
            balances_before,
            balance_proofs,
            order_a,
            order_b,
        })
    }
}

/// Witness a native sibling path
fn alloc_path(
    cs: ConstraintSystemRef<ScalarField>,
    path: &[ScalarField],
) -> Result<Vec<FpVar<ScalarField>>, SynthesisError> {
    path.iter()
        .map(|sibling| FpVar::new_witness(cs.clone(), || Ok(*sibling)))
        .collect()
}

/// The wires a settled ring hands back to the circuit top
#[derive(Clone, Debug)]
pub struct RingSettlementOutput {
    /// The trading-history root after both filled updates
    pub new_history_root: FpVar<ScalarField>,
    /// The accounts root after all eight balance updates
    pub new_accounts_root: FpVar<ScalarField>,
    /// The ring's public transfer records, as little-endian bit chunks
    pub public_data: Vec<Vec<Boolean<ScalarField>>>,
}

/// Composes the sub-gadgets of one ring settlement
#[derive(Clone, Debug)]
pub struct RingSettlementGadget;

impl RingSettlementGadget {
    /// Apply the ring's constraints against the two running roots and
    /// return the post-roots and public data
    pub fn apply(
        ring: &RingSettlementVar,
        history_root: &FpVar<ScalarField>,
        accounts_root: &FpVar<ScalarField>,
    ) -> Result<RingSettlementOutput, SynthesisError> {
        let (a, b) = (&ring.order_a, &ring.order_b);

        // Verify both order signatures
        OrderGadget::apply(a)?;
        OrderGadget::apply(b)?;

        // The token swap and the two fee transfers
        let balances = &ring.balances_before;
        let (new_s_a, new_b_b) = SubAddGadget::sub_add(
            &balances.s_a.packed,
            &balances.b_b.packed,
            &ring.fill_s_a.packed,
        )?;
        let (new_s_b, new_b_a) = SubAddGadget::sub_add(
            &balances.s_b.packed,
            &balances.b_a.packed,
            &ring.fill_s_b.packed,
        )?;
        let (new_f_a, new_w_a) = SubAddGadget::sub_add(
            &balances.f_a.packed,
            &balances.w_a.packed,
            &ring.fill_f_a.packed,
        )?;
        let (new_f_b, new_w_b) = SubAddGadget::sub_add(
            &balances.f_b.packed,
            &balances.w_b.packed,
            &ring.fill_f_b.packed,
        )?;

        // Thread the trading-history root through both orders' updates and
        // cap the cumulative fills
        let update_filled_a = UpdateFilledGadget::apply(
            history_root,
            &a.history_address_bits(),
            &ring.filled_a_before,
            &ring.fill_s_a,
            &ring.proof_filled_a,
        )?;
        let update_filled_b = UpdateFilledGadget::apply(
            &update_filled_a.new_root,
            &b.history_address_bits(),
            &ring.filled_b_before,
            &ring.fill_s_b,
            &ring.proof_filled_b,
        )?;
        LeqGadget::constrain_leq(&update_filled_a.filled_after, &a.amount_s.packed)?;
        LeqGadget::constrain_leq(&update_filled_b.filled_after, &b.amount_s.packed)?;

        // Thread the accounts root through the eight balance updates
        let legs = vec![
            (&a.account_s, &a.public_key, &a.token_s, &balances.s_a, &new_s_a),
            (&a.account_b, &a.public_key, &a.token_b, &balances.b_a, &new_b_a),
            (&a.account_f, &a.public_key, &a.token_f, &balances.f_a, &new_f_a),
            (&b.account_s, &b.public_key, &b.token_s, &balances.s_b, &new_s_b),
            (&b.account_b, &b.public_key, &b.token_b, &balances.b_b, &new_b_b),
            (&b.account_f, &b.public_key, &b.token_f, &balances.f_b, &new_f_b),
            (&a.wallet_f, &ring.fee_wallet_key_a, &a.token_f, &balances.w_a, &new_w_a),
            (&b.wallet_f, &ring.fee_wallet_key_b, &b.token_f, &balances.w_b, &new_w_b),
        ];

        let mut running_root = accounts_root.clone();
        for ((address, key, token, before, after), proof) in
            legs.into_iter().zip(ring.balance_proofs.iter())
        {
            let update = UpdateBalanceGadget::apply(
                &running_root,
                &address.bits,
                key,
                token,
                &before.packed,
                after,
                proof,
            )?;
            running_root = update.new_root;
        }

        // Fills must respect both orders' rates, trade and fee alike
        RateCheckerGadget::check_rate(
            &ring.fill_s_a.packed,
            &ring.fill_b_a.packed,
            &a.amount_s.packed,
            &a.amount_b.packed,
        )?;
        RateCheckerGadget::check_rate(
            &ring.fill_s_b.packed,
            &ring.fill_b_b.packed,
            &b.amount_s.packed,
            &b.amount_b.packed,
        )?;
        RateCheckerGadget::check_rate(
            &ring.fill_f_a.packed,
            &ring.fill_s_a.packed,
            &a.amount_f.packed,
            &a.amount_s.packed,
        )?;
        RateCheckerGadget::check_rate(
            &ring.fill_f_b.packed,
            &ring.fill_s_b.packed,
            &b.amount_f.packed,
            &b.amount_s.packed,
        )?;

        // The orders must trade opposite sides of one token pair
        a.token_s.enforce_equal(&b.token_b)?;
        a.token_b.enforce_equal(&b.token_s)?;

        // Neither side may receive more than the other gives up
        LeqGadget::constrain_leq(&ring.fill_b_b.packed, &ring.fill_s_a.packed)?;
        LeqGadget::constrain_leq(&ring.fill_b_a.packed, &ring.fill_s_b.packed)?;

        // The ring's contribution to the public-data stream: one transfer
        // record per order
        let public_data = vec![
            a.dex_id.bits.clone(),
            a.order_id.bits.clone(),
            a.account_s.bits.clone(),
            b.account_b.bits.clone(),
            ring.fill_s_a.bits.clone(),
            a.account_f.bits.clone(),
            ring.fill_f_a.bits.clone(),
            b.dex_id.bits.clone(),
            b.order_id.bits.clone(),
            b.account_s.bits.clone(),
            a.account_b.bits.clone(),
            ring.fill_s_b.bits.clone(),
            b.account_f.bits.clone(),
            ring.fill_f_b.bits.clone(),
        ];

        Ok(RingSettlementOutput {
            new_history_root: update_filled_b.new_root,
            new_accounts_root: running_root,
            public_data,
        })
    }
}
