//! Per-ring witness data, whole-batch witnesses and the operator-side state
//! they are generated from
//!
//! A `RingSettlement` carries everything the circuit needs to re-derive one
//! ring's state transition: the ring itself, the pre-values of every touched
//! leaf and one Merkle path per update. `SettlementState` plays the operator
//! role, applying rings to its trees and collecting those witnesses

use std::collections::BTreeMap;

use constants::{
    ScalarField, ACCOUNT_BITS, AMOUNT_BITS, TREE_DEPTH_ACCOUNTS, TREE_DEPTH_FILLED,
};
use serde::{Deserialize, Serialize};
use settlement_crypto::{
    eddsa::Point,
    merkle::{compute_root_from_path, hash_account_leaf, hash_filled_leaf, SparseMerkleTree},
};
use tracing::debug;

use crate::{
    errors::SettlementError,
    keychain::PublicKey,
    order::Order,
    ring::Ring,
    transfers,
};

// -----------------
// | Witness Types |
// -----------------

/// The witness for one trading-history update
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilledUpdate {
    /// The cumulative filled amount before this settlement
    #[serde(with = "crate::ser_amount")]
    pub filled_before: u128,
    /// The sibling path of the order's history leaf
    #[serde(with = "crate::ser_scalar_vec")]
    pub proof: Vec<ScalarField>,
}

/// The witness for one account-balance update
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BalanceUpdate {
    /// The leaf's balance before this update
    #[serde(with = "crate::ser_amount")]
    pub balance_before: u128,
    /// The sibling path of the account leaf
    #[serde(with = "crate::ser_scalar_vec")]
    pub proof: Vec<ScalarField>,
}

/// The full witness for one ring settlement
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RingSettlement {
    /// The matched ring
    pub ring: Ring,
    /// Order A's trading-history update
    pub filled_a: FilledUpdate,
    /// Order B's trading-history update
    pub filled_b: FilledUpdate,
    /// Order A's sell-account update
    pub balance_s_a: BalanceUpdate,
    /// Order A's buy-account update
    pub balance_b_a: BalanceUpdate,
    /// Order A's fee-account update
    pub balance_f_a: BalanceUpdate,
    /// Order B's sell-account update
    pub balance_s_b: BalanceUpdate,
    /// Order B's buy-account update
    pub balance_b_b: BalanceUpdate,
    /// Order B's fee-account update
    pub balance_f_b: BalanceUpdate,
    /// Order A's fee-wallet update
    pub balance_w_a: BalanceUpdate,
    /// Order B's fee-wallet update
    pub balance_w_b: BalanceUpdate,
    /// The owner key bound to order A's fee-wallet leaf
    pub fee_wallet_key_a: PublicKey,
    /// The owner key bound to order B's fee-wallet leaf
    pub fee_wallet_key_b: PublicKey,
}

/// One account-leg of a ring settlement, in the order the circuit threads
/// the accounts root
struct BalanceLeg<'a> {
    /// A name for diagnostics
    name: &'static str,
    /// The accounts-tree index being updated
    index: u32,
    /// The owner key the leaf rebinds
    key: &'a PublicKey,
    /// The token the leaf rebinds
    token: ScalarField,
    /// The balance before the update
    before: u128,
    /// The update's Merkle path
    proof: &'a [ScalarField],
    /// The signed delta applied to the balance
    delta: Delta,
}

/// A balance movement
#[derive(Copy, Clone)]
enum Delta {
    /// The leaf is credited
    Credit(u128),
    /// The leaf is debited
    Debit(u128),
}

impl Delta {
    /// Apply the delta, naming the failing check on error
    fn apply(&self, name: &str, before: u128) -> Result<u128, SettlementError> {
        match self {
            Delta::Debit(amount) => before.checked_sub(*amount).ok_or_else(|| {
                SettlementError::ArithmeticOverflow(format!(
                    "balance {name}: {before} cannot cover {amount}"
                ))
            }),
            Delta::Credit(amount) => {
                let after = before.checked_add(*amount).unwrap_or(u128::MAX);
                if after >= 1 << AMOUNT_BITS {
                    return Err(SettlementError::RangeViolation(format!(
                        "balance {name}: credit overflows {AMOUNT_BITS} bits"
                    )));
                }
                Ok(after)
            },
        }
    }
}

impl RingSettlement {
    /// Re-derive the ring's state transition from the witness alone,
    /// mirroring the circuit's checks, and return the post-roots
    ///
    /// This is the witness-time diagnostic pass: any error returned here
    /// names a constraint family the prover would find unsatisfiable
    pub fn replay(
        &self,
        history_root: ScalarField,
        accounts_root: ScalarField,
    ) -> Result<(ScalarField, ScalarField), SettlementError> {
        self.ring.validate()?;

        let history_root = replay_filled_update(
            "A",
            &self.ring.order_a,
            self.ring.fill_s_a,
            &self.filled_a,
            history_root,
        )?;
        let history_root = replay_filled_update(
            "B",
            &self.ring.order_b,
            self.ring.fill_s_b,
            &self.filled_b,
            history_root,
        )?;

        let mut accounts_root = accounts_root;
        for leg in self.balance_legs() {
            accounts_root = replay_balance_update(&leg, accounts_root)?;
        }

        Ok((history_root, accounts_root))
    }

    /// The eight account legs in the order the circuit threads them
    fn balance_legs(&self) -> [BalanceLeg<'_>; 8] {
        let (a, b) = (&self.ring.order_a, &self.ring.order_b);
        [
            BalanceLeg {
                name: "S_A",
                index: a.account_s,
                key: &a.public_key,
                token: a.token_s,
                before: self.balance_s_a.balance_before,
                proof: &self.balance_s_a.proof,
                delta: Delta::Debit(self.ring.fill_s_a),
            },
            BalanceLeg {
                name: "B_A",
                index: a.account_b,
                key: &a.public_key,
                token: a.token_b,
                before: self.balance_b_a.balance_before,
                proof: &self.balance_b_a.proof,
                delta: Delta::Credit(self.ring.fill_s_b),
            },
            BalanceLeg {
                name: "F_A",
                index: a.account_f,
                key: &a.public_key,
                token: a.token_f,
                before: self.balance_f_a.balance_before,
                proof: &self.balance_f_a.proof,
                delta: Delta::Debit(self.ring.fill_f_a),
            },
            BalanceLeg {
                name: "S_B",
                index: b.account_s,
                key: &b.public_key,
                token: b.token_s,
                before: self.balance_s_b.balance_before,
                proof: &self.balance_s_b.proof,
                delta: Delta::Debit(self.ring.fill_s_b),
            },
            BalanceLeg {
                name: "B_B",
                index: b.account_b,
                key: &b.public_key,
                token: b.token_b,
                before: self.balance_b_b.balance_before,
                proof: &self.balance_b_b.proof,
                delta: Delta::Credit(self.ring.fill_s_a),
            },
            BalanceLeg {
                name: "F_B",
                index: b.account_f,
                key: &b.public_key,
                token: b.token_f,
                before: self.balance_f_b.balance_before,
                proof: &self.balance_f_b.proof,
                delta: Delta::Debit(self.ring.fill_f_b),
            },
            BalanceLeg {
                name: "W_A",
                index: a.wallet_f,
                key: &self.fee_wallet_key_a,
                token: a.token_f,
                before: self.balance_w_a.balance_before,
                proof: &self.balance_w_a.proof,
                delta: Delta::Credit(self.ring.fill_f_a),
            },
            BalanceLeg {
                name: "W_B",
                index: b.wallet_f,
                key: &self.fee_wallet_key_b,
                token: b.token_f,
                before: self.balance_w_b.balance_before,
                proof: &self.balance_w_b.proof,
                delta: Delta::Credit(self.ring.fill_f_b),
            },
        ]
    }

    /// A structurally complete settlement with vacuous content, for
    /// constraint generation without a witness
    pub fn blank() -> Self {
        let blank_update = || FilledUpdate {
            filled_before: 0,
            proof: vec![ScalarField::from(0u64); TREE_DEPTH_FILLED],
        };
        let blank_balance = || BalanceUpdate {
            balance_before: 0,
            proof: vec![ScalarField::from(0u64); TREE_DEPTH_ACCOUNTS],
        };

        Self {
            ring: Ring {
                order_a: blank_order(),
                order_b: blank_order(),
                fill_s_a: 0,
                fill_b_a: 0,
                fill_f_a: 0,
                fill_s_b: 0,
                fill_b_b: 0,
                fill_f_b: 0,
            },
            filled_a: blank_update(),
            filled_b: blank_update(),
            balance_s_a: blank_balance(),
            balance_b_a: blank_balance(),
            balance_f_a: blank_balance(),
            balance_s_b: blank_balance(),
            balance_b_b: blank_balance(),
            balance_f_b: blank_balance(),
            balance_w_a: blank_balance(),
            balance_w_b: blank_balance(),
            fee_wallet_key_a: Point::identity(),
            fee_wallet_key_b: Point::identity(),
        }
    }
}

/// An order whose every field is vacuous; used only for constraint-shape
/// generation
fn blank_order() -> Order {
    use settlement_crypto::eddsa::Signature;

    Order {
        dex_id: 0,
        order_id: 0,
        account_s: 0,
        account_b: 0,
        account_f: 0,
        wallet_f: 0,
        amount_s: 0,
        amount_b: 0,
        amount_f: 0,
        token_s: ScalarField::from(0u64),
        token_b: ScalarField::from(0u64),
        token_f: ScalarField::from(0u64),
        public_key: Point::identity(),
        signature: Signature {
            r: Point::identity(),
            s: constants::EmbeddedScalarField::from(0u64),
        },
    }
}

/// Replay one trading-history update against a running root
fn replay_filled_update(
    side: &str,
    order: &Order,
    fill_s: u128,
    update: &FilledUpdate,
    root: ScalarField,
) -> Result<ScalarField, SettlementError> {
    let filled_after = update.filled_before.checked_add(fill_s).unwrap_or(u128::MAX);
    if filled_after > order.amount_s {
        return Err(SettlementError::MatchInfeasible(format!(
            "order {side}: cumulative fill {filled_after} exceeds amount {}",
            order.amount_s
        )));
    }

    let address = order.history_address();
    let leaf_before = hash_filled_leaf(ScalarField::from(update.filled_before));
    if compute_root_from_path(leaf_before, address, &update.proof) != root {
        return Err(SettlementError::MerkleMismatch(format!(
            "order {side}: history leaf does not open against the running root"
        )));
    }

    let leaf_after = hash_filled_leaf(ScalarField::from(filled_after));
    Ok(compute_root_from_path(leaf_after, address, &update.proof))
}

/// Replay one balance update against a running root
fn replay_balance_update(
    leg: &BalanceLeg<'_>,
    root: ScalarField,
) -> Result<ScalarField, SettlementError> {
    let after = leg.delta.apply(leg.name, leg.before)?;

    let leaf_before = hash_account_leaf(
        leg.key.x,
        leg.key.y,
        leg.token,
        ScalarField::from(leg.before),
    );
    if compute_root_from_path(leaf_before, leg.index as u64, leg.proof) != root {
        return Err(SettlementError::MerkleMismatch(format!(
            "balance {}: account leaf does not open against the running root",
            leg.name
        )));
    }

    let leaf_after =
        hash_account_leaf(leg.key.x, leg.key.y, leg.token, ScalarField::from(after));
    Ok(compute_root_from_path(leaf_after, leg.index as u64, leg.proof))
}

// -------------------
// | Batch Witnesses |
// -------------------

/// The witness for a whole batch of ring settlements, together with the four
/// roots it commits to
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SettlementBatch {
    /// The ring settlements in execution order
    pub rings: Vec<RingSettlement>,
    /// The trading-history root before the batch
    #[serde(with = "settlement_crypto::fields::ser_scalar")]
    pub history_root_before: ScalarField,
    /// The trading-history root after the batch
    #[serde(with = "settlement_crypto::fields::ser_scalar")]
    pub history_root_after: ScalarField,
    /// The accounts root before the batch
    #[serde(with = "settlement_crypto::fields::ser_scalar")]
    pub accounts_root_before: ScalarField,
    /// The accounts root after the batch
    #[serde(with = "settlement_crypto::fields::ser_scalar")]
    pub accounts_root_after: ScalarField,
}

impl SettlementBatch {
    /// The single public input this batch commits to
    pub fn public_data_hash(&self) -> ScalarField {
        transfers::public_data_hash(self)
    }

    /// Replay every ring and check both root chains against the declared
    /// after-roots
    pub fn validate(&self) -> Result<(), SettlementError> {
        let mut history_root = self.history_root_before;
        let mut accounts_root = self.accounts_root_before;
        for ring in self.rings.iter() {
            (history_root, accounts_root) = ring.replay(history_root, accounts_root)?;
        }

        if history_root != self.history_root_after {
            return Err(SettlementError::RootDiscontinuity(
                "computed history root does not match the declared after-root".to_string(),
            ));
        }
        if accounts_root != self.accounts_root_after {
            return Err(SettlementError::RootDiscontinuity(
                "computed accounts root does not match the declared after-root".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate the batch against an externally supplied public input
    pub fn validate_public_input(&self, input: &ScalarField) -> Result<(), SettlementError> {
        self.validate()?;
        if self.public_data_hash() != *input {
            return Err(SettlementError::HashMismatch(
                "public-data digest does not match the declared public input".to_string(),
            ));
        }

        Ok(())
    }

    /// A structurally complete batch with vacuous content, for constraint
    /// generation without a witness
    pub fn blank(num_rings: usize) -> Self {
        Self {
            rings: (0..num_rings).map(|_| RingSettlement::blank()).collect(),
            history_root_before: ScalarField::from(0u64),
            history_root_after: ScalarField::from(0u64),
            accounts_root_before: ScalarField::from(0u64),
            accounts_root_after: ScalarField::from(0u64),
        }
    }
}

// ------------------
// | Operator State |
// ------------------

/// An account leaf's native content
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    /// The owner's public key
    pub key: PublicKey,
    /// The token this leaf holds a balance of
    #[serde(with = "settlement_crypto::fields::ser_scalar")]
    pub token: ScalarField,
    /// The balance itself
    #[serde(with = "crate::ser_amount")]
    pub balance: u128,
}

/// The operator's view of both trees, from which batch witnesses are built
#[derive(Clone, Debug)]
pub struct SettlementState {
    /// The trading-history tree
    filled_tree: SparseMerkleTree,
    /// The accounts tree
    accounts_tree: SparseMerkleTree,
    /// The native content behind each occupied account leaf
    accounts: BTreeMap<u32, Account>,
    /// The native cumulative fill behind each occupied history leaf
    filled: BTreeMap<u64, u128>,
}

impl Default for SettlementState {
    fn default() -> Self {
        Self::new()
    }
}

impl SettlementState {
    /// A state with both trees empty
    pub fn new() -> Self {
        let empty_filled = hash_filled_leaf(ScalarField::from(0u64));
        let zero = ScalarField::from(0u64);
        let empty_account = hash_account_leaf(zero, zero, zero, zero);

        Self {
            filled_tree: SparseMerkleTree::new(TREE_DEPTH_FILLED, empty_filled),
            accounts_tree: SparseMerkleTree::new(TREE_DEPTH_ACCOUNTS, empty_account),
            accounts: BTreeMap::new(),
            filled: BTreeMap::new(),
        }
    }

    /// The current trading-history root
    pub fn history_root(&self) -> ScalarField {
        self.filled_tree.root()
    }

    /// The current accounts root
    pub fn accounts_root(&self) -> ScalarField {
        self.accounts_tree.root()
    }

    /// Read an account leaf
    pub fn account(&self, index: u32) -> Option<&Account> {
        self.accounts.get(&index)
    }

    /// Create (or overwrite) an account leaf
    pub fn create_account(&mut self, index: u32, account: Account) {
        assert!((index as u64) < 1 << ACCOUNT_BITS, "account index too wide");

        self.accounts_tree.insert(
            index as u64,
            hash_account_leaf(
                account.key.x,
                account.key.y,
                account.token,
                ScalarField::from(account.balance),
            ),
        );
        self.accounts.insert(index, account);
    }

    /// Settle a single ring against the state, producing its witness
    ///
    /// The state is only mutated if the whole ring settles cleanly
    pub fn settle_ring(&mut self, ring: Ring) -> Result<RingSettlement, SettlementError> {
        ring.validate()?;

        let mut next = self.clone();
        let filled_a = next.apply_filled(&ring.order_a, ring.fill_s_a)?;
        let filled_b = next.apply_filled(&ring.order_b, ring.fill_s_b)?;

        let (a, b) = (&ring.order_a, &ring.order_b);
        let (balance_s_a, _) = next.apply_balance(
            "S_A",
            a.account_s,
            Some(&a.public_key),
            a.token_s,
            Delta::Debit(ring.fill_s_a),
        )?;
        let (balance_b_a, _) = next.apply_balance(
            "B_A",
            a.account_b,
            Some(&a.public_key),
            a.token_b,
            Delta::Credit(ring.fill_s_b),
        )?;
        let (balance_f_a, _) = next.apply_balance(
            "F_A",
            a.account_f,
            Some(&a.public_key),
            a.token_f,
            Delta::Debit(ring.fill_f_a),
        )?;
        let (balance_s_b, _) = next.apply_balance(
            "S_B",
            b.account_s,
            Some(&b.public_key),
            b.token_s,
            Delta::Debit(ring.fill_s_b),
        )?;
        let (balance_b_b, _) = next.apply_balance(
            "B_B",
            b.account_b,
            Some(&b.public_key),
            b.token_b,
            Delta::Credit(ring.fill_s_a),
        )?;
        let (balance_f_b, _) = next.apply_balance(
            "F_B",
            b.account_f,
            Some(&b.public_key),
            b.token_f,
            Delta::Debit(ring.fill_f_b),
        )?;
        let (balance_w_a, fee_wallet_key_a) = next.apply_balance(
            "W_A",
            a.wallet_f,
            None,
            a.token_f,
            Delta::Credit(ring.fill_f_a),
        )?;
        let (balance_w_b, fee_wallet_key_b) = next.apply_balance(
            "W_B",
            b.wallet_f,
            None,
            b.token_f,
            Delta::Credit(ring.fill_f_b),
        )?;

        *self = next;
        Ok(RingSettlement {
            ring,
            filled_a,
            filled_b,
            balance_s_a,
            balance_b_a,
            balance_f_a,
            balance_s_b,
            balance_b_b,
            balance_f_b,
            balance_w_a,
            balance_w_b,
            fee_wallet_key_a,
            fee_wallet_key_b,
        })
    }

    /// Settle a batch of rings, producing the whole-batch witness
    pub fn settle_batch(&mut self, rings: Vec<Ring>) -> Result<SettlementBatch, SettlementError> {
        let history_root_before = self.history_root();
        let accounts_root_before = self.accounts_root();

        let num_rings = rings.len();
        let rings = rings
            .into_iter()
            .map(|ring| self.settle_ring(ring))
            .collect::<Result<Vec<_>, SettlementError>>()?;

        let batch = SettlementBatch {
            rings,
            history_root_before,
            history_root_after: self.history_root(),
            accounts_root_before,
            accounts_root_after: self.accounts_root(),
        };
        debug!(
            num_rings,
            history_root = %settlement_crypto::fields::scalar_to_biguint(&batch.history_root_after),
            "settled batch"
        );

        Ok(batch)
    }

    /// Apply one trading-history update, returning its witness
    fn apply_filled(
        &mut self,
        order: &Order,
        fill_s: u128,
    ) -> Result<FilledUpdate, SettlementError> {
        let address = order.history_address();
        let filled_before = self.filled.get(&address).copied().unwrap_or(0);
        let filled_after = filled_before.checked_add(fill_s).unwrap_or(u128::MAX);
        if filled_after > order.amount_s {
            return Err(SettlementError::MatchInfeasible(format!(
                "cumulative fill {filled_after} exceeds order amount {}",
                order.amount_s
            )));
        }

        let proof = self.filled_tree.proof(address);
        self.filled.insert(address, filled_after);
        self.filled_tree
            .insert(address, hash_filled_leaf(ScalarField::from(filled_after)));

        Ok(FilledUpdate {
            filled_before,
            proof,
        })
    }

    /// Apply one balance update, returning its witness and the owner key the
    /// leaf rebinds
    fn apply_balance(
        &mut self,
        name: &str,
        index: u32,
        expected_key: Option<&PublicKey>,
        token: ScalarField,
        delta: Delta,
    ) -> Result<(BalanceUpdate, PublicKey), SettlementError> {
        let account = self.accounts.get(&index).cloned().ok_or_else(|| {
            SettlementError::MerkleMismatch(format!("balance {name}: no account at index {index}"))
        })?;

        if let Some(key) = expected_key {
            if *key != account.key {
                return Err(SettlementError::MerkleMismatch(format!(
                    "balance {name}: account {index} is not owned by the order's key"
                )));
            }
        }
        if account.token != token {
            return Err(SettlementError::MerkleMismatch(format!(
                "balance {name}: account {index} holds a different token"
            )));
        }

        let balance_before = account.balance;
        let balance_after = delta.apply(name, balance_before)?;

        let proof = self.accounts_tree.proof(index as u64);
        self.create_account(
            index,
            Account {
                balance: balance_after,
                ..account.clone()
            },
        );

        Ok((
            BalanceUpdate {
                balance_before,
                proof,
            },
            account.key,
        ))
    }
}
