//! End-to-end tests of the settlement circuit: whole batches built through
//! the operator state, checked for satisfiability against their public input

use ark_relations::r1cs::{ConstraintSystem, ConstraintSystemRef};
use circuit_types::{
    errors::SettlementError,
    order::Order,
    ring::Ring,
    settlement::{Account, SettlementBatch, SettlementState},
};
use circuits::zk_circuits::settlement::{SettlementCircuit, SettlementStatement};
use constants::ScalarField;
use rand::thread_rng;
use settlement_crypto::eddsa::Keypair;

// -----------
// | Helpers |
// -----------

/// Token identifiers used throughout the scenarios
const TOKEN_1: u64 = 1;
const TOKEN_2: u64 = 2;
const TOKEN_3: u64 = 3;

/// The fee wallet's accounts-tree index, shared by both orders
const WALLET_INDEX: u32 = 30;

/// A trading venue fixture: two traders, a fee wallet and funded accounts
struct Venue {
    /// The operator state both trees live in
    state: SettlementState,
    /// Trader A's keypair
    trader_a: Keypair,
    /// Trader B's keypair
    trader_b: Keypair,
}

impl Venue {
    /// Fund a venue where A holds 1000 of token 1, B holds 2000 of token 2
    /// and both hold 100 of the fee token
    fn new() -> Self {
        let mut rng = thread_rng();
        let trader_a = Keypair::random(&mut rng);
        let trader_b = Keypair::random(&mut rng);
        let wallet = Keypair::random(&mut rng);

        let mut state = SettlementState::new();
        let account = |key: &Keypair, token: u64, balance: u128| Account {
            key: key.pk,
            token: ScalarField::from(token),
            balance,
        };

        state.create_account(10, account(&trader_a, TOKEN_1, 1000));
        state.create_account(11, account(&trader_a, TOKEN_2, 0));
        state.create_account(12, account(&trader_a, TOKEN_3, 100));
        state.create_account(20, account(&trader_b, TOKEN_2, 2000));
        state.create_account(21, account(&trader_b, TOKEN_1, 0));
        state.create_account(22, account(&trader_b, TOKEN_3, 100));
        state.create_account(WALLET_INDEX, account(&wallet, TOKEN_3, 0));

        Self {
            state,
            trader_a,
            trader_b,
        }
    }

    /// Order A: sell 1000 of token 1 for 2000 of token 2, 10 fee
    fn order_a(&self) -> Order {
        let mut order = Order {
            dex_id: 0,
            order_id: 0,
            account_s: 10,
            account_b: 11,
            account_f: 12,
            wallet_f: WALLET_INDEX,
            amount_s: 1000,
            amount_b: 2000,
            amount_f: 10,
            token_s: ScalarField::from(TOKEN_1),
            token_b: ScalarField::from(TOKEN_2),
            token_f: ScalarField::from(TOKEN_3),
            public_key: self.trader_a.pk,
            signature: self.trader_a.sign(&[false; 8]),
        };
        order.sign(&self.trader_a);

        order
    }

    /// Order B: sell 2000 of token 2 for 1000 of token 1, 20 fee
    fn order_b(&self) -> Order {
        let mut order = Order {
            dex_id: 0,
            order_id: 0,
            account_s: 20,
            account_b: 21,
            account_f: 22,
            wallet_f: WALLET_INDEX,
            amount_s: 2000,
            amount_b: 1000,
            amount_f: 20,
            token_s: ScalarField::from(TOKEN_2),
            token_b: ScalarField::from(TOKEN_1),
            token_f: ScalarField::from(TOKEN_3),
            public_key: self.trader_b.pk,
            signature: self.trader_b.sign(&[false; 8]),
        };
        order.sign(&self.trader_b);

        order
    }

    /// A full-fill ring over the two orders
    fn full_fill_ring(&self) -> Ring {
        Ring {
            order_a: self.order_a(),
            order_b: self.order_b(),
            fill_s_a: 1000,
            fill_b_a: 2000,
            fill_f_a: 10,
            fill_s_b: 2000,
            fill_b_b: 1000,
            fill_f_b: 20,
        }
    }

    /// A half-fill ring over the two orders
    fn half_fill_ring(&self) -> Ring {
        Ring {
            order_a: self.order_a(),
            order_b: self.order_b(),
            fill_s_a: 500,
            fill_b_a: 1000,
            fill_f_a: 5,
            fill_s_b: 1000,
            fill_b_b: 500,
            fill_f_b: 10,
        }
    }
}

/// Synthesize the circuit over a batch and a declared public input
fn synthesize(
    batch: SettlementBatch,
    public_data_hash: ScalarField,
) -> ConstraintSystemRef<ScalarField> {
    use ark_relations::r1cs::ConstraintSynthesizer;

    let cs = ConstraintSystem::<ScalarField>::new_ref();
    let circuit = SettlementCircuit::new(SettlementStatement { public_data_hash }, batch);
    circuit.generate_constraints(cs.clone()).unwrap();

    cs
}

/// Synthesize the circuit over a batch with its honestly computed input
fn synthesize_honest(batch: SettlementBatch) -> ConstraintSystemRef<ScalarField> {
    let hash = batch.public_data_hash();
    synthesize(batch, hash)
}

// -------------
// | Scenarios |
// -------------

/// A single full-fill ring settles and satisfies every constraint
#[test]
fn test_single_ring() {
    let mut venue = Venue::new();
    let ring = venue.full_fill_ring();
    let batch = venue.state.settle_batch(vec![ring]).unwrap();

    assert!(batch.validate().is_ok());
    assert!(synthesize_honest(batch).is_satisfied().unwrap());

    // Balances moved: A holds B's tokens, the wallet collected both fees
    assert_eq!(venue.state.account(10).unwrap().balance, 0);
    assert_eq!(venue.state.account(11).unwrap().balance, 2000);
    assert_eq!(venue.state.account(21).unwrap().balance, 1000);
    assert_eq!(venue.state.account(WALLET_INDEX).unwrap().balance, 30);
}

/// A partial fill settles; the cumulative fill stays under the order amount
#[test]
fn test_partial_fill() {
    let mut venue = Venue::new();
    let ring = venue.half_fill_ring();
    let batch = venue.state.settle_batch(vec![ring]).unwrap();

    assert_eq!(batch.rings[0].filled_a.filled_before, 0);
    assert!(synthesize_honest(batch).is_satisfied().unwrap());
    assert_eq!(venue.state.account(10).unwrap().balance, 500);
}

/// Two half-fill rings chain: the second ring opens against the first
/// ring's post-roots and the cumulative fills reach the order amounts
#[test]
fn test_two_ring_chain() {
    let mut venue = Venue::new();
    let rings = vec![venue.half_fill_ring(), venue.half_fill_ring()];
    let batch = venue.state.settle_batch(rings).unwrap();

    assert_eq!(batch.rings[1].filled_a.filled_before, 500);
    assert!(batch.validate().is_ok());
    assert!(synthesize_honest(batch).is_satisfied().unwrap());
}

/// A fill off the order's rate by one unit is rejected natively and leaves
/// the circuit unsatisfiable
#[test]
fn test_rate_violation() {
    let mut venue = Venue::new();
    let ring = venue.full_fill_ring();
    let batch = venue.state.settle_batch(vec![ring]).unwrap();

    // The builder refuses the ring outright
    let mut other_venue = Venue::new();
    let mut bad_ring = other_venue.full_fill_ring();
    bad_ring.fill_b_a = 1999;
    assert!(matches!(
        other_venue.state.settle_ring(bad_ring),
        Err(SettlementError::RateMismatch(_))
    ));

    // A tampered witness fails in-circuit; the quoted fill is not part of
    // the public data, so the input is unchanged
    let mut tampered = batch;
    tampered.rings[0].ring.fill_b_a = 1999;
    let hash = tampered.public_data_hash();
    assert!(!synthesize(tampered, hash).is_satisfied().unwrap());
}

/// A source balance one unit short underflows the transfer
#[test]
fn test_insufficient_balance() {
    let mut venue = Venue::new();

    // Drain A's sell account down to 999
    let drained = Account {
        key: venue.trader_a.pk,
        token: ScalarField::from(TOKEN_1),
        balance: 999,
    };
    venue.state.create_account(10, drained);

    let ring = venue.full_fill_ring();
    assert!(matches!(
        venue.state.settle_ring(ring),
        Err(SettlementError::ArithmeticOverflow(_))
    ));
}

/// A flipped signature bit fails the in-circuit verifier
#[test]
fn test_bad_signature() {
    let mut venue = Venue::new();
    let ring = venue.full_fill_ring();
    let batch = venue.state.settle_batch(vec![ring]).unwrap();

    let mut tampered = batch;
    tampered.rings[0].ring.order_a.signature.s += ark_ed_on_bn254::Fr::from(1u64);

    assert!(matches!(
        tampered.validate(),
        Err(SettlementError::SignatureInvalid(_))
    ));
    let hash = tampered.public_data_hash();
    assert!(!synthesize(tampered, hash).is_satisfied().unwrap());
}

/// A declared after-root off by one breaks the closing equality
#[test]
fn test_root_desync() {
    let mut venue = Venue::new();
    let ring = venue.full_fill_ring();
    let batch = venue.state.settle_batch(vec![ring]).unwrap();

    let mut desynced = batch;
    desynced.history_root_after += ScalarField::from(1u64);

    assert!(matches!(
        desynced.validate(),
        Err(SettlementError::RootDiscontinuity(_))
    ));
    // Hash the tampered stream honestly so only the closing constraint fails
    let hash = desynced.public_data_hash();
    assert!(!synthesize(desynced, hash).is_satisfied().unwrap());
}

/// A public input that is not the stream's digest is rejected
#[test]
fn test_hash_mismatch() {
    let mut venue = Venue::new();
    let ring = venue.full_fill_ring();
    let batch = venue.state.settle_batch(vec![ring]).unwrap();

    let wrong = batch.public_data_hash() + ScalarField::from(1u64);
    assert!(matches!(
        batch.validate_public_input(&wrong),
        Err(SettlementError::HashMismatch(_))
    ));
    assert!(!synthesize(batch, wrong).is_satisfied().unwrap());
}

/// A tampered Merkle sibling in the witness breaks the inclusion proof
#[test]
fn test_tampered_sibling() {
    let mut venue = Venue::new();
    let ring = venue.full_fill_ring();
    let batch = venue.state.settle_batch(vec![ring]).unwrap();

    let mut tampered = batch;
    tampered.rings[0].balance_s_a.proof[0] += ScalarField::from(1u64);

    assert!(matches!(
        tampered.validate(),
        Err(SettlementError::MerkleMismatch(_))
    ));
    let hash = tampered.public_data_hash();
    assert!(!synthesize(tampered, hash).is_satisfied().unwrap());
}

/// The blank circuit used for key generation has the same constraint shape
/// as a real single-ring instance
#[test]
fn test_blank_shape_parity() {
    use ark_relations::r1cs::ConstraintSynthesizer;

    let mut venue = Venue::new();
    let ring = venue.full_fill_ring();
    let batch = venue.state.settle_batch(vec![ring]).unwrap();

    let real_cs = synthesize_honest(batch);

    let blank_cs = ConstraintSystem::<ScalarField>::new_ref();
    SettlementCircuit::blank(1)
        .generate_constraints(blank_cs.clone())
        .unwrap();

    assert_eq!(real_cs.num_constraints(), blank_cs.num_constraints());
    assert_eq!(real_cs.num_witness_variables(), blank_cs.num_witness_variables());
}
