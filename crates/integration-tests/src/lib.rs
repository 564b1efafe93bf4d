//! End-to-end integration tests for the confidential ad auction engine.
//!
//! These tests exercise the full auction lifecycle:
//! 1. Mint and approve collateral on the confidential token
//! 2. Encrypted bid submission with input proofs
//! 3. Private winner selection over the full bidder set
//! 4. Settlement of the winner's charge
//! 5. Withdrawal and plaintext reconciliation

#![cfg(test)]

use ads_fhe::{FheRuntime, MockFhe};
use ads_module::{
    handlers, CallContext, EngineConfig, EngineError, FlatCharge, LedgerState, PricingRule,
    ScoreCharge,
};
use ads_token::{ConfidentialToken, MockToken};
use ads_types::{EncryptedAddress, Principal};

use rand::rngs::OsRng;
use rand::Rng;

const ENGINE: Principal = [0xEE; 32];
const ALICE: Principal = [1u8; 32];
const BOB: Principal = [2u8; 32];
const CAROL: Principal = [0xC0; 32];
const DAVE: Principal = [0xD0; 32];

/// Full auction lifecycle: Alice and Bob escrow 10000 each, an advertiser
/// queries (1,1,1), and Bob's (2000,1000,5000) profile wins with a score of
/// 8000 against Alice's 3000.
#[test]
fn test_full_auction_lifecycle() -> anyhow::Result<()> {
    let mut env = TestEnv::new();

    // ========================================
    // Phase 1: Fund bidders
    // ========================================

    env.fund(ALICE, 10_000);
    env.fund(BOB, 20_000);

    // ========================================
    // Phase 2: Encrypted bids
    // ========================================

    env.bid(ALICE, &[1000, 1000, 1000], 10_000)?;
    env.bid(BOB, &[2000, 1000, 5000], 10_000)?;
    println!("2 bids escrowed");

    // ========================================
    // Phase 3: Private winner selection
    // ========================================

    let winner = env.compute(CAROL, &[1, 1, 1])?;
    assert_eq!(env.rt.reveal_address(CAROL, winner)?, BOB);
    println!("Winner revealed to requester: Bob");

    // ========================================
    // Phase 4: Settlement and withdrawal
    // ========================================

    // Alice lost; her collateral comes back whole.
    env.withdraw(ALICE)?;
    assert_eq!(env.balance(ALICE), 10_000);

    // Bob won with a score of 8000 and pays it from his deposit.
    assert_eq!(env.deposit_value(BOB)?, 2000);
    env.withdraw(BOB)?;
    assert_eq!(env.balance(BOB), 20_000 - 10_000 + 2000);

    println!("Settlement reconciled");
    Ok(())
}

/// No bidder with a strictly greater weighted score than the selected winner
/// exists at selection time.
#[test]
fn test_winner_has_no_strictly_better_rival() {
    let mut rng = OsRng;
    let mut env = TestEnv::new();

    let bidders: Vec<Principal> = (1..=8u8).map(|i| [i; 32]).collect();
    let mut profiles = Vec::new();
    for bidder in &bidders {
        let weights: Vec<u64> = (0..3).map(|_| rng.gen_range(0..1000)).collect();
        env.fund(*bidder, 1000);
        env.bid(*bidder, &weights, 1000).unwrap();
        profiles.push(weights);
    }

    let query: Vec<u64> = (0..3).map(|_| rng.gen_range(0..10)).collect();
    let winner = env.compute(CAROL, &query).unwrap();
    let winner = env.rt.reveal_address(CAROL, winner).unwrap();

    let dot = |weights: &[u64]| -> u64 {
        weights.iter().zip(&query).map(|(w, q)| w * q).sum()
    };
    let winner_index = bidders.iter().position(|b| *b == winner).unwrap();
    let winner_score = dot(&profiles[winner_index]);

    for (index, profile) in profiles.iter().enumerate() {
        assert!(
            dot(profile) <= winner_score,
            "bidder {} outscores the selected winner",
            index
        );
        // First-bidder-wins: nobody earlier reaches the same score.
        if index < winner_index {
            assert!(dot(profile) < winner_score);
        }
    }
}

#[test]
fn test_tie_goes_to_earliest_bidder() {
    let mut env = TestEnv::new();
    env.fund(ALICE, 1000);
    env.fund(BOB, 1000);

    env.bid(ALICE, &[10, 20, 30], 1000).unwrap();
    env.bid(BOB, &[10, 20, 30], 1000).unwrap();

    let winner = env.compute(CAROL, &[3, 2, 1]).unwrap();
    assert_eq!(env.rt.reveal_address(CAROL, winner).unwrap(), ALICE);
}

/// A bidder who never wins gets back exactly the sum of everything they ever
/// deposited.
#[test]
fn test_deposit_conservation_for_losers() {
    let mut env = TestEnv::new();
    env.fund(ALICE, 9000);
    env.fund(BOB, 50_000);

    env.bid(ALICE, &[1, 1, 1], 4000).unwrap();
    env.bid(ALICE, &[2, 2, 2], 3000).unwrap();
    env.bid(BOB, &[100, 100, 100], 50_000).unwrap();

    let winner = env.compute(CAROL, &[1, 1, 1]).unwrap();
    assert_eq!(env.rt.reveal_address(CAROL, winner).unwrap(), BOB);

    env.withdraw(ALICE).unwrap();
    assert_eq!(env.balance(ALICE), 9000);
}

/// The engine's token holdings always equal the claimable deposits plus the
/// settlement charges it has retained.
#[test]
fn test_escrow_reconciliation() {
    let mut env = TestEnv::new();
    env.fund(ALICE, 10_000);
    env.fund(BOB, 20_000);

    env.bid(ALICE, &[1000, 1000, 1000], 10_000).unwrap();
    env.bid(BOB, &[2000, 1000, 5000], 10_000).unwrap();
    assert_eq!(env.balance(ENGINE), 20_000);

    env.compute(CAROL, &[1, 1, 1]).unwrap();

    // Bob was charged his score of 8000.
    let claimable = env.deposit_value(ALICE).unwrap() + env.deposit_value(BOB).unwrap();
    assert_eq!(claimable, 12_000);
    assert_eq!(env.balance(ENGINE), claimable + 8000);

    env.withdraw(ALICE).unwrap();
    env.withdraw(BOB).unwrap();
    assert_eq!(env.balance(ENGINE), 8000);

    let minted = env.token.debug_total_minted();
    assert_eq!(
        env.balance(ALICE) + env.balance(BOB) + env.balance(ENGINE),
        minted
    );
}

#[test]
fn test_withdraw_twice_moves_zero_the_second_time() {
    let mut env = TestEnv::new();
    env.fund(ALICE, 5000);
    env.bid(ALICE, &[1, 2, 3], 5000).unwrap();

    env.withdraw(ALICE).unwrap();
    assert_eq!(env.balance(ALICE), 5000);

    env.withdraw(ALICE).unwrap();
    assert_eq!(env.balance(ALICE), 5000);
    assert_eq!(env.balance(ENGINE), 0);
}

#[test]
fn test_withdraw_without_ever_bidding() {
    let mut env = TestEnv::new();

    env.withdraw(DAVE).unwrap();
    assert_eq!(env.balance(DAVE), 0);
    assert_eq!(env.deposit_value(DAVE).unwrap(), 0);
}

/// Only the requester of a selection may decrypt the winner's identity.
#[test]
fn test_winner_identity_access_control() {
    let mut env = TestEnv::new();
    env.fund(ALICE, 1000);
    env.bid(ALICE, &[5, 5, 5], 1000).unwrap();

    let winner = env.compute(CAROL, &[1, 1, 1]).unwrap();

    assert!(env.rt.reveal_address(BOB, winner).is_err());
    assert!(env.rt.reveal_address(ALICE, winner).is_err());
    assert_eq!(env.rt.reveal_address(CAROL, winner).unwrap(), ALICE);

    // A principal that never queried has no settlement to read.
    let result = handlers::handle_get_ad_provider(&env.state, &ctx(DAVE));
    assert_eq!(result, Err(EngineError::NoSettlement));
}

#[test]
fn test_requesters_keep_independent_settlements() {
    let mut env = TestEnv::new();
    env.fund(ALICE, 1000);
    env.fund(BOB, 1000);

    env.bid(ALICE, &[100, 0, 0], 1000).unwrap();
    env.bid(BOB, &[0, 0, 100], 1000).unwrap();

    env.compute(CAROL, &[1, 0, 0]).unwrap();
    env.compute(DAVE, &[0, 0, 1]).unwrap();

    let carol_winner = handlers::handle_get_ad_provider(&env.state, &ctx(CAROL)).unwrap();
    let dave_winner = handlers::handle_get_ad_provider(&env.state, &ctx(DAVE)).unwrap();

    assert_eq!(env.rt.reveal_address(CAROL, carol_winner).unwrap(), ALICE);
    assert_eq!(env.rt.reveal_address(DAVE, dave_winner).unwrap(), BOB);
}

#[test]
fn test_empty_auction_is_deterministic() {
    let mut env = TestEnv::new();
    let result = env.compute(CAROL, &[1, 1, 1]);
    assert!(matches!(result, Err(EngineError::EmptyAuction)));
}

/// The settlement charge policy is pluggable; a flat fee leaves the rest of
/// the winner's deposit intact.
#[test]
fn test_flat_pricing_rule() {
    let mut env = TestEnv::new();
    env.fund(ALICE, 10_000);
    env.bid(ALICE, &[1000, 1000, 1000], 10_000).unwrap();

    let winner = env
        .compute_with(&FlatCharge { amount: 500 }, CAROL, &[1, 1, 1])
        .unwrap();
    assert_eq!(env.rt.reveal_address(CAROL, winner).unwrap(), ALICE);
    assert_eq!(env.deposit_value(ALICE).unwrap(), 9500);
}

// Test harness

struct TestEnv {
    rt: MockFhe,
    token: MockToken,
    state: LedgerState,
    config: EngineConfig,
}

impl TestEnv {
    fn new() -> Self {
        let config = EngineConfig::default();
        config.validate().expect("default config is valid");
        Self {
            rt: MockFhe::new(),
            token: MockToken::new(),
            state: LedgerState::new(ENGINE),
            config,
        }
    }

    /// Mint `amount` for `who` and approve the engine to pull all of it.
    fn fund(&mut self, who: Principal, amount: u64) {
        self.token.mint(&mut self.rt, who, amount).unwrap();
        let allowance = self.rt.encrypt_for(amount, who);
        self.token
            .approve(&mut self.rt, who, ENGINE, allowance)
            .unwrap();
    }

    fn bid(
        &mut self,
        who: Principal,
        weights: &[u64],
        deposit: u64,
    ) -> Result<(), EngineError> {
        let weights: Vec<_> = weights
            .iter()
            .map(|w| self.rt.encrypt_input(*w, who, ENGINE))
            .collect();
        let deposit = self.rt.encrypt_input(deposit, who, ENGINE);
        handlers::handle_bid(
            &mut self.state,
            &mut self.rt,
            &mut self.token,
            &self.config,
            &ctx(who),
            &weights,
            &deposit,
        )
    }

    fn withdraw(&mut self, who: Principal) -> Result<(), EngineError> {
        handlers::handle_withdraw(&mut self.state, &mut self.rt, &mut self.token, &ctx(who))
    }

    fn compute(
        &mut self,
        requester: Principal,
        query: &[u64],
    ) -> Result<EncryptedAddress, EngineError> {
        self.compute_with(&ScoreCharge, requester, query)
    }

    fn compute_with<P: PricingRule>(
        &mut self,
        pricing: &P,
        requester: Principal,
        query: &[u64],
    ) -> Result<EncryptedAddress, EngineError> {
        let query: Vec<_> = query
            .iter()
            .map(|c| self.rt.encrypt_input(*c, requester, ENGINE))
            .collect();
        handlers::handle_compute_ad_provider(
            &mut self.state,
            &mut self.rt,
            &self.config,
            pricing,
            &ctx(requester),
            &query,
        )
    }

    /// The caller's own deposit, read through the self-access grant path.
    fn deposit_value(&mut self, who: Principal) -> Result<u64, EngineError> {
        let handle = handlers::handle_get_deposit(&mut self.state, &mut self.rt, &ctx(who))?;
        Ok(self.rt.reveal_uint(who, handle)?)
    }

    fn balance(&self, who: Principal) -> u64 {
        self.token.debug_balance(&who)
    }
}

fn ctx(sender: Principal) -> CallContext {
    CallContext {
        sender,
        timestamp: 1000,
    }
}
