//! Call handlers for the auction engine.
//!
//! These functions implement the business logic for each entry point. Each
//! handler is one atomic transition: every fallible step (proof verification,
//! token pull) is ordered before the first ledger mutation, so a failure
//! aborts with nothing partially applied.

use ads_fhe::FheRuntime;
use ads_token::ConfidentialToken;
use ads_types::{
    CiphertextInput, EncryptedAddress, EncryptedUint, InputContext, Principal, SettlementRecord,
};
use tracing::info;

use crate::error::EngineError;
use crate::genesis::EngineConfig;
use crate::pricing::PricingRule;
use crate::state::LedgerState;
use crate::{escrow, selector};

/// Context provided by the execution environment for each call.
pub struct CallContext {
    /// Sender of the transaction
    pub sender: Principal,
    /// Current timestamp
    pub timestamp: u64,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, EngineError>;

/// Handle `bid`: register or replace the sender's encrypted criterion weights
/// and pull their encrypted collateral into escrow.
///
/// Weights replace wholesale; deposits accumulate. Nothing about other
/// bidders is returned or leaked.
pub fn handle_bid<R, T>(
    state: &mut LedgerState,
    rt: &mut R,
    token: &mut T,
    config: &EngineConfig,
    ctx: &CallContext,
    weights: &[CiphertextInput],
    deposit: &CiphertextInput,
) -> HandlerResult<()>
where
    R: FheRuntime,
    T: ConfidentialToken<Runtime = R>,
{
    if weights.len() != config.criteria {
        return Err(EngineError::CriteriaMismatch {
            expected: config.criteria,
            got: weights.len(),
        });
    }

    let weight_context = InputContext {
        engine: state.engine,
        max_value: config.max_weight,
    };
    let mut verified = Vec::with_capacity(weights.len());
    for input in weights {
        verified.push(rt.verify_input(input, ctx.sender, &weight_context)?);
    }

    let deposit_context = InputContext {
        engine: state.engine,
        max_value: config.max_deposit,
    };
    let deposit = rt.verify_input(deposit, ctx.sender, &deposit_context)?;

    // The token pull is the last fallible step; weights and the bidder set
    // are only touched once it has succeeded.
    escrow::deposit(state, rt, token, ctx.sender, deposit)?;

    if let Some(record) = state.get_bid_mut(&ctx.sender) {
        record.weights = verified;
    }
    state.record_bidder(ctx.sender);

    info!(
        bidder = %hex::encode(ctx.sender),
        bidders = state.bidder_count(),
        "bid recorded"
    );
    Ok(())
}

/// Handle `withdraw`: return the sender's full remaining deposit through the
/// confidential token and zero the stored deposit.
pub fn handle_withdraw<R, T>(
    state: &mut LedgerState,
    rt: &mut R,
    token: &mut T,
    ctx: &CallContext,
) -> HandlerResult<()>
where
    R: FheRuntime,
    T: ConfidentialToken<Runtime = R>,
{
    escrow::withdraw(state, rt, token, ctx.sender)?;
    info!(bidder = %hex::encode(ctx.sender), "deposit withdrawn");
    Ok(())
}

/// Handle `get_deposit`: expose the sender's own deposit handle and grant
/// them decryption of it. A principal that never bid gets an encryption of
/// zero.
pub fn handle_get_deposit<R: FheRuntime>(
    state: &mut LedgerState,
    rt: &mut R,
    ctx: &CallContext,
) -> HandlerResult<EncryptedUint> {
    let deposit = match state.get_bid(&ctx.sender) {
        Some(record) => record.deposit,
        None => rt.trivial_uint(0),
    };
    state.access.grant(rt, ctx.sender, deposit.0);
    Ok(deposit)
}

/// Handle `compute_ad_provider`: privately select the bidder whose weighted
/// score is highest for the sender's encrypted query, settle the winner's
/// charge, and grant the sender decryption of the winner's identity.
pub fn handle_compute_ad_provider<R, P>(
    state: &mut LedgerState,
    rt: &mut R,
    config: &EngineConfig,
    pricing: &P,
    ctx: &CallContext,
    query: &[CiphertextInput],
) -> HandlerResult<EncryptedAddress>
where
    R: FheRuntime,
    P: PricingRule,
{
    if query.len() != config.criteria {
        return Err(EngineError::CriteriaMismatch {
            expected: config.criteria,
            got: query.len(),
        });
    }

    let query_context = InputContext {
        engine: state.engine,
        max_value: config.max_weight,
    };
    let mut criteria = Vec::with_capacity(query.len());
    for input in query {
        criteria.push(rt.verify_input(input, ctx.sender, &query_context)?);
    }

    let selection = selector::select_winner(state, rt, &criteria)?;

    // Oblivious settlement: every bidder is charged, the losers by an
    // encryption of zero. The per-bidder clamp keeps each candidate charge
    // within that bidder's own deposit.
    for outcome in &selection.outcomes {
        let deposit = match state.get_bid(&outcome.principal) {
            Some(record) => record.deposit,
            None => continue,
        };
        let candidate_charge = pricing.charge_amount(rt, outcome.score, deposit)?;
        let amount = rt.mul(outcome.is_winner, candidate_charge)?;
        escrow::charge(state, rt, outcome.principal, amount)?;
    }

    let num_bidders = selection.outcomes.len() as u32;
    state.settlements.insert(
        ctx.sender,
        SettlementRecord {
            requester: ctx.sender,
            winner: selection.winner,
            num_bidders,
            timestamp: ctx.timestamp,
        },
    );
    state.access.grant(rt, ctx.sender, selection.winner.0);

    info!(
        requester = %hex::encode(ctx.sender),
        bidders = num_bidders,
        "winner selected"
    );
    Ok(selection.winner)
}

/// Handle `get_ad_provider`: the sender's most recent winner handle.
pub fn handle_get_ad_provider(
    state: &LedgerState,
    ctx: &CallContext,
) -> HandlerResult<EncryptedAddress> {
    state
        .get_settlement(&ctx.sender)
        .map(|record| record.winner)
        .ok_or(EngineError::NoSettlement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::ScoreCharge;
    use ads_fhe::MockFhe;
    use ads_token::MockToken;

    const ENGINE: Principal = [0xEE; 32];
    const ALICE: Principal = [1u8; 32];
    const BOB: Principal = [2u8; 32];
    const CAROL: Principal = [3u8; 32];

    fn setup() -> (MockFhe, MockToken, LedgerState, EngineConfig) {
        (
            MockFhe::new(),
            MockToken::new(),
            LedgerState::new(ENGINE),
            EngineConfig::default(),
        )
    }

    fn ctx(sender: Principal) -> CallContext {
        CallContext {
            sender,
            timestamp: 1000,
        }
    }

    fn fund(rt: &mut MockFhe, token: &mut MockToken, who: Principal, amount: u64) {
        token.mint(rt, who, amount).unwrap();
        let allowance = rt.encrypt_for(amount, who);
        token.approve(rt, who, ENGINE, allowance).unwrap();
    }

    fn bid_inputs(
        rt: &mut MockFhe,
        who: Principal,
        weights: &[u64],
        deposit: u64,
    ) -> (Vec<CiphertextInput>, CiphertextInput) {
        let weights = weights
            .iter()
            .map(|w| rt.encrypt_input(*w, who, ENGINE))
            .collect();
        (weights, rt.encrypt_input(deposit, who, ENGINE))
    }

    fn query_inputs(rt: &mut MockFhe, who: Principal, criteria: &[u64]) -> Vec<CiphertextInput> {
        criteria
            .iter()
            .map(|c| rt.encrypt_input(*c, who, ENGINE))
            .collect()
    }

    fn deposit_plaintext(rt: &MockFhe, state: &LedgerState, who: &Principal) -> u64 {
        rt.plaintext(state.get_bid(who).unwrap().deposit).unwrap()
    }

    #[test]
    fn test_bid_registers_bidder() {
        let (mut rt, mut token, mut state, config) = setup();
        fund(&mut rt, &mut token, ALICE, 10_000);

        let (weights, deposit) = bid_inputs(&mut rt, ALICE, &[1, 2, 3], 10_000);
        handle_bid(&mut state, &mut rt, &mut token, &config, &ctx(ALICE), &weights, &deposit)
            .unwrap();

        assert!(state.is_bidder(&ALICE));
        assert_eq!(deposit_plaintext(&rt, &state, &ALICE), 10_000);
        assert_eq!(token.debug_balance(&ENGINE), 10_000);
        assert_eq!(token.debug_balance(&ALICE), 0);
    }

    #[test]
    fn test_bid_wrong_arity() {
        let (mut rt, mut token, mut state, config) = setup();
        fund(&mut rt, &mut token, ALICE, 10_000);

        let (weights, deposit) = bid_inputs(&mut rt, ALICE, &[1, 2], 10_000);
        let result = handle_bid(
            &mut state, &mut rt, &mut token, &config, &ctx(ALICE), &weights, &deposit,
        );
        assert_eq!(
            result,
            Err(EngineError::CriteriaMismatch { expected: 3, got: 2 })
        );
        assert!(!state.is_bidder(&ALICE));
    }

    #[test]
    fn test_bid_tampered_proof_leaves_state_untouched() {
        let (mut rt, mut token, mut state, config) = setup();
        fund(&mut rt, &mut token, ALICE, 10_000);

        let (mut weights, deposit) = bid_inputs(&mut rt, ALICE, &[1, 2, 3], 10_000);
        weights[1].proof.0[0] ^= 0xFF;

        let result = handle_bid(
            &mut state, &mut rt, &mut token, &config, &ctx(ALICE), &weights, &deposit,
        );
        assert_eq!(result, Err(EngineError::ProofVerificationFailed));
        assert!(!state.is_bidder(&ALICE));
        assert!(state.get_bid(&ALICE).is_none());
        assert_eq!(token.debug_balance(&ALICE), 10_000);
        assert_eq!(token.debug_balance(&ENGINE), 0);
    }

    #[test]
    fn test_bid_insufficient_allowance_leaves_state_untouched() {
        let (mut rt, mut token, mut state, config) = setup();
        token.mint(&mut rt, ALICE, 10_000).unwrap();
        let allowance = rt.encrypt_for(500, ALICE);
        token.approve(&mut rt, ALICE, ENGINE, allowance).unwrap();

        let (weights, deposit) = bid_inputs(&mut rt, ALICE, &[1, 2, 3], 10_000);
        let result = handle_bid(
            &mut state, &mut rt, &mut token, &config, &ctx(ALICE), &weights, &deposit,
        );
        assert_eq!(result, Err(EngineError::InsufficientAllowance));
        assert!(!state.is_bidder(&ALICE));
        assert_eq!(token.debug_balance(&ALICE), 10_000);
    }

    #[test]
    fn test_rebid_replaces_weights_and_accumulates_deposit() {
        let (mut rt, mut token, mut state, config) = setup();
        fund(&mut rt, &mut token, ALICE, 10_000);

        let (weights, deposit) = bid_inputs(&mut rt, ALICE, &[1, 2, 3], 4000);
        handle_bid(&mut state, &mut rt, &mut token, &config, &ctx(ALICE), &weights, &deposit)
            .unwrap();

        let (weights, deposit) = bid_inputs(&mut rt, ALICE, &[9, 8, 7], 2500);
        handle_bid(&mut state, &mut rt, &mut token, &config, &ctx(ALICE), &weights, &deposit)
            .unwrap();

        assert_eq!(state.bidder_count(), 1);
        assert_eq!(deposit_plaintext(&rt, &state, &ALICE), 6500);
        let stored: Vec<u64> = state
            .get_bid(&ALICE)
            .unwrap()
            .weights
            .iter()
            .map(|w| rt.plaintext(*w).unwrap())
            .collect();
        assert_eq!(stored, vec![9, 8, 7]);
    }

    #[test]
    fn test_compute_selects_winner_and_settles() {
        let (mut rt, mut token, mut state, config) = setup();
        fund(&mut rt, &mut token, ALICE, 10_000);
        fund(&mut rt, &mut token, BOB, 10_000);

        let (weights, deposit) = bid_inputs(&mut rt, ALICE, &[1000, 1000, 1000], 10_000);
        handle_bid(&mut state, &mut rt, &mut token, &config, &ctx(ALICE), &weights, &deposit)
            .unwrap();
        let (weights, deposit) = bid_inputs(&mut rt, BOB, &[2000, 1000, 5000], 10_000);
        handle_bid(&mut state, &mut rt, &mut token, &config, &ctx(BOB), &weights, &deposit)
            .unwrap();

        let query = query_inputs(&mut rt, CAROL, &[1, 1, 1]);
        let winner = handle_compute_ad_provider(
            &mut state, &mut rt, &config, &ScoreCharge, &ctx(CAROL), &query,
        )
        .unwrap();

        assert_eq!(rt.reveal_address(CAROL, winner).unwrap(), BOB);
        // Bob pays his score of 8000; Alice is charged an encryption of zero.
        assert_eq!(deposit_plaintext(&rt, &state, &BOB), 2000);
        assert_eq!(deposit_plaintext(&rt, &state, &ALICE), 10_000);
    }

    #[test]
    fn test_winner_identity_is_private_to_requester() {
        let (mut rt, mut token, mut state, config) = setup();
        fund(&mut rt, &mut token, ALICE, 10_000);

        let (weights, deposit) = bid_inputs(&mut rt, ALICE, &[1, 1, 1], 10_000);
        handle_bid(&mut state, &mut rt, &mut token, &config, &ctx(ALICE), &weights, &deposit)
            .unwrap();

        let query = query_inputs(&mut rt, CAROL, &[1, 1, 1]);
        let winner = handle_compute_ad_provider(
            &mut state, &mut rt, &config, &ScoreCharge, &ctx(CAROL), &query,
        )
        .unwrap();

        assert!(state.access.check(&CAROL, &winner.0));
        assert!(rt.reveal_address(BOB, winner).is_err());
        assert_eq!(rt.reveal_address(CAROL, winner).unwrap(), ALICE);
    }

    #[test]
    fn test_compute_empty_auction() {
        let (mut rt, _token, mut state, config) = setup();

        let query = query_inputs(&mut rt, CAROL, &[1, 1, 1]);
        let result = handle_compute_ad_provider(
            &mut state, &mut rt, &config, &ScoreCharge, &ctx(CAROL), &query,
        );
        assert!(matches!(result, Err(EngineError::EmptyAuction)));
        assert!(state.get_settlement(&CAROL).is_none());
    }

    #[test]
    fn test_get_ad_provider_requires_settlement() {
        let (_rt, _token, state, _config) = setup();
        let result = handle_get_ad_provider(&state, &ctx(CAROL));
        assert_eq!(result, Err(EngineError::NoSettlement));
    }

    #[test]
    fn test_get_ad_provider_returns_latest() {
        let (mut rt, mut token, mut state, config) = setup();
        fund(&mut rt, &mut token, ALICE, 10_000);
        fund(&mut rt, &mut token, BOB, 10_000);

        // Alice dominates criterion 0, Bob criterion 2.
        let (weights, deposit) = bid_inputs(&mut rt, ALICE, &[100, 0, 0], 10_000);
        handle_bid(&mut state, &mut rt, &mut token, &config, &ctx(ALICE), &weights, &deposit)
            .unwrap();
        let (weights, deposit) = bid_inputs(&mut rt, BOB, &[0, 0, 100], 10_000);
        handle_bid(&mut state, &mut rt, &mut token, &config, &ctx(BOB), &weights, &deposit)
            .unwrap();

        let query = query_inputs(&mut rt, CAROL, &[1, 0, 0]);
        handle_compute_ad_provider(&mut state, &mut rt, &config, &ScoreCharge, &ctx(CAROL), &query)
            .unwrap();
        let first = handle_get_ad_provider(&state, &ctx(CAROL)).unwrap();
        assert_eq!(rt.reveal_address(CAROL, first).unwrap(), ALICE);

        let query = query_inputs(&mut rt, CAROL, &[0, 0, 1]);
        handle_compute_ad_provider(&mut state, &mut rt, &config, &ScoreCharge, &ctx(CAROL), &query)
            .unwrap();
        let second = handle_get_ad_provider(&state, &ctx(CAROL)).unwrap();
        assert_eq!(rt.reveal_address(CAROL, second).unwrap(), BOB);
    }

    #[test]
    fn test_get_deposit_grants_self_only() {
        let (mut rt, mut token, mut state, config) = setup();
        fund(&mut rt, &mut token, ALICE, 10_000);

        let (weights, deposit) = bid_inputs(&mut rt, ALICE, &[1, 2, 3], 7000);
        handle_bid(&mut state, &mut rt, &mut token, &config, &ctx(ALICE), &weights, &deposit)
            .unwrap();

        let handle = handle_get_deposit(&mut state, &mut rt, &ctx(ALICE)).unwrap();
        assert!(state.access.check(&ALICE, &handle.0));
        assert_eq!(rt.reveal_uint(ALICE, handle).unwrap(), 7000);
        assert!(rt.reveal_uint(BOB, handle).is_err());
    }

    #[test]
    fn test_get_deposit_without_record_is_zero() {
        let (mut rt, _token, mut state, _config) = setup();

        let handle = handle_get_deposit(&mut state, &mut rt, &ctx(BOB)).unwrap();
        assert_eq!(rt.reveal_uint(BOB, handle).unwrap(), 0);
    }
}
