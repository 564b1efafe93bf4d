//! Homomorphic scoring and private argmax over the bidder set.
//!
//! Nothing here branches on secret data: comparison results stay encrypted
//! and both fold registers advance through ciphertext muxes. The whole bidder
//! set is scanned on every call, in insertion order, with no early exit.

use ads_fhe::FheRuntime;
use ads_types::{EncryptedAddress, EncryptedUint, Principal};

use crate::error::EngineError;
use crate::state::LedgerState;

/// Per-bidder output of a winner selection.
pub struct BidderOutcome {
    pub principal: Principal,

    /// The bidder's weighted score for this query.
    pub score: EncryptedUint,

    /// Encrypted 0/1 flag: 1 iff this bidder is the selected winner.
    /// Multiplying by it applies a value to the winner and an encryption of
    /// zero to everyone else.
    pub is_winner: EncryptedUint,
}

/// Result of a winner selection.
pub struct WinnerSelection {
    /// Encrypted identity of the selected bidder.
    pub winner: EncryptedAddress,

    /// The winning score.
    pub best_score: EncryptedUint,

    /// One outcome per bidder, in insertion order.
    pub outcomes: Vec<BidderOutcome>,
}

/// Weighted score of one bid: `sum(weights[i] * query[i])`.
///
/// A record whose weights are shorter than the query scores the missing
/// criteria as zero; a withdrawn-and-never-rebid record therefore still
/// participates with its stale weights, as the bidder set requires.
pub fn score<R: FheRuntime>(
    rt: &mut R,
    weights: &[EncryptedUint],
    query: &[EncryptedUint],
) -> Result<EncryptedUint, EngineError> {
    let mut acc = rt.trivial_uint(0);
    for (weight, criterion) in weights.iter().zip(query) {
        let term = rt.mul(*weight, *criterion)?;
        acc = rt.add(acc, term)?;
    }
    Ok(acc)
}

/// Select the bidder with the highest weighted score for `query`.
///
/// Strict greater-than drives the fold, so the first bidder in insertion
/// order to reach the maximum wins ties.
pub fn select_winner<R: FheRuntime>(
    state: &LedgerState,
    rt: &mut R,
    query: &[EncryptedUint],
) -> Result<WinnerSelection, EngineError> {
    let mut scored: Vec<(Principal, EncryptedUint)> = Vec::with_capacity(state.bidder_count());
    for principal in &state.bidders {
        let weights = state
            .get_bid(principal)
            .map(|record| record.weights.as_slice())
            .unwrap_or(&[]);
        scored.push((*principal, score(rt, weights, query)?));
    }

    let (first, rest) = scored.split_first().ok_or(EngineError::EmptyAuction)?;
    let mut best_score = first.1;
    let mut best = rt.trivial_address(first.0);
    for (principal, candidate_score) in rest {
        let is_better = rt.gt(*candidate_score, best_score)?;
        best_score = rt.select(is_better, *candidate_score, best_score)?;
        let candidate = rt.trivial_address(*principal);
        best = rt.select_address(is_better, candidate, best)?;
    }

    // Second fixed-cost pass: an encrypted winner flag per bidder, 1 for the
    // first bidder whose score reaches the maximum and 0 for everyone else.
    // `taken` flips to 1 once the winner has been passed.
    let one = rt.trivial_uint(1);
    let zero = rt.trivial_uint(0);
    let mut taken = rt.trivial_uint(0);
    let mut outcomes = Vec::with_capacity(scored.len());
    for (principal, bidder_score) in scored {
        let below = rt.gt(best_score, bidder_score)?;
        let at_max = rt.select(below, zero, one)?;
        let open = rt.sub(one, taken)?;
        let is_winner = rt.mul(at_max, open)?;
        taken = rt.add(taken, is_winner)?;
        outcomes.push(BidderOutcome {
            principal,
            score: bidder_score,
            is_winner,
        });
    }

    Ok(WinnerSelection {
        winner: best,
        best_score,
        outcomes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ads_fhe::MockFhe;
    use ads_types::BidRecord;

    const ENGINE: Principal = [0xEE; 32];

    fn insert_bid(state: &mut LedgerState, rt: &mut MockFhe, owner: Principal, weights: &[u64]) {
        let weights = weights
            .iter()
            .map(|w| rt.encrypt_for(*w, owner))
            .collect();
        state.bids.insert(
            owner,
            BidRecord {
                owner,
                weights,
                deposit: rt.encrypt_for(0, owner),
            },
        );
        state.record_bidder(owner);
    }

    fn query_of(rt: &mut MockFhe, criteria: &[u64]) -> Vec<EncryptedUint> {
        criteria.iter().map(|c| rt.trivial_uint(*c)).collect()
    }

    fn revealed_winner(rt: &mut MockFhe, selection: &WinnerSelection) -> Principal {
        let observer: Principal = [0xAA; 32];
        rt.grant_decrypt(observer, selection.winner.0);
        rt.reveal_address(observer, selection.winner).unwrap()
    }

    #[test]
    fn test_score_dot_product() {
        let mut rt = MockFhe::new();
        let weights: Vec<_> = [2u64, 3, 4].iter().map(|w| rt.trivial_uint(*w)).collect();
        let query = query_of(&mut rt, &[10, 100, 1000]);

        let result = score(&mut rt, &weights, &query).unwrap();
        assert_eq!(rt.plaintext(result), Some(2 * 10 + 3 * 100 + 4 * 1000));
    }

    #[test]
    fn test_argmax_selects_highest_score() {
        let mut rt = MockFhe::new();
        let mut state = LedgerState::new(ENGINE);
        let alice = [1u8; 32];
        let bob = [2u8; 32];
        let carol = [3u8; 32];

        insert_bid(&mut state, &mut rt, alice, &[1000, 1000, 1000]);
        insert_bid(&mut state, &mut rt, bob, &[2000, 1000, 5000]);
        insert_bid(&mut state, &mut rt, carol, &[100, 100, 100]);

        let query = query_of(&mut rt, &[1, 1, 1]);
        let selection = select_winner(&state, &mut rt, &query).unwrap();

        assert_eq!(revealed_winner(&mut rt, &selection), bob);
        assert_eq!(rt.plaintext(selection.best_score), Some(8000));
    }

    #[test]
    fn test_tie_breaks_to_first_bidder() {
        let mut rt = MockFhe::new();
        let mut state = LedgerState::new(ENGINE);
        let alice = [1u8; 32];
        let bob = [2u8; 32];

        insert_bid(&mut state, &mut rt, alice, &[500, 500, 500]);
        insert_bid(&mut state, &mut rt, bob, &[500, 500, 500]);

        let query = query_of(&mut rt, &[1, 2, 3]);
        let selection = select_winner(&state, &mut rt, &query).unwrap();

        assert_eq!(revealed_winner(&mut rt, &selection), alice);
    }

    #[test]
    fn test_exactly_one_winner_flag() {
        let mut rt = MockFhe::new();
        let mut state = LedgerState::new(ENGINE);
        let alice = [1u8; 32];
        let bob = [2u8; 32];
        let carol = [3u8; 32];

        insert_bid(&mut state, &mut rt, alice, &[7, 7, 7]);
        insert_bid(&mut state, &mut rt, bob, &[9, 9, 9]);
        insert_bid(&mut state, &mut rt, carol, &[9, 9, 9]);

        let query = query_of(&mut rt, &[1, 1, 1]);
        let selection = select_winner(&state, &mut rt, &query).unwrap();

        let flags: Vec<u64> = selection
            .outcomes
            .iter()
            .map(|outcome| rt.plaintext(outcome.is_winner).unwrap())
            .collect();
        // Bob and Carol tie at the maximum; Bob bid first.
        assert_eq!(flags, vec![0, 1, 0]);
    }

    #[test]
    fn test_single_bidder_wins() {
        let mut rt = MockFhe::new();
        let mut state = LedgerState::new(ENGINE);
        let alice = [1u8; 32];

        insert_bid(&mut state, &mut rt, alice, &[0, 0, 0]);

        let query = query_of(&mut rt, &[1, 1, 1]);
        let selection = select_winner(&state, &mut rt, &query).unwrap();

        assert_eq!(revealed_winner(&mut rt, &selection), alice);
        assert_eq!(rt.plaintext(selection.outcomes[0].is_winner), Some(1));
    }

    #[test]
    fn test_empty_bidder_set() {
        let mut rt = MockFhe::new();
        let state = LedgerState::new(ENGINE);

        let query = query_of(&mut rt, &[1, 1, 1]);
        let result = select_winner(&state, &mut rt, &query);
        assert!(matches!(result, Err(EngineError::EmptyAuction)));
    }
}
