//! Escrow ledger: per-bidder encrypted deposit accounting.
//!
//! Only the confidential token ever moves value; this module tracks what the
//! engine has pulled per bidder, as ciphertext handles it cannot read.

use ads_fhe::FheRuntime;
use ads_token::ConfidentialToken;
use ads_types::{BidRecord, EncryptedUint, Principal};

use crate::error::EngineError;
use crate::state::LedgerState;

/// Pull `amount` from `principal` through the token's allowance and accrue it
/// onto their deposit, creating the bid record if absent.
///
/// The pull runs first: if the token reports a proof or allowance failure the
/// ledger is untouched.
pub fn deposit<R, T>(
    state: &mut LedgerState,
    rt: &mut R,
    token: &mut T,
    principal: Principal,
    amount: EncryptedUint,
) -> Result<(), EngineError>
where
    R: FheRuntime,
    T: ConfidentialToken<Runtime = R>,
{
    token.transfer_from(rt, state.engine, principal, state.engine, amount)?;

    if let Some(record) = state.bids.get_mut(&principal) {
        record.deposit = rt.add(record.deposit, amount)?;
    } else {
        state.bids.insert(
            principal,
            BidRecord {
                owner: principal,
                weights: Vec::new(),
                deposit: amount,
            },
        );
    }
    Ok(())
}

/// Deduct `amount` from `principal`'s deposit. Settlement hook for the winner
/// selector only.
///
/// Both operands are ciphertexts and no underflow check exists; callers
/// guarantee `amount` never exceeds the current deposit.
pub(crate) fn charge<R: FheRuntime>(
    state: &mut LedgerState,
    rt: &mut R,
    principal: Principal,
    amount: EncryptedUint,
) -> Result<(), EngineError> {
    if let Some(record) = state.bids.get_mut(&principal) {
        record.deposit = rt.sub(record.deposit, amount)?;
    }
    Ok(())
}

/// Push `principal`'s full remaining deposit back through the token and store
/// a fresh encryption of zero.
///
/// Idempotent: a second withdrawal, or one by a principal that never bid,
/// transfers an encryption of zero and does not fail.
pub fn withdraw<R, T>(
    state: &mut LedgerState,
    rt: &mut R,
    token: &mut T,
    principal: Principal,
) -> Result<(), EngineError>
where
    R: FheRuntime,
    T: ConfidentialToken<Runtime = R>,
{
    let deposit = match state.get_bid(&principal) {
        Some(record) => record.deposit,
        None => rt.trivial_uint(0),
    };

    token.transfer(rt, state.engine, principal, deposit)?;

    if let Some(record) = state.bids.get_mut(&principal) {
        record.deposit = rt.trivial_uint(0);
    }
    Ok(())
}
