//! In-memory mock confidential token.
//!
//! Keeps balances and allowances in plaintext tables and resolves encrypted
//! transfer amounts through the mock coprocessor it colludes with. Sufficiency
//! checks therefore fail loudly (`InsufficientAllowance` /
//! `InsufficientBalance`) instead of silently moving zero, which is what the
//! engine's abort-the-transition contract expects.

use std::collections::HashMap;

use ads_fhe::{FheError, MockFhe};
use ads_types::{EncryptedUint, Principal};
use tracing::debug;

use crate::{ConfidentialToken, TokenError};

/// Plaintext-backed confidential token ledger.
#[derive(Debug, Default)]
pub struct MockToken {
    balances: HashMap<Principal, u64>,
    /// (owner, spender) -> remaining pull allowance.
    allowances: HashMap<(Principal, Principal), u64>,
    total_minted: u64,
}

impl MockToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plaintext balance read for test reconciliation.
    pub fn debug_balance(&self, who: &Principal) -> u64 {
        self.balances.get(who).copied().unwrap_or(0)
    }

    /// Total tokens ever minted, for conservation checks.
    pub fn debug_total_minted(&self) -> u64 {
        self.total_minted
    }

    fn amount_of(&self, rt: &MockFhe, amount: EncryptedUint) -> Result<u64, TokenError> {
        rt.plaintext(amount)
            .ok_or(TokenError::Fhe(FheError::UnknownHandle(amount.0)))
    }
}

impl ConfidentialToken for MockToken {
    type Runtime = MockFhe;

    fn mint(&mut self, _rt: &mut MockFhe, to: Principal, amount: u64) -> Result<(), TokenError> {
        *self.balances.entry(to).or_insert(0) += amount;
        self.total_minted += amount;
        debug!(amount, "minted");
        Ok(())
    }

    fn approve(
        &mut self,
        rt: &mut MockFhe,
        owner: Principal,
        spender: Principal,
        amount: EncryptedUint,
    ) -> Result<(), TokenError> {
        let amount = self.amount_of(rt, amount)?;
        self.allowances.insert((owner, spender), amount);
        Ok(())
    }

    fn transfer(
        &mut self,
        rt: &mut MockFhe,
        from: Principal,
        to: Principal,
        amount: EncryptedUint,
    ) -> Result<(), TokenError> {
        let amount = self.amount_of(rt, amount)?;
        let from_balance = self.debug_balance(&from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance);
        }
        self.balances.insert(from, from_balance - amount);
        *self.balances.entry(to).or_insert(0) += amount;
        Ok(())
    }

    fn transfer_from(
        &mut self,
        rt: &mut MockFhe,
        spender: Principal,
        owner: Principal,
        to: Principal,
        amount: EncryptedUint,
    ) -> Result<(), TokenError> {
        let amount = self.amount_of(rt, amount)?;
        let allowance = self
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(0);
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance);
        }
        let owner_balance = self.debug_balance(&owner);
        if owner_balance < amount {
            return Err(TokenError::InsufficientBalance);
        }

        self.allowances.insert((owner, spender), allowance - amount);
        self.balances.insert(owner, owner_balance - amount);
        *self.balances.entry(to).or_insert(0) += amount;
        debug!(amount, "pulled via allowance");
        Ok(())
    }

    fn balance_of(&mut self, rt: &mut MockFhe, who: Principal) -> EncryptedUint {
        rt.encrypt_for(self.debug_balance(&who), who)
    }
}
