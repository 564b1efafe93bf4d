//! Confidential token interface for the confidential ad auction engine.
//!
//! The auction engine escrows bidder collateral in an encrypted-balance
//! token: deposits are pulled through a previously authorized allowance and
//! refunds are pushed back as encrypted transfers. The engine consumes the
//! [`ConfidentialToken`] trait and never reimplements token semantics; the
//! in-memory [`mock::MockToken`] stands in for a deployed confidential token
//! during development and tests.

use ads_fhe::{FheError, FheRuntime};
use ads_types::{EncryptedUint, Principal};
use thiserror::Error;

pub mod mock;

pub use mock::MockToken;

/// Errors reported by the token. Both abort the calling engine transition
/// before any ledger mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("allowance does not cover the requested pull")]
    InsufficientAllowance,

    #[error("balance does not cover the transfer")]
    InsufficientBalance,

    #[error(transparent)]
    Fhe(#[from] FheError),
}

/// Encrypted-balance ledger with pull-based transfers.
///
/// Implementations are atomic: a failed call leaves balances and allowances
/// untouched.
pub trait ConfidentialToken {
    /// Ciphertext runtime this token settles against.
    type Runtime: FheRuntime;

    /// Credit `to` with a plaintext amount of newly issued tokens.
    fn mint(
        &mut self,
        rt: &mut Self::Runtime,
        to: Principal,
        amount: u64,
    ) -> Result<(), TokenError>;

    /// Authorize `spender` to pull up to `amount` from `owner`'s balance.
    /// Replaces any prior allowance for the pair.
    fn approve(
        &mut self,
        rt: &mut Self::Runtime,
        owner: Principal,
        spender: Principal,
        amount: EncryptedUint,
    ) -> Result<(), TokenError>;

    /// Move `amount` from `from` to `to`.
    fn transfer(
        &mut self,
        rt: &mut Self::Runtime,
        from: Principal,
        to: Principal,
        amount: EncryptedUint,
    ) -> Result<(), TokenError>;

    /// Pull `amount` from `owner` to `to`, consuming `spender`'s allowance.
    fn transfer_from(
        &mut self,
        rt: &mut Self::Runtime,
        spender: Principal,
        owner: Principal,
        to: Principal,
        amount: EncryptedUint,
    ) -> Result<(), TokenError>;

    /// Encrypted balance handle for `who`, readable only by `who`.
    fn balance_of(&mut self, rt: &mut Self::Runtime, who: Principal) -> EncryptedUint;
}
