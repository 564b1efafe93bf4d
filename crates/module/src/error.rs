//! Auction engine error types.

use thiserror::Error;

use ads_fhe::FheError;
use ads_token::TokenError;

/// Errors that can occur in the auction engine.
///
/// Every error aborts the in-flight transition entirely; nothing is partially
/// applied. There is no internal retry, callers retry whole transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("input proof verification failed")]
    ProofVerificationFailed,

    #[error("token allowance does not cover the requested deposit")]
    InsufficientAllowance,

    #[error("token balance does not cover the transfer")]
    InsufficientBalance,

    #[error("no settlement recorded for this requester")]
    NoSettlement,

    #[error("decryption requested without a grant")]
    AccessDenied,

    #[error("cannot select a winner from an empty bidder set")]
    EmptyAuction,

    #[error("expected {expected} criteria, got {got}")]
    CriteriaMismatch { expected: usize, got: usize },

    #[error("unknown ciphertext handle")]
    UnknownHandle,
}

impl From<FheError> for EngineError {
    fn from(err: FheError) -> Self {
        match err {
            FheError::ProofVerificationFailed => Self::ProofVerificationFailed,
            FheError::AccessDenied => Self::AccessDenied,
            FheError::UnknownHandle(_) => Self::UnknownHandle,
        }
    }
}

impl From<TokenError> for EngineError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InsufficientAllowance => Self::InsufficientAllowance,
            TokenError::InsufficientBalance => Self::InsufficientBalance,
            TokenError::Fhe(inner) => inner.into(),
        }
    }
}
