//! Engine configuration.
//!
//! The scheme's 64-bit plaintext domain bounds what the engine can score
//! without wrapping: every weight and query criterion is range-checked at
//! input time against `max_weight`, and a validated configuration guarantees
//! that `criteria * max_weight^2`, the largest possible score, fits in the
//! domain.

use serde::{Deserialize, Serialize};

/// Static configuration for the auction engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of criteria per bid and per query (K).
    pub criteria: usize,

    /// Inclusive upper bound asserted by weight and query input proofs.
    pub max_weight: u64,

    /// Inclusive upper bound asserted by deposit input proofs.
    pub max_deposit: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            criteria: 3,
            max_weight: 1 << 20,
            max_deposit: 1 << 40,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.criteria == 0 {
            return Err(ConfigValidationError::InvalidCriteria(
                "criteria count cannot be zero".into(),
            ));
        }

        // Largest possible score: criteria * max_weight^2.
        let headroom = self
            .max_weight
            .checked_mul(self.max_weight)
            .and_then(|square| square.checked_mul(self.criteria as u64));
        if headroom.is_none() {
            return Err(ConfigValidationError::ScoreOverflow(
                "criteria * max_weight^2 exceeds the 64-bit plaintext domain".into(),
            ));
        }

        // Deposits accumulate across repeat bids; keep doubling headroom.
        if self.max_deposit > u64::MAX / 2 {
            return Err(ConfigValidationError::DepositBound(
                "max_deposit leaves no accumulation headroom".into(),
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("invalid criteria count: {0}")]
    InvalidCriteria(String),

    #[error("score domain overflow: {0}")]
    ScoreOverflow(String),

    #[error("invalid deposit bound: {0}")]
    DepositBound(String),
}
