//! Pluggable settlement charge policies.
//!
//! The charge is computed and applied entirely over ciphertexts, so a rule
//! sees only the winner's encrypted score and encrypted deposit. Every rule
//! clamps its amount to the deposit, which is what lets the escrow subtract
//! without an underflow check.

use ads_fhe::FheRuntime;
use ads_types::EncryptedUint;

use crate::error::EngineError;

/// Policy deciding what the winning bidder pays at settlement.
pub trait PricingRule {
    /// Encrypted amount to deduct from the winner's deposit. The returned
    /// amount must never exceed `deposit`.
    fn charge_amount<R: FheRuntime>(
        &self,
        rt: &mut R,
        score: EncryptedUint,
        deposit: EncryptedUint,
    ) -> Result<EncryptedUint, EngineError>;
}

/// The winner pays their own weighted score, capped at their deposit.
pub struct ScoreCharge;

impl PricingRule for ScoreCharge {
    fn charge_amount<R: FheRuntime>(
        &self,
        rt: &mut R,
        score: EncryptedUint,
        deposit: EncryptedUint,
    ) -> Result<EncryptedUint, EngineError> {
        clamp_to_deposit(rt, score, deposit)
    }
}

/// The winner pays a fixed fee, capped at their deposit.
pub struct FlatCharge {
    pub amount: u64,
}

impl PricingRule for FlatCharge {
    fn charge_amount<R: FheRuntime>(
        &self,
        rt: &mut R,
        _score: EncryptedUint,
        deposit: EncryptedUint,
    ) -> Result<EncryptedUint, EngineError> {
        let fee = rt.trivial_uint(self.amount);
        clamp_to_deposit(rt, fee, deposit)
    }
}

/// `min(amount, deposit)` via homomorphic compare-and-select.
fn clamp_to_deposit<R: FheRuntime>(
    rt: &mut R,
    amount: EncryptedUint,
    deposit: EncryptedUint,
) -> Result<EncryptedUint, EngineError> {
    let over = rt.gt(amount, deposit)?;
    Ok(rt.select(over, deposit, amount)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ads_fhe::MockFhe;

    #[test]
    fn test_score_charge_below_deposit() {
        let mut rt = MockFhe::new();
        let score = rt.trivial_uint(8000);
        let deposit = rt.trivial_uint(10_000);

        let charge = ScoreCharge.charge_amount(&mut rt, score, deposit).unwrap();
        assert_eq!(rt.plaintext(charge), Some(8000));
    }

    #[test]
    fn test_score_charge_clamps_to_deposit() {
        let mut rt = MockFhe::new();
        let score = rt.trivial_uint(12_000);
        let deposit = rt.trivial_uint(10_000);

        let charge = ScoreCharge.charge_amount(&mut rt, score, deposit).unwrap();
        assert_eq!(rt.plaintext(charge), Some(10_000));
    }

    #[test]
    fn test_flat_charge() {
        let mut rt = MockFhe::new();
        let score = rt.trivial_uint(8000);
        let deposit = rt.trivial_uint(10_000);

        let rule = FlatCharge { amount: 250 };
        let charge = rule.charge_amount(&mut rt, score, deposit).unwrap();
        assert_eq!(rt.plaintext(charge), Some(250));

        let rule = FlatCharge { amount: 50_000 };
        let charge = rule.charge_amount(&mut rt, score, deposit).unwrap();
        assert_eq!(rt.plaintext(charge), Some(10_000));
    }
}
