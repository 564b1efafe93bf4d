//! Call message types for the auction engine.

use ads_types::CiphertextInput;
use borsh::{BorshDeserialize, BorshSerialize};

/// Call messages for the auction engine. Each variant is processed as a
/// single atomic transition.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub enum EngineCall {
    /// Register or replace encrypted per-criterion weights and add encrypted
    /// collateral, pulled through a previously authorized token allowance.
    Bid {
        weights: Vec<CiphertextInput>,
        deposit: CiphertextInput,
    },

    /// Return the sender's full remaining deposit via the confidential token.
    Withdraw,

    /// Expose the sender's deposit handle and grant them decryption of it.
    GetDeposit,

    /// Privately select the best bidder for an encrypted query vector and
    /// grant the sender decryption of the winner's identity.
    ComputeAdProvider { query: Vec<CiphertextInput> },
}
