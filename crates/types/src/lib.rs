//! Core type definitions for the confidential ad auction engine.
//!
//! This crate provides the shared data structures used across the auction
//! system: ciphertext handles, externally-submitted encrypted inputs, and the
//! records the settlement ledger stores per bidder and per requester.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

// =========================
// PRINCIPALS AND HANDLES
// =========================

/// Generic account identity (32 bytes)
pub type Principal = [u8; 32];

/// Opaque reference to a ciphertext held by the coprocessor (32 bytes).
///
/// Handles are the only representation of encrypted values the engine ever
/// sees; arithmetic, comparison, and access control all operate on handles.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize,
    Deserialize,
)]
pub struct Handle(pub [u8; 32]);

impl Handle {
    /// Hex rendering for logs and diagnostics.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Handle to an encrypted unsigned integer (64-bit plaintext domain).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize,
    Deserialize,
)]
pub struct EncryptedUint(pub Handle);

/// Handle to an encrypted principal identity.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize,
    Deserialize,
)]
pub struct EncryptedAddress(pub Handle);

/// Handle to an encrypted boolean (comparison result).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize,
    Deserialize,
)]
pub struct EncryptedBool(pub Handle);

// =========================
// EXTERNAL INPUTS
// =========================

/// Proof of plaintext knowledge accompanying an externally-submitted
/// ciphertext. Opaque to the engine; checked by the coprocessor.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct InputProof(pub [u8; 32]);

/// An encrypted value submitted from outside the engine, together with its
/// proof. Every `bid` weight, deposit, and query criterion arrives this way.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct CiphertextInput {
    pub handle: Handle,
    pub proof: InputProof,
}

/// Verification context the engine supplies when accepting an input.
///
/// The proof binds the ciphertext to the submitting principal and to the
/// accepting engine, and asserts the plaintext lies below `max_value`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputContext {
    /// The engine account the input is addressed to.
    pub engine: Principal,
    /// Inclusive plaintext upper bound asserted by the range proof.
    pub max_value: u64,
}

// =========================
// LEDGER RECORDS
// =========================

/// Per-bidder ledger entry. At most one per principal.
///
/// `weights` are replaced wholesale on every repeat bid; `deposit`
/// accumulates across bids and is zeroed by withdrawal.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct BidRecord {
    pub owner: Principal,
    pub weights: Vec<EncryptedUint>,
    pub deposit: EncryptedUint,
}

/// Result of a winner selection, stored per requester.
///
/// `winner` stays encrypted; only the requester is granted decryption.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub requester: Principal,
    pub winner: EncryptedAddress,
    pub num_bidders: u32,
    pub timestamp: u64,
}
