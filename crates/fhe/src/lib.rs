//! Ciphertext runtime interface for the confidential ad auction engine.
//!
//! The engine never decrypts anything itself: every arithmetic step,
//! comparison, and conditional select is delegated to a coprocessor that
//! operates on opaque handles. This crate defines that consumed interface
//! ([`FheRuntime`]) and ships an in-memory, plaintext-backed implementation
//! ([`mock::MockFhe`]) for development and tests.
//!
//! The cryptographic construction behind the runtime is out of scope here;
//! it is assumed correct and supplied by the execution environment.

use ads_types::{
    CiphertextInput, EncryptedAddress, EncryptedBool, EncryptedUint, Handle, InputContext,
    Principal,
};
use thiserror::Error;

pub mod mock;

pub use mock::MockFhe;

/// Errors surfaced by the ciphertext runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FheError {
    #[error("input proof verification failed")]
    ProofVerificationFailed,

    #[error("decryption requested without a grant")]
    AccessDenied,

    #[error("unknown ciphertext handle {}", .0.to_hex())]
    UnknownHandle(Handle),
}

/// Homomorphic arithmetic, comparison, and access control over handles.
///
/// All operations are synchronous and side-effect-free on failure. Results of
/// arithmetic are fresh handles with no decryption rights attached; rights are
/// granted explicitly through [`FheRuntime::grant_decrypt`].
pub trait FheRuntime {
    /// Verify the proof accompanying an externally-submitted ciphertext and
    /// admit it as a usable encrypted integer.
    ///
    /// The proof must bind the ciphertext to `submitter` and to the engine
    /// named in `context`, and must show the plaintext does not exceed
    /// `context.max_value`.
    fn verify_input(
        &mut self,
        input: &CiphertextInput,
        submitter: Principal,
        context: &InputContext,
    ) -> Result<EncryptedUint, FheError>;

    /// Homomorphic addition in the 64-bit plaintext domain.
    fn add(&mut self, a: EncryptedUint, b: EncryptedUint) -> Result<EncryptedUint, FheError>;

    /// Homomorphic subtraction. Callers guarantee the minuend covers the
    /// subtrahend; no underflow check is available over ciphertexts.
    fn sub(&mut self, a: EncryptedUint, b: EncryptedUint) -> Result<EncryptedUint, FheError>;

    /// Homomorphic multiplication.
    fn mul(&mut self, a: EncryptedUint, b: EncryptedUint) -> Result<EncryptedUint, FheError>;

    /// Strict homomorphic greater-than. The result stays encrypted.
    fn gt(&mut self, a: EncryptedUint, b: EncryptedUint) -> Result<EncryptedBool, FheError>;

    /// Ciphertext mux over integers: `if_true` where `cond` holds, else
    /// `if_false`.
    fn select(
        &mut self,
        cond: EncryptedBool,
        if_true: EncryptedUint,
        if_false: EncryptedUint,
    ) -> Result<EncryptedUint, FheError>;

    /// Ciphertext mux over encrypted principal identities.
    fn select_address(
        &mut self,
        cond: EncryptedBool,
        if_true: EncryptedAddress,
        if_false: EncryptedAddress,
    ) -> Result<EncryptedAddress, FheError>;

    /// Encryption of a public integer constant.
    fn trivial_uint(&mut self, value: u64) -> EncryptedUint;

    /// Encryption of a public principal identity.
    fn trivial_address(&mut self, principal: Principal) -> EncryptedAddress;

    /// Grant `principal` the permanent right to request decryption of
    /// `handle`. Idempotent.
    fn grant_decrypt(&mut self, principal: Principal, handle: Handle);

    /// Decrypt an integer handle on behalf of `caller`. Fails with
    /// [`FheError::AccessDenied`] unless `caller` holds a grant or submitted
    /// the ciphertext themselves.
    fn reveal_uint(&self, caller: Principal, ct: EncryptedUint) -> Result<u64, FheError>;

    /// Decrypt an address handle on behalf of `caller`, under the same access
    /// rules as [`FheRuntime::reveal_uint`].
    fn reveal_address(&self, caller: Principal, ct: EncryptedAddress)
        -> Result<Principal, FheError>;
}
