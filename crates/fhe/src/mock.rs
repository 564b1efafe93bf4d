//! In-memory mock coprocessor.
//!
//! Backs every handle with its plaintext in a table, which makes homomorphic
//! semantics trivial to model and lets tests reconcile encrypted state against
//! plaintext expectations. This is a development stand-in for a real FHE
//! coprocessor, in the same way the rest of the system treats chain execution
//! as a simplified in-memory representation.

use std::collections::{HashMap, HashSet};

use ads_types::{
    CiphertextInput, EncryptedAddress, EncryptedBool, EncryptedUint, Handle, InputContext,
    InputProof, Principal,
};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{FheError, FheRuntime};

/// An externally-created ciphertext awaiting proof verification.
#[derive(Debug, Clone)]
struct PendingInput {
    value: u64,
    submitter: Principal,
    engine: Principal,
}

/// Plaintext-backed mock of the ciphertext runtime.
#[derive(Debug, Default)]
pub struct MockFhe {
    /// Admitted integer plaintexts by handle.
    uints: HashMap<Handle, u64>,
    /// Admitted principal plaintexts by handle.
    addresses: HashMap<Handle, Principal>,
    /// Comparison results by handle.
    bools: HashMap<Handle, bool>,
    /// Submitting principal per externally-submitted handle (self-access).
    owners: HashMap<Handle, Principal>,
    /// Decryption grants. Append-only.
    acl: HashSet<(Principal, Handle)>,
    /// Inputs created via [`MockFhe::encrypt_input`], not yet verified.
    pending: HashMap<Handle, PendingInput>,
    /// Monotonic counter for handle derivation.
    counter: u64,
}

impl MockFhe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encrypted input the way a client-side SDK would: the
    /// resulting ciphertext is bound to `(submitter, engine)` and unusable
    /// until the engine verifies it.
    pub fn encrypt_input(
        &mut self,
        value: u64,
        submitter: Principal,
        engine: Principal,
    ) -> CiphertextInput {
        let handle = self.fresh_handle(b"input");
        self.pending.insert(
            handle,
            PendingInput {
                value,
                submitter,
                engine,
            },
        );
        CiphertextInput {
            handle,
            proof: InputProof(input_binding(&handle, &submitter, &engine)),
        }
    }

    /// Encrypt a value directly under a principal's own key, e.g. an
    /// allowance amount handed straight to the token.
    pub fn encrypt_for(&mut self, value: u64, owner: Principal) -> EncryptedUint {
        let handle = self.fresh_handle(b"user");
        self.uints.insert(handle, value);
        self.owners.insert(handle, owner);
        EncryptedUint(handle)
    }

    /// Unrestricted plaintext read. For mock collaborators and test
    /// reconciliation only; the engine never calls this.
    pub fn plaintext(&self, ct: EncryptedUint) -> Option<u64> {
        self.uints.get(&ct.0).copied()
    }

    /// Whether `principal` holds an explicit decryption grant on `handle`.
    pub fn is_granted(&self, principal: Principal, handle: Handle) -> bool {
        self.acl.contains(&(principal, handle))
    }

    fn fresh_handle(&mut self, tag: &[u8]) -> Handle {
        let mut hasher = Sha256::new();
        hasher.update(b"ads.fhe.handle.v1:");
        hasher.update(tag);
        hasher.update(self.counter.to_le_bytes());
        self.counter += 1;
        Handle(hasher.finalize().into())
    }

    fn store_uint(&mut self, tag: &[u8], value: u64) -> EncryptedUint {
        let handle = self.fresh_handle(tag);
        self.uints.insert(handle, value);
        EncryptedUint(handle)
    }

    fn uint_value(&self, ct: EncryptedUint) -> Result<u64, FheError> {
        self.uints
            .get(&ct.0)
            .copied()
            .ok_or(FheError::UnknownHandle(ct.0))
    }

    fn may_reveal(&self, caller: Principal, handle: Handle) -> bool {
        self.acl.contains(&(caller, handle)) || self.owners.get(&handle) == Some(&caller)
    }
}

/// MAC binding an input handle to the submitting principal and the engine
/// that will consume it.
fn input_binding(handle: &Handle, submitter: &Principal, engine: &Principal) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"ads.fhe.input-proof.v1:");
    hasher.update(handle.0);
    hasher.update(submitter);
    hasher.update(engine);
    hasher.finalize().into()
}

impl FheRuntime for MockFhe {
    fn verify_input(
        &mut self,
        input: &CiphertextInput,
        submitter: Principal,
        context: &InputContext,
    ) -> Result<EncryptedUint, FheError> {
        let expected = input_binding(&input.handle, &submitter, &context.engine);
        if input.proof.0 != expected {
            return Err(FheError::ProofVerificationFailed);
        }

        let pending = self
            .pending
            .get(&input.handle)
            .ok_or(FheError::ProofVerificationFailed)?;
        if pending.submitter != submitter || pending.engine != context.engine {
            return Err(FheError::ProofVerificationFailed);
        }
        // Range assertion carried by the proof.
        if pending.value > context.max_value {
            return Err(FheError::ProofVerificationFailed);
        }

        let value = pending.value;
        self.uints.insert(input.handle, value);
        self.owners.insert(input.handle, submitter);
        debug!(handle = %input.handle.to_hex(), "input admitted");
        Ok(EncryptedUint(input.handle))
    }

    fn add(&mut self, a: EncryptedUint, b: EncryptedUint) -> Result<EncryptedUint, FheError> {
        let result = self.uint_value(a)?.wrapping_add(self.uint_value(b)?);
        Ok(self.store_uint(b"add", result))
    }

    fn sub(&mut self, a: EncryptedUint, b: EncryptedUint) -> Result<EncryptedUint, FheError> {
        let result = self.uint_value(a)?.wrapping_sub(self.uint_value(b)?);
        Ok(self.store_uint(b"sub", result))
    }

    fn mul(&mut self, a: EncryptedUint, b: EncryptedUint) -> Result<EncryptedUint, FheError> {
        let result = self.uint_value(a)?.wrapping_mul(self.uint_value(b)?);
        Ok(self.store_uint(b"mul", result))
    }

    fn gt(&mut self, a: EncryptedUint, b: EncryptedUint) -> Result<EncryptedBool, FheError> {
        let result = self.uint_value(a)? > self.uint_value(b)?;
        let handle = self.fresh_handle(b"gt");
        self.bools.insert(handle, result);
        Ok(EncryptedBool(handle))
    }

    fn select(
        &mut self,
        cond: EncryptedBool,
        if_true: EncryptedUint,
        if_false: EncryptedUint,
    ) -> Result<EncryptedUint, FheError> {
        let cond_value = *self
            .bools
            .get(&cond.0)
            .ok_or(FheError::UnknownHandle(cond.0))?;
        let result = if cond_value {
            self.uint_value(if_true)?
        } else {
            self.uint_value(if_false)?
        };
        Ok(self.store_uint(b"select", result))
    }

    fn select_address(
        &mut self,
        cond: EncryptedBool,
        if_true: EncryptedAddress,
        if_false: EncryptedAddress,
    ) -> Result<EncryptedAddress, FheError> {
        let cond_value = *self
            .bools
            .get(&cond.0)
            .ok_or(FheError::UnknownHandle(cond.0))?;
        let chosen = if cond_value { if_true } else { if_false };
        let value = *self
            .addresses
            .get(&chosen.0)
            .ok_or(FheError::UnknownHandle(chosen.0))?;
        let handle = self.fresh_handle(b"select-addr");
        self.addresses.insert(handle, value);
        Ok(EncryptedAddress(handle))
    }

    fn trivial_uint(&mut self, value: u64) -> EncryptedUint {
        self.store_uint(b"trivial", value)
    }

    fn trivial_address(&mut self, principal: Principal) -> EncryptedAddress {
        let handle = self.fresh_handle(b"trivial-addr");
        self.addresses.insert(handle, principal);
        EncryptedAddress(handle)
    }

    fn grant_decrypt(&mut self, principal: Principal, handle: Handle) {
        if self.acl.insert((principal, handle)) {
            debug!(handle = %handle.to_hex(), "decryption granted");
        }
    }

    fn reveal_uint(&self, caller: Principal, ct: EncryptedUint) -> Result<u64, FheError> {
        if !self.may_reveal(caller, ct.0) {
            return Err(FheError::AccessDenied);
        }
        self.uint_value(ct)
    }

    fn reveal_address(
        &self,
        caller: Principal,
        ct: EncryptedAddress,
    ) -> Result<Principal, FheError> {
        if !self.may_reveal(caller, ct.0) {
            return Err(FheError::AccessDenied);
        }
        self.addresses
            .get(&ct.0)
            .copied()
            .ok_or(FheError::UnknownHandle(ct.0))
    }
}
