//! Decryption grant table.
//!
//! Every decryptable output the engine produces gets an explicit grant naming
//! exactly the principal entitled to see it: bidders for their own deposits,
//! the requester for a winner identity. Grants are forwarded to the ciphertext
//! runtime's ACL so the external runtime enforces them at decryption time.

use std::collections::HashSet;

use ads_fhe::FheRuntime;
use ads_types::{Handle, Principal};

/// Append-only table of `(principal, handle)` decryption grants.
///
/// A grant, once issued, is permanent; re-issuing is a no-op.
#[derive(Debug, Default)]
pub struct AccessGateway {
    grants: HashSet<(Principal, Handle)>,
}

impl AccessGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `principal` the right to request decryption of `handle`, both in
    /// this table and in the runtime ACL. Idempotent.
    pub fn grant<R: FheRuntime>(&mut self, rt: &mut R, principal: Principal, handle: Handle) {
        self.grants.insert((principal, handle));
        rt.grant_decrypt(principal, handle);
    }

    /// Whether `principal` holds a grant on `handle`.
    pub fn check(&self, principal: &Principal, handle: &Handle) -> bool {
        self.grants.contains(&(*principal, *handle))
    }

    /// Number of grants ever issued.
    pub fn grant_count(&self) -> usize {
        self.grants.len()
    }
}
