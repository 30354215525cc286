//! Nullable authorization verifier.

use std::collections::HashSet;
use std::sync::Mutex;

use xdag_crypto::AuthorizationVerifier;
use xdag_types::{Address, Block, PublicKey};

/// Authorizes inputs without looking at signatures.
///
/// By default every input whose candidate set is non-empty passes. Keys can
/// be revoked to exercise the unauthorized path.
#[derive(Debug, Default)]
pub struct NullVerifier {
    revoked: Mutex<HashSet<PublicKey>>,
    reject_all: bool,
}

impl NullVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting() -> Self {
        Self {
            revoked: Mutex::new(HashSet::new()),
            reject_all: true,
        }
    }

    pub fn revoke(&self, key: PublicKey) {
        self.revoked.lock().unwrap().insert(key);
    }
}

impl AuthorizationVerifier for NullVerifier {
    fn verify(&self, _block: &Block, _link: &Address, candidate_keys: &[PublicKey]) -> bool {
        if self.reject_all {
            return false;
        }
        let revoked = self.revoked.lock().unwrap();
        candidate_keys.iter().any(|k| !revoked.contains(k))
    }
}
