//! Ed25519 key pairs.

use ed25519_dalek::SigningKey;
use xdag_types::{AccountId, PublicKey};

/// A signing key together with its public half.
#[derive(Clone)]
pub struct KeyPair {
    pub public: PublicKey,
    pub(crate) signing: SigningKey,
}

impl KeyPair {
    pub fn account_id(&self) -> AccountId {
        crate::hash::account_id_from_public_key(&self.public)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair").field("public", &self.public).finish_non_exhaustive()
    }
}

/// Derive a key pair from a 32-byte seed (deterministic).
pub fn keypair_from_seed(seed: &[u8; 32]) -> KeyPair {
    let signing = SigningKey::from_bytes(seed);
    KeyPair {
        public: PublicKey(signing.verifying_key().to_bytes()),
        signing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_derivation_is_deterministic() {
        let a = keypair_from_seed(&[7; 32]);
        let b = keypair_from_seed(&[7; 32]);
        assert_eq!(a.public, b.public);
        assert_eq!(a.account_id(), b.account_id());
    }

    #[test]
    fn debug_hides_secret() {
        let kp = keypair_from_seed(&[7; 32]);
        let text = format!("{kp:?}");
        assert!(text.contains("public"));
        assert!(!text.contains("signing"));
    }
}
