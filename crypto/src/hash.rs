//! SHA-256 based hashing for blocks and accounts.

use sha2::{Digest, Sha256};
use xdag_types::{AccountId, BlockHash, PublicKey};

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

/// Double SHA-256, the digest XDAG block hashes are built from.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Hash a serialized block to produce its `BlockHash`.
pub fn hash_block(block_bytes: &[u8]) -> BlockHash {
    BlockHash::new(sha256d(block_bytes))
}

/// Derive the account a public key controls: the first 20 bytes of its
/// double SHA-256.
pub fn account_id_from_public_key(key: &PublicKey) -> AccountId {
    let digest = sha256d(key.as_bytes());
    let mut id = [0u8; 20];
    id.copy_from_slice(&digest[..20]);
    AccountId::new(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        // SHA-256("abc")
        let digest = sha256(b"abc");
        assert_eq!(digest[0], 0xba);
        assert_eq!(digest[31], 0xad);
    }

    #[test]
    fn sha256d_is_hash_of_hash() {
        assert_eq!(sha256d(b"xdag"), sha256(&sha256(b"xdag")));
        assert_ne!(sha256d(b"xdag"), sha256(b"xdag"));
    }

    #[test]
    fn hash_block_is_deterministic() {
        let a = hash_block(b"block bytes");
        let b = hash_block(b"block bytes");
        assert_eq!(a, b);
        assert!(!a.is_zero());
    }

    #[test]
    fn account_ids_differ_per_key() {
        let a = account_id_from_public_key(&PublicKey([1; 32]));
        let b = account_id_from_public_key(&PublicKey([2; 32]));
        assert_ne!(a, b);
        assert_eq!(a, account_id_from_public_key(&PublicKey([1; 32])));
    }
}
