//! Cryptographic primitives for the XDAG node core.
//!
//! - **SHA-256d** for block hashes and account identifiers
//! - **Ed25519** for signing block payloads and checking input authorization
//! - The [`AuthorizationVerifier`] seam the consensus core calls during import

pub mod hash;
pub mod keys;
pub mod sign;
pub mod verifier;

pub use hash::{account_id_from_public_key, hash_block, sha256, sha256d};
pub use keys::{keypair_from_seed, KeyPair};
pub use sign::{sign_payload, verify_signature};
pub use verifier::{AuthorizationVerifier, Ed25519Verifier};
