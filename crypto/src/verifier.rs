//! Input authorization.
//!
//! A block that spends from another block or from an account must prove it
//! controls one of the keys entitled to spend. The consensus core gathers the
//! candidate keys and asks an [`AuthorizationVerifier`] for the verdict.

use xdag_types::{Address, Block, PublicKey};

use crate::sign::verify_signature;

/// Decides whether a block is authorized to spend from a source.
pub trait AuthorizationVerifier: Send + Sync {
    /// `true` if `block` may spend through `link`: it carries a valid
    /// signature by any of `candidate_keys`.
    fn verify(&self, block: &Block, link: &Address, candidate_keys: &[PublicKey]) -> bool;
}

/// Checks Ed25519 signatures over the block payload. The payload covers every
/// link, so one valid signature authorizes all of them.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Verifier;

impl AuthorizationVerifier for Ed25519Verifier {
    fn verify(&self, block: &Block, _link: &Address, candidate_keys: &[PublicKey]) -> bool {
        candidate_keys.iter().any(|key| {
            block
                .signatures
                .iter()
                .any(|sig| verify_signature(&block.payload, sig, key))
        })
    }
}
