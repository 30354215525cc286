//! Ed25519 signing and verification of block payloads.

use ed25519_dalek::{Signer, Verifier, VerifyingKey};
use xdag_types::{PublicKey, Signature};

use crate::keys::KeyPair;

/// Sign a block payload.
pub fn sign_payload(payload: &[u8], keypair: &KeyPair) -> Signature {
    Signature::from_bytes(keypair.signing.sign(payload).to_bytes())
}

/// Verify a signature against a payload and public key.
///
/// Malformed keys verify as `false` rather than erroring.
pub fn verify_signature(payload: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(public_key.as_bytes()) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.to_bytes());
    verifying_key.verify(payload, &dalek_sig).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::keypair_from_seed;

    #[test]
    fn sign_and_verify() {
        let kp = keypair_from_seed(&[1; 32]);
        let sig = sign_payload(b"payload", &kp);
        assert!(verify_signature(b"payload", &sig, &kp.public));
    }

    #[test]
    fn tampered_payload_fails() {
        let kp = keypair_from_seed(&[1; 32]);
        let sig = sign_payload(b"payload", &kp);
        assert!(!verify_signature(b"payload!", &sig, &kp.public));
    }

    #[test]
    fn other_key_fails() {
        let kp = keypair_from_seed(&[1; 32]);
        let other = keypair_from_seed(&[2; 32]);
        let sig = sign_payload(b"payload", &kp);
        assert!(!verify_signature(b"payload", &sig, &other.public));
    }
}
