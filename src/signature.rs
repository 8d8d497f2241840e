//! Signature verifier with a boolean contract.
//!
//! Verification failure is an ordinary outcome here: malformed keys, malformed
//! signatures, bad base64 and mismatches all come back as `false`.

use crate::crypto::{self, KeyPair};
use crate::error::LedgerError;
use tracing::debug;

/// Sign `message` with the keypair's secret key, returning compact signature bytes.
pub fn sign(keypair: &KeyPair, message: &[u8]) -> Result<Vec<u8>, LedgerError> {
    Ok(keypair.sign(message)?.to_vec())
}

/// Sign `message` and return the signature as base64 text.
pub fn sign_text(keypair: &KeyPair, message: &[u8]) -> Result<String, LedgerError> {
    Ok(crypto::encode_text(&sign(keypair, message)?))
}

pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    match crypto::verify_signature(public_key, message, signature) {
        Ok(()) => true,
        Err(e) => {
            debug!("signature rejected: {}", e);
            false
        }
    }
}

/// Like [`verify`], but takes the detached base64 signature text.
pub fn verify_text(public_key: &[u8], message: &[u8], signature_text: &str) -> bool {
    match crypto::decode_text(signature_text) {
        Ok(signature) => verify(public_key, message, &signature),
        Err(e) => {
            debug!("signature text rejected: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let keypair = KeyPair::generate().unwrap();
        let signature = sign(&keypair, b"payload").unwrap();
        assert!(verify(&keypair.public_key_bytes(), b"payload", &signature));
        assert!(!verify(&keypair.public_key_bytes(), b"payloaD", &signature));
    }

    #[test]
    fn test_verify_never_errors_on_garbage() {
        let keypair = KeyPair::generate().unwrap();
        let pk = keypair.public_key_bytes();

        assert!(!verify(&pk, b"m", &[]));
        assert!(!verify(&pk, b"m", &[0u8; 64]));
        assert!(!verify(&pk[..10], b"m", &[0u8; 64]));
        assert!(!verify(&[0u8; 33], b"m", &[1u8; 64]));
    }

    #[test]
    fn test_text_signatures() {
        let keypair = KeyPair::generate().unwrap();
        let text = sign_text(&keypair, b"payload").unwrap();
        assert!(verify_text(&keypair.public_key_bytes(), b"payload", &text));
        assert!(!verify_text(&keypair.public_key_bytes(), b"payload", "%%%"));
        assert!(!verify_text(&keypair.public_key_bytes(), b"payload", ""));
    }
}
