//! Registrant-side handle holding a participant's secret key
//!
//! The ledger hands a `Client` back from registration and keeps only the public key.

use crate::crypto::{KeyPair, PublicKeyBytes};
use crate::error::LedgerError;
use crate::signature;
use crate::transaction::{parse_amount, TransferFields, DELIMITER};

/// A wire-format transfer plus its detached base64 signature, ready for `submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransfer {
    pub raw: String,
    pub signature: String,
}

#[derive(Debug, Clone)]
pub struct Client {
    id: String,
    keypair: KeyPair,
}

impl Client {
    pub(crate) fn new(id: String, keypair: KeyPair) -> Self {
        Client { id, keypair }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn keypair(&self) -> &KeyPair {
        &self.keypair
    }

    pub fn public_key_bytes(&self) -> PublicKeyBytes {
        self.keypair.public_key_bytes()
    }

    /// Sign arbitrary bytes, returning base64 text.
    pub fn sign(&self, message: &[u8]) -> Result<String, LedgerError> {
        signature::sign_text(&self.keypair, message)
    }

    /// Sign a wire-format transaction. The canonical message of the parsed fields is
    /// what gets signed, not the text itself.
    pub fn sign_transaction(&self, raw: &str) -> Result<String, LedgerError> {
        let fields = TransferFields::parse(raw)?;
        self.sign(&fields.canonical_message())
    }

    /// Build and sign a transfer of `amount` (plain decimal text) to `receiver`.
    pub fn transfer(&self, receiver: &str, amount: &str) -> Result<SignedTransfer, LedgerError> {
        let fields = TransferFields::new(self.id.clone(), receiver, parse_amount(amount)?);
        let raw = format!("{}{}{}{}{}", self.id, DELIMITER, receiver, DELIMITER, amount);
        Ok(SignedTransfer {
            signature: self.sign(&fields.canonical_message())?,
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_keeps_caller_formatting() {
        let client = Client::new("alice".to_string(), KeyPair::generate().unwrap());
        let signed = client.transfer("bob", "1.0").unwrap();
        assert_eq!(signed.raw, "alice-bob-1.0");

        let fields = TransferFields::parse(&signed.raw).unwrap();
        assert!(signature::verify_text(
            &client.public_key_bytes(),
            &fields.canonical_message(),
            &signed.signature
        ));
    }

    #[test]
    fn test_sign_transaction_matches_transfer() {
        let client = Client::new("alice".to_string(), KeyPair::generate().unwrap());
        let signed = client.sign_transaction("alice-bob-2").unwrap();

        let canonical = TransferFields::parse("alice-bob-2.00").unwrap().canonical_message();
        assert!(signature::verify_text(
            &client.public_key_bytes(),
            &canonical,
            &signed
        ));
    }

    #[test]
    fn test_transfer_rejects_bad_amount() {
        let client = Client::new("alice".to_string(), KeyPair::generate().unwrap());
        assert!(matches!(
            client.transfer("bob", "1e3"),
            Err(LedgerError::MalformedTransaction(_))
        ));
    }
}
