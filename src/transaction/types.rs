//! Transaction types for LedgerSeal

use crate::crypto::{self, Sha256Hash};
use crate::error::LedgerError;
use crate::transaction::amount::{parse_amount, Amount};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Field separator of the plain-text transaction format `sender-receiver-amount`.
pub const DELIMITER: char = '-';

/// Maximum serialized transaction size in bytes
pub const MAX_TRANSACTION_SIZE: usize = 4_096;

/// Domain tag prepended to every canonical message.
const CANONICAL_TAG: &[u8] = b"TRANSFER:";

/// The three fields carried by the wire format, before any signature is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferFields {
    pub sender: String,
    pub receiver: String,
    pub amount: Amount,
}

impl TransferFields {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, amount: Amount) -> Self {
        TransferFields {
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
        }
    }

    /// Parse `sender-receiver-amount`.
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        let fields: Vec<&str> = raw.split(DELIMITER).collect();
        if fields.len() != 3 {
            return Err(LedgerError::MalformedTransaction(format!(
                "Expected 3 fields separated by '{}', got {}",
                DELIMITER,
                fields.len()
            )));
        }
        if fields[0].is_empty() || fields[1].is_empty() {
            return Err(LedgerError::MalformedTransaction(
                "Sender and receiver must not be empty".to_string(),
            ));
        }

        let amount = parse_amount(fields[2])?;
        Ok(Self::new(fields[0], fields[1], amount))
    }

    /// Render the fields back into the wire format.
    pub fn to_wire(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.sender, DELIMITER, self.receiver, DELIMITER, self.amount
        )
    }

    /// Bytes that are signed and verified. They depend only on the parsed values,
    /// so `1`, `1.0` and `1.000` all produce the same message.
    pub fn canonical_message(&self) -> Vec<u8> {
        let mut message = Vec::with_capacity(
            CANONICAL_TAG.len() + self.sender.len() + self.receiver.len() + 10,
        );
        message.extend_from_slice(CANONICAL_TAG);
        message.extend_from_slice(self.sender.as_bytes());
        message.push(0);
        message.extend_from_slice(self.receiver.as_bytes());
        message.push(0);
        message.extend_from_slice(&self.amount.to_le_bytes());
        message
    }
}

/// An admitted transfer. `raw_message` always holds the canonical message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub receiver: String,
    pub amount: Amount,
    #[serde(with = "serde_bytes")]
    pub raw_message: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub signature: Vec<u8>,
}

impl Transaction {
    pub fn new(fields: TransferFields, signature: Vec<u8>) -> Self {
        let raw_message = fields.canonical_message();
        Transaction {
            sender: fields.sender,
            receiver: fields.receiver,
            amount: fields.amount,
            raw_message,
            signature,
        }
    }

    pub fn fields(&self) -> TransferFields {
        TransferFields::new(self.sender.clone(), self.receiver.clone(), self.amount)
    }

    /// Calculate the hash of this transaction
    pub fn hash(&self) -> Sha256Hash {
        let mut hasher = Sha256::new();
        hasher.update("transfer".as_bytes());
        hasher.update(self.sender.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.receiver.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.amount.to_le_bytes());
        hasher.update(&self.signature);
        hasher.finalize().into()
    }

    pub fn hash_str(&self) -> String {
        hex::encode(self.hash())
    }

    /// Detached signature as base64 text.
    pub fn signature_text(&self) -> String {
        crypto::encode_text(&self.signature)
    }

    /// Reject oversized transactions before they reach the pool
    pub fn validate_size(&self) -> Result<(), LedgerError> {
        let size = bincode::serialized_size(self)? as usize;
        if size > MAX_TRANSACTION_SIZE {
            return Err(LedgerError::MalformedTransaction(format!(
                "Transaction too large: {} bytes (max: {})",
                size, MAX_TRANSACTION_SIZE
            )));
        }
        Ok(())
    }
}
