//! Error types for LedgerSeal

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    MalformedTransaction(String),
    UnknownParticipant(String),
    InvalidSignature,
    InsufficientFunds(String),
    DirectoryExhausted(String),
    NotFound(String),
    SealingAborted(String),
    InvalidIdentifier(String),
    PoolFull,
    CryptoError(String),
    ConfigError(String),
    BincodeError(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LedgerError::MalformedTransaction(msg) => write!(f, "Malformed transaction: {}", msg),
            LedgerError::UnknownParticipant(id) => write!(f, "Unknown participant: {}", id),
            LedgerError::InvalidSignature => write!(f, "Invalid signature"),
            LedgerError::InsufficientFunds(msg) => write!(f, "Insufficient funds: {}", msg),
            LedgerError::DirectoryExhausted(id) => {
                write!(f, "Directory exhausted: no free id derived from '{}'", id)
            }
            LedgerError::NotFound(id) => write!(f, "Participant not found: {}", id),
            LedgerError::SealingAborted(msg) => write!(f, "Sealing aborted: {}", msg),
            LedgerError::InvalidIdentifier(msg) => write!(f, "Invalid identifier: {}", msg),
            LedgerError::PoolFull => write!(f, "Pending pool is full"),
            LedgerError::CryptoError(msg) => write!(f, "Cryptographic error: {}", msg),
            LedgerError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            LedgerError::BincodeError(msg) => write!(f, "Bincode error: {}", msg),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<Box<bincode::ErrorKind>> for LedgerError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        LedgerError::BincodeError(err.to_string())
    }
}

impl From<secp256k1::Error> for LedgerError {
    fn from(err: secp256k1::Error) -> Self {
        LedgerError::CryptoError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;
