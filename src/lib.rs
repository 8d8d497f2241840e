//! LedgerSeal - a single-node ledger of signed transfers sealed by proof-of-work
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Ledger State
//! - [`ledger`] - Server-facing API: register, submit, seal
//! - [`directory`] - Participant records and balances
//! - [`transaction`] - Wire format, canonical messages and admission checks
//! - [`mempool`] - Pending pool of admitted transactions
//!
//! ## Sealing
//! - [`block`] - Sealed block structure and verification
//! - [`miner`] - Difficulty predicates and parallel nonce search
//!
//! ## Cryptography
//! - [`crypto`] - secp256k1 keys, SHA-256 and base64 text encoding
//! - [`signature`] - Boolean sign/verify wrapper
//! - [`client`] - Registrant-side signing handle
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Ledger State
// ============================================================================
pub mod directory;
pub mod ledger;
pub mod mempool;
pub mod transaction;

// ============================================================================
// Sealing
// ============================================================================
pub mod block;
pub mod miner;

// ============================================================================
// Cryptography
// ============================================================================
pub mod client;
pub mod crypto;
pub mod signature;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use block::Block;
pub use client::{Client, SignedTransfer};
pub use config::{load_config, LedgerConfig};
pub use error::LedgerError;
pub use ledger::{Accepted, Ledger};
pub use miner::{DifficultyPredicate, LeadingZeroBits};
pub use transaction::{Amount, Transaction};
