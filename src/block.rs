//! Sealed blocks

use crate::crypto::Sha256Hash;
use crate::miner::DifficultyPredicate;
use crate::transaction::Transaction;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// A batch of transfers sealed by proof-of-work. Only the sealer builds these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    transactions: Vec<Transaction>,
    transactions_root: Sha256Hash,
    nonce: u64,
    digest: Sha256Hash,
    /// Milliseconds since the epoch; metadata only, not covered by the digest.
    timestamp: u64,
    dropped: usize,
}

impl Block {
    pub(crate) fn sealed(
        transactions: Vec<Transaction>,
        transactions_root: Sha256Hash,
        nonce: u64,
        digest: Sha256Hash,
        dropped: usize,
    ) -> Self {
        Block {
            transactions,
            transactions_root,
            nonce,
            digest,
            timestamp: chrono::Utc::now().timestamp_millis() as u64,
            dropped,
        }
    }

    /// SHA-256 over the ordered transaction hashes.
    pub fn calculate_transactions_root(transactions: &[Transaction]) -> Sha256Hash {
        let mut hasher = Sha256::new();
        for tx in transactions {
            hasher.update(tx.hash());
        }
        hasher.finalize().into()
    }

    /// The digest the difficulty predicate is evaluated on.
    pub fn digest_for(transactions_root: &Sha256Hash, nonce: u64) -> Sha256Hash {
        let mut hasher = Sha256::new();
        hasher.update(transactions_root);
        hasher.update(nonce.to_le_bytes());
        hasher.finalize().into()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn transactions_root(&self) -> Sha256Hash {
        self.transactions_root
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn digest(&self) -> Sha256Hash {
        self.digest
    }

    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Pending transactions discarded at seal time because they would overdraw.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Recompute root and digest and check them against `predicate`.
    pub fn verify<P: DifficultyPredicate + ?Sized>(&self, predicate: &P) -> bool {
        let root = Self::calculate_transactions_root(&self.transactions);
        if root != self.transactions_root {
            return false;
        }
        let digest = Self::digest_for(&root, self.nonce);
        digest == self.digest && predicate.is_satisfied(&digest)
    }
}
