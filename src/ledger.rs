//! The server-facing ledger: registration, submission and sealing
//!
//! Admission and commit are separate phases. `submit` checks a transfer against
//! the balances of the moment and queues it without touching them. `seal`
//! re-walks the queue in order against a running snapshot, drops whatever would
//! now overdraw, searches a nonce without holding any ledger lock, and only then
//! commits the surviving transfers in one step.

use crate::block::Block;
use crate::client::Client;
use crate::config::LedgerConfig;
use crate::crypto::Sha256Hash;
use crate::directory::{IdentityDirectory, Participant};
use crate::error::LedgerError;
use crate::mempool::PendingPool;
use crate::miner::{DifficultyPredicate, LeadingZeroBits, Miner};
use crate::transaction::{validate_submission, Amount, Transaction};
use parking_lot::Mutex;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Receipt for an admitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub sequence: u64,
    pub tx_hash: Sha256Hash,
    pub pending: usize,
}

pub struct Ledger {
    config: LedgerConfig,
    directory: IdentityDirectory,
    pool: PendingPool,
    miner: Miner,
    seal_lock: Mutex<()>,
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        let directory = IdentityDirectory::new(config.directory.clone())?;
        let pool = PendingPool::new(config.pool.max_pending);
        let miner = Miner::new(config.miner.threads)?;

        info!(
            "Ledger ready: {} miner threads, difficulty {} bits",
            miner.workers(),
            config.miner.difficulty_bits
        );
        Ok(Ledger {
            config,
            directory,
            pool,
            miner,
            seal_lock: Mutex::new(()),
        })
    }

    pub fn with_defaults() -> Result<Self, LedgerError> {
        Self::new(LedgerConfig::default())
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn directory(&self) -> &IdentityDirectory {
        &self.directory
    }

    pub fn register(&self, requested_id: &str) -> Result<Client, LedgerError> {
        self.directory.register(requested_id)
    }

    pub fn lookup(&self, id: &str) -> Result<Participant, LedgerError> {
        self.directory.lookup(id)
    }

    pub fn balance_of(&self, id: &str) -> Result<Amount, LedgerError> {
        self.directory.balance_of(id)
    }

    /// Validate a wire-format transfer with its base64 signature and queue it.
    pub fn submit(&self, raw: &str, signature: &str) -> Result<Accepted, LedgerError> {
        let tx = match validate_submission(&self.directory, raw, signature) {
            Ok(tx) => tx,
            Err(e) => {
                warn!("Rejected transaction '{}': {}", raw, e);
                return Err(e);
            }
        };

        let tx_hash = tx.hash();
        let sequence = self.pool.push(tx)?;
        let pending = self.pool.len();
        debug!(
            "Admitted transaction {} as #{} ({} pending)",
            hex::encode(tx_hash),
            sequence,
            pending
        );
        Ok(Accepted {
            sequence,
            tx_hash,
            pending,
        })
    }

    pub fn pending_len(&self) -> usize {
        self.pool.len()
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.pool.transactions()
    }

    /// Evict every pending transaction, returning how many were dropped.
    pub fn reset_pool(&self) -> usize {
        let evicted = self.pool.clear();
        if evicted > 0 {
            warn!("Evicted {} pending transactions", evicted);
        }
        evicted
    }

    /// Seal with the configured `miner.difficulty_bits` and `miner.max_attempts`.
    pub fn seal_default(&self) -> Result<Block, LedgerError> {
        let predicate = LeadingZeroBits(self.config.miner.difficulty_bits);
        self.seal_bounded(&predicate, self.config.miner.max_attempts)
    }

    /// Seal the pending pool, bounded only by `miner.max_attempts` if configured.
    pub fn seal<P: DifficultyPredicate + ?Sized>(&self, predicate: &P) -> Result<Block, LedgerError> {
        self.seal_bounded(predicate, self.config.miner.max_attempts)
    }

    /// Seal the pending pool, giving up with [`LedgerError::SealingAborted`] once
    /// `max_attempts` nonces have failed. An aborted seal changes nothing.
    pub fn seal_bounded<P: DifficultyPredicate + ?Sized>(
        &self,
        predicate: &P,
        max_attempts: Option<u64>,
    ) -> Result<Block, LedgerError> {
        let _sealing = self.seal_lock.lock();

        let entries = self.pool.snapshot();
        let last_sequence = entries.last().map(|entry| entry.sequence);

        let mut sheet = self.directory.snapshot_balances();
        let mut survivors = Vec::with_capacity(entries.len());
        let mut dropped = 0;
        for entry in entries {
            match sheet.transfer(&entry.transaction) {
                Ok(()) => survivors.push(entry.transaction),
                Err(e) => {
                    warn!(
                        "Dropping pending transaction #{} {}->{} ({}): {}",
                        entry.sequence,
                        entry.transaction.sender,
                        entry.transaction.receiver,
                        entry.transaction.amount,
                        e
                    );
                    dropped += 1;
                }
            }
        }

        let root = Block::calculate_transactions_root(&survivors);
        let started = Instant::now();
        let solution = self
            .miner
            .search(&root, predicate, max_attempts)
            .ok_or_else(|| {
                LedgerError::SealingAborted(format!(
                    "no nonce below {} satisfies the difficulty predicate",
                    max_attempts.unwrap_or(u64::MAX)
                ))
            })?;

        self.directory.apply_transfers(&survivors)?;
        if let Some(last) = last_sequence {
            self.pool.remove_through(last);
        }

        let block = Block::sealed(survivors, root, solution.nonce, solution.digest, dropped);
        info!(
            "Sealed block {} with {} transactions ({} dropped), nonce {} after {} attempts in {:.3}s",
            block.digest_hex(),
            block.len(),
            dropped,
            block.nonce(),
            solution.attempts,
            started.elapsed().as_secs_f64()
        );
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> Ledger {
        let mut config = LedgerConfig::default();
        config.miner.threads = 2;
        Ledger::new(config).unwrap()
    }

    #[test]
    fn test_submit_does_not_move_balances() {
        let ledger = ledger();
        let alice = ledger.register("alice").unwrap();
        ledger.register("bob").unwrap();

        let signed = alice.transfer("bob", "2").unwrap();
        let accepted = ledger.submit(&signed.raw, &signed.signature).unwrap();
        assert_eq!(accepted.sequence, 0);
        assert_eq!(accepted.pending, 1);
        assert_eq!(ledger.balance_of("alice").unwrap(), Amount::from_whole(5));
        assert_eq!(ledger.pending_transactions()[0].hash(), accepted.tx_hash);
    }

    #[test]
    fn test_rejected_submission_leaves_no_trace() {
        let ledger = ledger();
        let alice = ledger.register("alice").unwrap();
        ledger.register("bob").unwrap();

        let signed = alice.transfer("bob", "9").unwrap();
        assert!(ledger.submit(&signed.raw, &signed.signature).is_err());
        assert_eq!(ledger.pending_len(), 0);
    }

    #[test]
    fn test_reset_pool_evicts() {
        let ledger = ledger();
        let alice = ledger.register("alice").unwrap();
        ledger.register("bob").unwrap();
        let signed = alice.transfer("bob", "1").unwrap();
        ledger.submit(&signed.raw, &signed.signature).unwrap();

        assert_eq!(ledger.reset_pool(), 1);
        let block = ledger.seal(&LeadingZeroBits(0)).unwrap();
        assert!(block.is_empty());
        assert_eq!(ledger.balance_of("alice").unwrap(), Amount::from_whole(5));
    }

    #[test]
    fn test_pool_full_is_reported() {
        let mut config = LedgerConfig::default();
        config.pool.max_pending = 1;
        config.miner.threads = 1;
        let ledger = Ledger::new(config).unwrap();
        let alice = ledger.register("alice").unwrap();
        ledger.register("bob").unwrap();

        let first = alice.transfer("bob", "1").unwrap();
        let second = alice.transfer("bob", "2").unwrap();
        ledger.submit(&first.raw, &first.signature).unwrap();
        assert_eq!(
            ledger.submit(&second.raw, &second.signature).unwrap_err(),
            LedgerError::PoolFull
        );
    }

    #[test]
    fn test_seal_default_uses_configured_difficulty() {
        let mut config = LedgerConfig::default();
        config.miner.threads = 2;
        config.miner.difficulty_bits = 4;
        let ledger = Ledger::new(config).unwrap();

        let block = ledger.seal_default().unwrap();
        assert!(block.verify(&LeadingZeroBits(4)));
        assert_eq!(block.dropped(), 0);
    }
}
