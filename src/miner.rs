//! Proof-of-work nonce search
//!
//! The search runs on a dedicated rayon pool. Worker `w` of `N` tries nonces
//! `w, w + N, w + 2N, ...` and polls a shared flag between attempts; the first
//! worker whose digest satisfies the predicate publishes it and the rest stop.

use crate::block::Block;
use crate::crypto::Sha256Hash;
use crate::error::LedgerError;
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

/// Gate on block digests. Implemented for any `Fn(&Sha256Hash) -> bool` closure.
pub trait DifficultyPredicate: Sync {
    fn is_satisfied(&self, digest: &Sha256Hash) -> bool;
}

impl<F> DifficultyPredicate for F
where
    F: Fn(&Sha256Hash) -> bool + Sync,
{
    fn is_satisfied(&self, digest: &Sha256Hash) -> bool {
        self(digest)
    }
}

/// Requires the digest, read as a big-endian 256-bit number, to start with at
/// least this many zero bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadingZeroBits(pub u32);

impl LeadingZeroBits {
    pub fn target(&self) -> Sha256Hash {
        let mut target = [0xFF; 32];
        let leading_zeros = (self.0 / 8).min(32) as usize;
        let partial_bits = self.0 % 8;

        for item in target.iter_mut().take(leading_zeros) {
            *item = 0;
        }
        if leading_zeros < 32 && partial_bits > 0 {
            target[leading_zeros] = 0xFF >> partial_bits;
        }
        target
    }
}

impl DifficultyPredicate for LeadingZeroBits {
    fn is_satisfied(&self, digest: &Sha256Hash) -> bool {
        *digest <= self.target()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solution {
    pub nonce: u64,
    pub digest: Sha256Hash,
    /// Nonces tried across all workers, winner included.
    pub attempts: u64,
}

pub struct Miner {
    pool: ThreadPool,
    workers: usize,
}

impl Miner {
    pub fn new(workers: usize) -> Result<Self, LedgerError> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("ledgerseal-miner-{}", i))
            .build()
            .map_err(|e| LedgerError::ConfigError(format!("Failed to start miner pool: {}", e)))?;
        Ok(Miner { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Search nonces below `max_attempts` (unbounded when `None`) for a digest of
    /// `transactions_root` that satisfies `predicate`.
    pub fn search<P: DifficultyPredicate + ?Sized>(
        &self,
        transactions_root: &Sha256Hash,
        predicate: &P,
        max_attempts: Option<u64>,
    ) -> Option<Solution> {
        let found = AtomicBool::new(false);
        let winner: Mutex<Option<(u64, Sha256Hash)>> = Mutex::new(None);
        let attempts = AtomicU64::new(0);
        let stride = self.workers as u64;

        self.pool.scope(|scope| {
            for worker in 0..stride {
                let found = &found;
                let winner = &winner;
                let attempts = &attempts;
                scope.spawn(move |_| {
                    let mut nonce = worker;
                    let mut tried = 0u64;
                    while !found.load(Ordering::Acquire) {
                        if max_attempts.is_some_and(|limit| nonce >= limit) {
                            break;
                        }
                        let digest = Block::digest_for(transactions_root, nonce);
                        tried += 1;
                        if predicate.is_satisfied(&digest) {
                            if found
                                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                                .is_ok()
                            {
                                *winner.lock() = Some((nonce, digest));
                            }
                            break;
                        }
                        nonce = match nonce.checked_add(stride) {
                            Some(next) => next,
                            None => break,
                        };
                    }
                    attempts.fetch_add(tried, Ordering::Relaxed);
                });
            }
        });

        let attempts = attempts.into_inner();
        let solution = winner.into_inner().map(|(nonce, digest)| Solution {
            nonce,
            digest,
            attempts,
        });
        debug!(
            "Nonce search over {} workers finished after {} attempts (solved: {})",
            self.workers,
            attempts,
            solution.is_some()
        );
        solution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_bits() {
        assert_eq!(LeadingZeroBits(0).target(), [0xFF; 32]);

        let target = LeadingZeroBits(12).target();
        assert_eq!(target[0], 0x00);
        assert_eq!(target[1], 0x0F);
        assert_eq!(target[2], 0xFF);

        assert_eq!(LeadingZeroBits(256).target(), [0u8; 32]);
        assert_eq!(LeadingZeroBits(1000).target(), [0u8; 32]);
    }

    #[test]
    fn test_leading_zero_predicate() {
        let mut digest = [0xFFu8; 32];
        digest[0] = 0x00;
        digest[1] = 0x0F;
        assert!(LeadingZeroBits(12).is_satisfied(&digest));
        assert!(!LeadingZeroBits(13).is_satisfied(&digest));
        assert!(LeadingZeroBits(0).is_satisfied(&[0xFF; 32]));
    }

    #[test]
    fn test_search_finds_satisfying_digest() {
        let miner = Miner::new(4).unwrap();
        let root = [42u8; 32];
        let predicate = LeadingZeroBits(8);

        let solution = miner.search(&root, &predicate, None).unwrap();
        assert!(predicate.is_satisfied(&solution.digest));
        assert_eq!(Block::digest_for(&root, solution.nonce), solution.digest);
        assert!(solution.attempts >= 1);
    }

    #[test]
    fn test_single_worker_finds_lowest_nonce() {
        let miner = Miner::new(1).unwrap();
        let root = [1u8; 32];
        let predicate = LeadingZeroBits(6);

        let solution = miner.search(&root, &predicate, None).unwrap();
        for nonce in 0..solution.nonce {
            assert!(!predicate.is_satisfied(&Block::digest_for(&root, nonce)));
        }
        assert_eq!(solution.attempts, solution.nonce + 1);
    }

    #[test]
    fn test_bounded_search_gives_up() {
        let miner = Miner::new(3).unwrap();
        let never = |_: &Sha256Hash| false;

        assert!(miner.search(&[0u8; 32], &never, Some(100)).is_none());
    }

    #[test]
    fn test_closure_predicate() {
        let miner = Miner::new(2).unwrap();
        let ends_with_zero = |digest: &Sha256Hash| digest[31] == 0;

        let solution = miner.search(&[9u8; 32], &ends_with_zero, None).unwrap();
        assert_eq!(solution.digest[31], 0);
        assert_eq!(miner.workers(), 2);
    }
}
