//! Pending pool of admitted, not yet sealed transactions
//!
//! Entries keep admission order and carry a monotonically increasing sequence
//! number, so the sealer can remove exactly the prefix it worked on while new
//! submissions keep arriving behind it.

use crate::error::LedgerError;
use crate::transaction::Transaction;
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    pub sequence: u64,
    pub transaction: Transaction,
}

#[derive(Debug, Default)]
struct PoolInner {
    entries: Vec<PendingEntry>,
    next_sequence: u64,
}

#[derive(Debug)]
pub struct PendingPool {
    inner: Mutex<PoolInner>,
    max_pending: usize,
}

impl PendingPool {
    pub fn new(max_pending: usize) -> Self {
        PendingPool {
            inner: Mutex::new(PoolInner::default()),
            max_pending,
        }
    }

    /// Append a transaction, returning its sequence number.
    pub fn push(&self, transaction: Transaction) -> Result<u64, LedgerError> {
        let mut inner = self.inner.lock();
        if inner.entries.len() >= self.max_pending {
            return Err(LedgerError::PoolFull);
        }
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner.entries.push(PendingEntry {
            sequence,
            transaction,
        });
        Ok(sequence)
    }

    /// Copy of the current entries in admission order.
    pub fn snapshot(&self) -> Vec<PendingEntry> {
        self.inner.lock().entries.clone()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|entry| entry.transaction.clone())
            .collect()
    }

    /// Remove every entry with `sequence <= last`, returning how many were removed.
    pub fn remove_through(&self, last: u64) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|entry| entry.sequence > last);
        before - inner.entries.len()
    }

    /// Evict everything. Sequence numbers keep increasing afterwards.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        let evicted = inner.entries.len();
        inner.entries.clear();
        evicted
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Amount, TransferFields};

    fn tx(amount: u32) -> Transaction {
        Transaction::new(
            TransferFields::new("alice", "bob", Amount::from_whole(amount)),
            vec![0; 64],
        )
    }

    #[test]
    fn test_preserves_admission_order() {
        let pool = PendingPool::new(10);
        for amount in 1..=3 {
            pool.push(tx(amount)).unwrap();
        }

        let amounts: Vec<Amount> = pool.transactions().iter().map(|t| t.amount).collect();
        assert_eq!(
            amounts,
            vec![Amount::from_whole(1), Amount::from_whole(2), Amount::from_whole(3)]
        );
        let sequences: Vec<u64> = pool.snapshot().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
    }

    #[test]
    fn test_remove_through_keeps_later_entries() {
        let pool = PendingPool::new(10);
        pool.push(tx(1)).unwrap();
        let last = pool.push(tx(2)).unwrap();
        pool.push(tx(3)).unwrap();

        assert_eq!(pool.remove_through(last), 2);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.transactions()[0].amount, Amount::from_whole(3));
    }

    #[test]
    fn test_capacity_limit() {
        let pool = PendingPool::new(2);
        pool.push(tx(1)).unwrap();
        pool.push(tx(2)).unwrap();
        assert_eq!(pool.push(tx(3)).unwrap_err(), LedgerError::PoolFull);
        assert_eq!(pool.capacity(), 2);
    }

    #[test]
    fn test_clear_keeps_sequence_monotonic() {
        let pool = PendingPool::new(10);
        pool.push(tx(1)).unwrap();
        pool.push(tx(2)).unwrap();
        assert_eq!(pool.clear(), 2);
        assert!(pool.is_empty());
        assert_eq!(pool.push(tx(3)).unwrap(), 2);
    }
}
