//! Identity directory: the single source of truth for participants and balances
//!
//! Records are keyed by their stable id string. Mutation happens only in
//! [`IdentityDirectory::register`] and [`IdentityDirectory::apply_transfers`], both
//! under the write half of one lock; lookups share the read half.

use crate::client::Client;
use crate::config::DirectoryConfig;
use crate::crypto::KeyPair;
use crate::error::LedgerError;
use crate::transaction::validation::check_solvency;
use crate::transaction::{Amount, Transaction, DELIMITER};
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

const MAX_ID_LENGTH: usize = 64;

/// A registered ledger identity. The secret key lives with the [`Client`], not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    #[serde(with = "serde_bytes")]
    pub public_key: Vec<u8>,
    pub balance: Amount,
}

/// Working copy of balances keyed by participant id.
///
/// Used by the sealer to walk pending transfers speculatively and by the
/// directory to stage a batch before publishing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceSheet {
    balances: HashMap<String, Amount>,
}

impl BalanceSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, balance: Amount) {
        self.balances.insert(id.into(), balance);
    }

    pub fn get(&self, id: &str) -> Option<Amount> {
        self.balances.get(id).copied()
    }

    /// Move `tx.amount` from sender to receiver. On error the sheet is unchanged.
    pub fn transfer(&mut self, tx: &Transaction) -> Result<(), LedgerError> {
        let sender_balance = self
            .get(&tx.sender)
            .ok_or_else(|| LedgerError::UnknownParticipant(tx.sender.clone()))?;
        let receiver_balance = self
            .get(&tx.receiver)
            .ok_or_else(|| LedgerError::UnknownParticipant(tx.receiver.clone()))?;

        check_solvency(sender_balance, tx.amount)?;
        if tx.sender == tx.receiver {
            return Ok(());
        }
        let debited = sender_balance.checked_sub(tx.amount).ok_or_else(|| {
            LedgerError::InsufficientFunds(format!("Debit from {} underflows", tx.sender))
        })?;
        let credited = receiver_balance.checked_add(tx.amount).ok_or_else(|| {
            LedgerError::MalformedTransaction(format!("Credit to {} overflows", tx.receiver))
        })?;

        self.balances.insert(tx.sender.clone(), debited);
        self.balances.insert(tx.receiver.clone(), credited);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

/// Reject ids that could never appear in a parseable transaction.
fn validate_identifier(id: &str) -> Result<(), LedgerError> {
    if id.is_empty() {
        return Err(LedgerError::InvalidIdentifier(
            "Identifier must not be empty".to_string(),
        ));
    }
    if id.len() > MAX_ID_LENGTH {
        return Err(LedgerError::InvalidIdentifier(format!(
            "Identifier exceeds {} bytes",
            MAX_ID_LENGTH
        )));
    }
    if id.contains(DELIMITER) || id.chars().any(char::is_whitespace) {
        return Err(LedgerError::InvalidIdentifier(format!(
            "Identifier '{}' contains '{}' or whitespace",
            id, DELIMITER
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct IdentityDirectory {
    inner: Arc<RwLock<HashMap<String, Participant>>>,
    settings: DirectoryConfig,
    starting_balance: Amount,
}

impl IdentityDirectory {
    pub fn new(settings: DirectoryConfig) -> Result<Self, LedgerError> {
        settings.validate()?;
        let starting_balance = settings.starting_balance_amount()?;
        Ok(IdentityDirectory {
            inner: Arc::new(RwLock::new(HashMap::new())),
            settings,
            starting_balance,
        })
    }

    /// Register a participant under `requested_id`, or under `requested_id` plus a
    /// random numeric suffix when the id is taken.
    ///
    /// Gives up with [`LedgerError::DirectoryExhausted`] after
    /// `max_id_attempts` colliding suffixes.
    pub fn register(&self, requested_id: &str) -> Result<Client, LedgerError> {
        validate_identifier(requested_id)?;

        // Key generation stays outside the write lock.
        let keypair = KeyPair::generate()?;
        let mut rng = rand::thread_rng();

        let mut inner = self.inner.write();
        let mut id = requested_id.to_string();
        let mut attempts = 0;
        while inner.contains_key(&id) {
            if attempts >= self.settings.max_id_attempts {
                warn!(
                    "Gave up deriving an id from '{}' after {} attempts",
                    requested_id, attempts
                );
                return Err(LedgerError::DirectoryExhausted(requested_id.to_string()));
            }
            attempts += 1;
            let suffix = rng.gen_range(self.settings.suffix_min..=self.settings.suffix_max);
            id = format!("{}{}", requested_id, suffix);
            // A suffixed id must obey the same rules as a requested one.
            validate_identifier(&id)?;
        }

        let participant = Participant {
            id: id.clone(),
            public_key: keypair.public_key_bytes().to_vec(),
            balance: self.starting_balance,
        };
        inner.insert(id.clone(), participant);
        drop(inner);

        info!("Registered participant {} (requested '{}')", id, requested_id);
        Ok(Client::new(id, keypair))
    }

    pub fn lookup(&self, id: &str) -> Result<Participant, LedgerError> {
        self.inner
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    pub fn balance_of(&self, id: &str) -> Result<Amount, LedgerError> {
        self.inner
            .read()
            .get(id)
            .map(|p| p.balance)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Copy every balance into a [`BalanceSheet`].
    pub fn snapshot_balances(&self) -> BalanceSheet {
        let inner = self.inner.read();
        let mut sheet = BalanceSheet::new();
        for (id, participant) in inner.iter() {
            sheet.insert(id.clone(), participant.balance);
        }
        sheet
    }

    /// Apply a batch of transfers in order, all or nothing.
    pub fn apply_transfers(&self, transactions: &[Transaction]) -> Result<(), LedgerError> {
        let mut inner = self.inner.write();

        let mut staged = BalanceSheet::new();
        for tx in transactions {
            for id in [&tx.sender, &tx.receiver] {
                if staged.get(id).is_none() {
                    let participant = inner
                        .get(id.as_str())
                        .ok_or_else(|| LedgerError::UnknownParticipant(id.clone()))?;
                    staged.insert(id.clone(), participant.balance);
                }
            }
            staged.transfer(tx)?;
        }

        for (id, balance) in staged.balances {
            if let Some(participant) = inner.get_mut(&id) {
                participant.balance = balance;
            }
        }
        debug!("Committed {} transfers", transactions.len());
        Ok(())
    }
}
