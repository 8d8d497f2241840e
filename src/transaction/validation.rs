//! Admission checks for submitted transfers, kept apart from the type definitions

use crate::crypto;
use crate::directory::IdentityDirectory;
use crate::error::LedgerError;
use crate::signature;
use crate::transaction::{Amount, Transaction, TransferFields};
use tracing::debug;

/// Validate a wire-format transfer and its detached base64 signature.
///
/// Gates run in order and the first failure wins:
/// parse, participant resolution, signature over the canonical message, solvency.
/// Nothing is mutated; the caller decides whether to admit the result.
pub fn validate_submission(
    directory: &IdentityDirectory,
    raw: &str,
    signature_text: &str,
) -> Result<Transaction, LedgerError> {
    let fields = TransferFields::parse(raw)?;
    if fields.sender == fields.receiver {
        return Err(LedgerError::MalformedTransaction(
            "Sender and receiver cannot be the same".to_string(),
        ));
    }

    let sender = directory
        .lookup(&fields.sender)
        .map_err(|_| LedgerError::UnknownParticipant(fields.sender.clone()))?;
    if !directory.contains(&fields.receiver) {
        return Err(LedgerError::UnknownParticipant(fields.receiver.clone()));
    }

    // Verify against bytes re-derived from the parsed fields, never the caller's text.
    let message = fields.canonical_message();
    if !signature::verify_text(&sender.public_key, &message, signature_text) {
        debug!("Rejected signature on '{}'", raw);
        return Err(LedgerError::InvalidSignature);
    }

    check_solvency(sender.balance, fields.amount)?;

    let signature = crypto::decode_text(signature_text)?;
    let tx = Transaction::new(fields, signature);
    tx.validate_size()?;
    Ok(tx)
}

/// `amount` must be positive and covered by `balance`.
pub fn check_solvency(balance: Amount, amount: Amount) -> Result<(), LedgerError> {
    if amount <= Amount::ZERO {
        return Err(LedgerError::InsufficientFunds(format!(
            "Transfer amount must be positive, got {}",
            amount
        )));
    }
    if balance < amount {
        return Err(LedgerError::InsufficientFunds(format!(
            "Balance {} does not cover {}",
            balance, amount
        )));
    }
    Ok(())
}
