//! Balancing rules for journal entries.

use super::entry::Entry;
use super::error::JournalError;

/// Validates that an entry has postings and that its real postings balance
/// in every commodity.
///
/// # Errors
///
/// Returns `JournalError::EmptyEntry` or `JournalError::Unbalanced`.
pub fn validate_entry(entry: &Entry) -> Result<(), JournalError> {
    if entry.postings.is_empty() {
        return Err(JournalError::EmptyEntry {
            payee: entry.payee.clone(),
            date: entry.date,
        });
    }

    let residual = entry.real_balance()?;
    if !residual.is_zero() {
        return Err(JournalError::Unbalanced {
            payee: entry.payee.clone(),
            date: entry.date,
            residual: residual.to_string(),
        });
    }

    Ok(())
}
