//! Journal loading and validation errors.

use chrono::NaiveDate;
use tallyline_shared::types::AmountOverflow;
use thiserror::Error;

/// Errors that can occur while loading a journal.
#[derive(Debug, Error)]
pub enum JournalError {
    /// The journal file could not be read.
    #[error("Failed to read journal: {0}")]
    Io(#[from] std::io::Error),

    /// The journal file is not valid JSON for the journal schema.
    #[error("Malformed journal: {0}")]
    Json(#[from] serde_json::Error),

    /// An entry has no postings.
    #[error("Entry '{payee}' on {date} has no postings")]
    EmptyEntry {
        /// Payee of the offending entry.
        payee: String,
        /// Date of the offending entry.
        date: NaiveDate,
    },

    /// An entry's real postings do not sum to zero.
    #[error("Entry '{payee}' on {date} does not balance: residual {residual}")]
    Unbalanced {
        /// Payee of the offending entry.
        payee: String,
        /// Date of the offending entry.
        date: NaiveDate,
        /// The non-zero remainder, rendered per commodity.
        residual: String,
    },

    /// An entry's postings sum beyond the decimal range.
    #[error(transparent)]
    Overflow(#[from] AmountOverflow),
}

impl JournalError {
    /// Returns a stable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "JOURNAL_IO",
            Self::Json(_) => "JOURNAL_MALFORMED",
            Self::EmptyEntry { .. } => "EMPTY_ENTRY",
            Self::Unbalanced { .. } => "UNBALANCED_ENTRY",
            Self::Overflow(e) => e.error_code(),
        }
    }
}
