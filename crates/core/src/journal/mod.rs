//! Journal data: entries, their postings, and the transaction view
//! streamed through report chains.
//!
//! The journal is read-only input to a report. It is loaded once,
//! validated, and then iterated in journal order.

pub mod entry;
pub mod error;
pub mod transaction;
pub mod validation;

use std::path::Path;
use std::rc::Rc;

use serde::Deserialize;

pub use entry::{Entry, Posting};
pub use error::JournalError;
pub use transaction::Transaction;
pub use validation::validate_entry;

#[derive(Deserialize)]
struct JournalFile {
    entries: Vec<Entry>,
}

/// An ordered, validated collection of entries.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Vec<Rc<Entry>>,
}

impl Journal {
    /// Builds a journal from entries, validating each one.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn new(entries: Vec<Entry>) -> Result<Self, JournalError> {
        for entry in &entries {
            validate_entry(entry)?;
        }
        Ok(Self {
            entries: entries.into_iter().map(Rc::new).collect(),
        })
    }

    /// Parses a journal from its JSON form (`{"entries": [...]}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or an entry is invalid.
    pub fn from_json(text: &str) -> Result<Self, JournalError> {
        let file: JournalFile = serde_json::from_str(text)?;
        Self::new(file.entries)
    }

    /// Reads and parses a JSON journal file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// The entries, in journal order.
    #[must_use]
    pub fn entries(&self) -> &[Rc<Entry>] {
        &self.entries
    }

    /// Every posting of every entry as a transaction, in journal order.
    pub fn transactions(&self) -> impl Iterator<Item = Transaction> + '_ {
        self.entries.iter().flat_map(Transaction::all_of)
    }
}
