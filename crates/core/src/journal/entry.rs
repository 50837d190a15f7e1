//! Journal entry domain types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tallyline_shared::types::{Amount, AmountOverflow, Balance, EntryId};

use crate::period::DateRange;

/// A single recorded line of an entry: an account and an amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Full account name, `:`-separated (e.g. `Expenses:Food`).
    pub account: String,
    /// Amount posted to the account.
    pub amount: Amount,
    /// Optional free-form note.
    #[serde(default)]
    pub note: Option<String>,
    /// Virtual postings are exempt from the balancing rule.
    #[serde(default, rename = "virtual")]
    pub is_virtual: bool,
}

impl Posting {
    /// Creates a real posting.
    #[must_use]
    pub fn new(account: impl Into<String>, amount: Amount) -> Self {
        Self {
            account: account.into(),
            amount,
            note: None,
            is_virtual: false,
        }
    }

    /// Attaches a note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Marks the posting as virtual.
    #[must_use]
    pub const fn virtual_posting(mut self) -> Self {
        self.is_virtual = true;
        self
    }
}

/// A balanced accounting event grouping one or more postings.
///
/// Entries are shared by reference between the transactions read from
/// them; rewriting stages clone the entry and keep its `id`, so entry
/// identity survives anonymization and payee substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique identifier.
    #[serde(default)]
    pub id: EntryId,
    /// Entry date.
    pub date: NaiveDate,
    /// Payee or description.
    pub payee: String,
    /// Optional entry code (check number, reference).
    #[serde(default)]
    pub code: Option<String>,
    /// Recorded postings, in journal order.
    #[serde(default)]
    pub postings: Vec<Posting>,
    /// Span covered by a synthesized grouping entry.
    #[serde(skip)]
    pub range: Option<DateRange>,
}

impl Entry {
    /// Creates an entry without postings.
    #[must_use]
    pub fn new(date: NaiveDate, payee: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            date,
            payee: payee.into(),
            code: None,
            postings: Vec::new(),
            range: None,
        }
    }

    /// Creates an entry for transactions synthesized by a stage.
    #[must_use]
    pub fn synthetic(date: NaiveDate, payee: impl Into<String>, range: Option<DateRange>) -> Self {
        Self {
            range,
            ..Self::new(date, payee)
        }
    }

    /// Sets the entry code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Appends a real posting.
    #[must_use]
    pub fn with_posting(mut self, account: impl Into<String>, amount: Amount) -> Self {
        self.postings.push(Posting::new(account, amount));
        self
    }

    /// Appends a prepared posting.
    #[must_use]
    pub fn push_posting(mut self, posting: Posting) -> Self {
        self.postings.push(posting);
        self
    }

    /// Sum of the real (non-virtual) postings.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if the sum leaves the decimal range.
    pub fn real_balance(&self) -> Result<Balance, AmountOverflow> {
        let mut balance = Balance::new();
        for posting in self.postings.iter().filter(|p| !p.is_virtual) {
            balance.add_amount(&posting.amount)?;
        }
        Ok(balance)
    }
}
