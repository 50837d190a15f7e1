//! The transaction: one posting as it flows through a report chain.

use std::rc::Rc;

use chrono::NaiveDate;
use tallyline_shared::types::{Amount, Balance, EntryId};

use super::entry::Entry;

/// One posting of an entry, carrying the fields stages compute.
///
/// Ownership moves downstream with every `accept`: a stage forwards the
/// same value, mutates it in place, or replaces it with synthesized ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Owning entry, shared with the entry's other transactions.
    pub entry: Rc<Entry>,
    /// Index of the posting this transaction was read from; `None` for
    /// transactions synthesized by a stage.
    pub origin: Option<usize>,
    /// Full account name.
    pub account: String,
    /// Posted amount.
    pub amount: Amount,
    /// Running total, written by the calculator stage.
    pub total: Balance,
    /// Optional note copied from the posting.
    pub note: Option<String>,
    /// Set for virtual postings and for transactions synthesized by a stage.
    pub is_virtual: bool,
}

impl Transaction {
    /// Reads posting `index` of `entry` as a transaction.
    #[must_use]
    pub fn from_posting(entry: &Rc<Entry>, index: usize) -> Option<Self> {
        let posting = entry.postings.get(index)?;
        Some(Self {
            entry: Rc::clone(entry),
            origin: Some(index),
            account: posting.account.clone(),
            amount: posting.amount.clone(),
            total: Balance::new(),
            note: posting.note.clone(),
            is_virtual: posting.is_virtual,
        })
    }

    /// Creates a virtual transaction that no journal posting backs.
    #[must_use]
    pub fn synthetic(entry: Rc<Entry>, account: impl Into<String>, amount: Amount) -> Self {
        Self {
            entry,
            origin: None,
            account: account.into(),
            amount,
            total: Balance::new(),
            note: None,
            is_virtual: true,
        }
    }

    /// Every posting of `entry` read as a transaction, in posting order.
    pub fn all_of(entry: &Rc<Entry>) -> impl Iterator<Item = Self> + '_ {
        (0..entry.postings.len()).filter_map(move |index| Self::from_posting(entry, index))
    }

    /// Date of the owning entry.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.entry.date
    }

    /// Payee of the owning entry.
    #[must_use]
    pub fn payee(&self) -> &str {
        &self.entry.payee
    }

    /// Identity of the owning entry.
    #[must_use]
    pub fn entry_id(&self) -> EntryId {
        self.entry.id
    }

    /// Returns true if both transactions belong to the same entry.
    #[must_use]
    pub fn same_entry(&self, other: &Self) -> bool {
        self.entry.id == other.entry.id
    }

    /// Replaces the owning entry, keeping every other field.
    #[must_use]
    pub fn with_entry(mut self, entry: Rc<Entry>) -> Self {
        self.entry = entry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry() -> Rc<Entry> {
        Rc::new(
            Entry::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), "Cafe")
                .with_posting("Expenses:Coffee", Amount::new(dec!(4), "$"))
                .with_posting("Assets:Cash", Amount::new(dec!(-4), "$")),
        )
    }

    #[test]
    fn test_from_posting() {
        let entry = entry();
        let xact = Transaction::from_posting(&entry, 1).unwrap();
        assert_eq!(xact.account, "Assets:Cash");
        assert_eq!(xact.amount, Amount::new(dec!(-4), "$"));
        assert_eq!(xact.origin, Some(1));
        assert!(xact.total.is_zero());
        assert!(!xact.is_virtual);
        assert!(Transaction::from_posting(&entry, 2).is_none());
    }

    #[test]
    fn test_all_of_preserves_order() {
        let entry = entry();
        let accounts: Vec<String> = Transaction::all_of(&entry).map(|x| x.account).collect();
        assert_eq!(accounts, vec!["Expenses:Coffee", "Assets:Cash"]);
    }

    #[test]
    fn test_synthetic_is_virtual() {
        let xact = Transaction::synthetic(entry(), "<Total>", Amount::new(dec!(1), "$"));
        assert!(xact.is_virtual);
        assert!(xact.origin.is_none());
    }

    #[test]
    fn test_same_entry_survives_rewrite() {
        let entry = entry();
        let xact = Transaction::from_posting(&entry, 0).unwrap();
        let renamed = Rc::new(Entry {
            payee: "Renamed".to_string(),
            ..(*entry).clone()
        });
        let rewritten = xact.clone().with_entry(renamed);
        assert!(xact.same_entry(&rewritten));
        assert_eq!(rewritten.payee(), "Renamed");
    }
}
