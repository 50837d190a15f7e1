//! Report option set consumed by the chain builder.
//!
//! Every option is either absent or present with a payload. The set is
//! read-only once built: stages capture what they need at construction
//! and never consult it again.

use serde::{Deserialize, Serialize};

/// Which transactions a predicate keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepPolicy {
    /// Keep a transaction only if it matches itself.
    #[default]
    Transaction,
    /// Keep a transaction if any transaction of its entry matches.
    Entry,
}

/// Options selecting which stages a report chain contains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    /// Run the per-transaction stages (truncation through interval grouping).
    pub individual_xacts: bool,
    /// Keep the first N entries (negative: all but the first N).
    pub head: Option<i64>,
    /// Keep the last N entries (negative: all but the last N).
    pub tail: Option<i64>,
    /// Display predicate, applied before the running total.
    pub display: Option<String>,
    /// Amount expression feeding the running total.
    pub amount: Option<String>,
    /// Secondary predicate, applied after the running total.
    pub only: Option<String>,
    /// Sort expression.
    pub sort: Option<String>,
    /// Sort whole entries instead of single transactions.
    pub sort_entries: bool,
    /// Insert market revaluation transactions.
    pub revalued: bool,
    /// Emit only the revaluation transactions (implies `revalued`).
    pub revalued_only: bool,
    /// Merge each entry's transactions per commodity.
    pub collapse: bool,
    /// Subtotal everything by account.
    pub subtotal: bool,
    /// Group by day of week.
    pub dow: bool,
    /// Group by payee.
    pub by_payee: bool,
    /// Interval grouping specification, e.g. `monthly`.
    pub period: Option<String>,
    /// Negate amounts and totals.
    pub invert: bool,
    /// Emit the other transactions of each entry.
    pub related: bool,
    /// Emit every transaction of each entry (implies `related`).
    pub related_all: bool,
    /// Replace payees and accounts with stable placeholders.
    pub anon: bool,
    /// Final predicate constraining the visible set.
    pub limit: Option<String>,
    /// Use the amount's commodity as payee.
    pub comm_as_payee: bool,
    /// Use the entry code as payee.
    pub code_as_payee: bool,
    /// Predicate evaluation policy shared by every filter.
    pub keep: KeepPolicy,
}

impl ReportOptions {
    /// Options for a plain register report: individual transactions with
    /// the running total of each transaction's amount.
    #[must_use]
    pub fn register() -> Self {
        Self {
            individual_xacts: true,
            amount: Some("amount".to_string()),
            ..Self::default()
        }
    }

    /// Returns true if revaluation transactions should be inserted.
    #[must_use]
    pub const fn revaluation_enabled(&self) -> bool {
        self.revalued || self.revalued_only
    }

    /// Returns true if related transactions should be expanded.
    #[must_use]
    pub const fn related_enabled(&self) -> bool {
        self.related || self.related_all
    }

    /// Returns true if head or tail truncation is requested.
    #[must_use]
    pub const fn truncation_enabled(&self) -> bool {
        self.head.is_some() || self.tail.is_some()
    }
}
