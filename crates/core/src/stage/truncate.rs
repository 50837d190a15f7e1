//! Head and tail truncation by entry.

use tallyline_shared::types::EntryId;

use super::{Next, Stage};
use crate::chain::ChainError;
use crate::journal::Transaction;

/// Keeps the first and/or last N entries of the stream.
///
/// Counts are entries, not transactions: a run of transactions from one
/// entry is kept or dropped as a whole. A negative head count keeps all
/// but the first N entries, a negative tail count all but the last N.
/// When both are given the union is kept.
pub struct Truncate<'a> {
    head: Option<i64>,
    tail: Option<i64>,
    entries_seen: i64,
    last_entry: Option<EntryId>,
    pending: Vec<(i64, Transaction)>,
    next: Next<'a>,
}

impl<'a> Truncate<'a> {
    /// Creates a truncation stage.
    #[must_use]
    pub fn new(head: Option<i64>, tail: Option<i64>, next: Next<'a>) -> Self {
        Self {
            head,
            tail,
            entries_seen: 0,
            last_entry: None,
            pending: Vec::new(),
            next,
        }
    }

    /// A non-negative head with no tail can be decided without buffering.
    fn streams(&self) -> bool {
        self.tail.is_none() && self.head.is_some_and(|head| head >= 0)
    }

    fn selects(&self, index: i64, total: i64) -> bool {
        // Widened so that negating or offsetting extreme counts cannot overflow.
        let (index, total) = (i128::from(index), i128::from(total));
        let by_head = self.head.map(i128::from).is_some_and(|head| {
            if head >= 0 {
                index < head
            } else {
                index >= -head
            }
        });
        let by_tail = self.tail.map(i128::from).is_some_and(|tail| {
            if tail >= 0 {
                index >= total - tail
            } else {
                index < total + tail
            }
        });
        by_head || by_tail
    }
}

impl Stage for Truncate<'_> {
    fn accept(&mut self, xact: Transaction) -> Result<(), ChainError> {
        if self.last_entry != Some(xact.entry_id()) {
            self.last_entry = Some(xact.entry_id());
            self.entries_seen += 1;
        }
        let index = self.entries_seen - 1;

        if self.streams() {
            if self.selects(index, self.entries_seen) {
                self.next.accept(xact)?;
            }
            return Ok(());
        }
        self.pending.push((index, xact));
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ChainError> {
        let pending = std::mem::take(&mut self.pending);
        tracing::trace!(
            buffered = pending.len(),
            entries = self.entries_seen,
            "Flushing truncation buffer"
        );
        for (index, xact) in pending {
            if self.selects(index, self.entries_seen) {
                self.next.accept(xact)?;
            }
        }
        self.next.finish()
    }

    fn name(&self) -> &'static str {
        "truncate"
    }

    fn downstream(&self) -> Option<&dyn Stage> {
        Some(self.next.as_ref())
    }
}
