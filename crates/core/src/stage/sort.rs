//! Stable sorting by an expression key.

use super::{Next, Stage};
use crate::chain::ChainError;
use crate::expr::{DateKey, Expr, Value};
use crate::journal::Transaction;

/// Buffers the whole stream and emits it sorted at finish.
///
/// The sort is stable. In entry mode each run of consecutive transactions
/// from one entry moves as a unit, keyed by its first transaction.
pub struct Sort<'a> {
    name: &'static str,
    key: Box<dyn Expr>,
    by_entry: bool,
    pending: Vec<Transaction>,
    next: Next<'a>,
}

impl<'a> Sort<'a> {
    fn with(name: &'static str, key: Box<dyn Expr>, by_entry: bool, next: Next<'a>) -> Self {
        Self {
            name,
            key,
            by_entry,
            pending: Vec::new(),
            next,
        }
    }

    /// Sorts individual transactions by `key`.
    #[must_use]
    pub fn transactions(key: Box<dyn Expr>, next: Next<'a>) -> Self {
        Self::with("sort", key, false, next)
    }

    /// Sorts whole entries by `key`.
    #[must_use]
    pub fn entries(key: Box<dyn Expr>, next: Next<'a>) -> Self {
        Self::with("sort_entries", key, true, next)
    }

    /// Sorts individual transactions by date.
    #[must_use]
    pub fn by_date(next: Next<'a>) -> Self {
        Self::with("date_sort", Box::new(DateKey), false, next)
    }

    fn sorted(&self, pending: Vec<Transaction>) -> Result<Vec<Transaction>, ChainError> {
        let mut groups: Vec<Vec<Transaction>> = Vec::new();
        for xact in pending {
            match groups.last_mut() {
                Some(group) if self.by_entry && group[0].same_entry(&xact) => group.push(xact),
                _ => groups.push(vec![xact]),
            }
        }

        let mut keyed = groups
            .into_iter()
            .map(|group| Ok((self.key.eval(&group[0])?, group)))
            .collect::<Result<Vec<(Value, Vec<Transaction>)>, ChainError>>()?;
        keyed.sort_by(|(a, _), (b, _)| a.sort_cmp(b));

        Ok(keyed.into_iter().flat_map(|(_, group)| group).collect())
    }
}

impl Stage for Sort<'_> {
    fn accept(&mut self, xact: Transaction) -> Result<(), ChainError> {
        self.pending.push(xact);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ChainError> {
        let pending = std::mem::take(&mut self.pending);
        tracing::trace!(stage = self.name, buffered = pending.len(), "Flushing sort buffer");
        for xact in self.sorted(pending)? {
            self.next.accept(xact)?;
        }
        self.next.finish()
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn downstream(&self) -> Option<&dyn Stage> {
        Some(self.next.as_ref())
    }
}
