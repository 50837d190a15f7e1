//! Sign inversion.

use super::{Next, Stage};
use crate::chain::ChainError;
use crate::journal::Transaction;

/// Negates every transaction's amount and running total.
pub struct Invert<'a> {
    next: Next<'a>,
}

impl<'a> Invert<'a> {
    /// Creates an inverting stage.
    #[must_use]
    pub fn new(next: Next<'a>) -> Self {
        Self { next }
    }
}

impl Stage for Invert<'_> {
    fn accept(&mut self, mut xact: Transaction) -> Result<(), ChainError> {
        xact.amount = -xact.amount;
        xact.total = -std::mem::take(&mut xact.total);
        self.next.accept(xact)
    }

    fn finish(&mut self) -> Result<(), ChainError> {
        self.next.finish()
    }

    fn name(&self) -> &'static str {
        "invert"
    }

    fn downstream(&self) -> Option<&dyn Stage> {
        Some(self.next.as_ref())
    }
}
