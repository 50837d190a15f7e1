//! A base stage that collects its input.

use super::Stage;
use crate::chain::ChainError;
use crate::journal::Transaction;

/// Collects every transaction it receives, in arrival order.
#[derive(Debug, Default)]
pub struct CollectSink {
    xacts: Vec<Transaction>,
    finished: bool,
}

impl CollectSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transactions received so far.
    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.xacts
    }

    /// Consumes the sink, returning what it collected.
    #[must_use]
    pub fn into_transactions(self) -> Vec<Transaction> {
        self.xacts
    }

    /// Returns true once `finish` has been received.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Stage for CollectSink {
    fn accept(&mut self, xact: Transaction) -> Result<(), ChainError> {
        self.xacts.push(xact);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ChainError> {
        self.finished = true;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "collect"
    }
}
