//! Payee substitution.

use std::rc::Rc;

use super::{Next, Stage};
use crate::chain::ChainError;
use crate::journal::{Entry, Transaction};

/// Payee shown for entries without a code.
pub const NO_CODE: &str = "<none>";

/// What replaces the payee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayeeSource {
    /// The commodity symbol of the transaction's amount.
    Commodity,
    /// The owning entry's code.
    Code,
}

/// Rewrites each transaction's payee.
pub struct PayeeSubstitution<'a> {
    source: PayeeSource,
    next: Next<'a>,
}

impl<'a> PayeeSubstitution<'a> {
    /// Creates a payee substitution stage.
    #[must_use]
    pub fn new(source: PayeeSource, next: Next<'a>) -> Self {
        Self { source, next }
    }
}

impl Stage for PayeeSubstitution<'_> {
    fn accept(&mut self, xact: Transaction) -> Result<(), ChainError> {
        let payee = match self.source {
            PayeeSource::Commodity => xact.amount.commodity.symbol().to_string(),
            PayeeSource::Code => xact
                .entry
                .code
                .clone()
                .unwrap_or_else(|| NO_CODE.to_string()),
        };
        let entry = Rc::new(Entry {
            payee,
            ..Entry::clone(&xact.entry)
        });
        self.next.accept(xact.with_entry(entry))
    }

    fn finish(&mut self) -> Result<(), ChainError> {
        self.next.finish()
    }

    fn name(&self) -> &'static str {
        match self.source {
            PayeeSource::Commodity => "comm_as_payee",
            PayeeSource::Code => "code_as_payee",
        }
    }

    fn downstream(&self) -> Option<&dyn Stage> {
        Some(self.next.as_ref())
    }
}
