//! Running total calculation.

use tallyline_shared::types::Balance;

use super::{Next, Stage};
use crate::chain::ChainError;
use crate::expr::{Expr, ExprError};
use crate::journal::Transaction;

/// Adds each transaction's amount expression into a running total and
/// stores the total on the transaction.
pub struct Calculator<'a> {
    amount: Box<dyn Expr>,
    running: Balance,
    next: Next<'a>,
}

impl<'a> Calculator<'a> {
    /// Creates a calculator with a zero running total.
    #[must_use]
    pub fn new(amount: Box<dyn Expr>, next: Next<'a>) -> Self {
        Self {
            amount,
            running: Balance::new(),
            next,
        }
    }
}

impl Stage for Calculator<'_> {
    fn accept(&mut self, mut xact: Transaction) -> Result<(), ChainError> {
        let value = self.amount.eval(&xact)?;
        let type_name = value.type_name();
        let addend = value.into_balance().ok_or(ExprError::TypeMismatch {
            op: "total",
            left: "balance",
            right: type_name,
        })?;
        self.running.add_balance(&addend)?;
        xact.total = self.running.clone();
        self.next.accept(xact)
    }

    fn finish(&mut self) -> Result<(), ChainError> {
        self.next.finish()
    }

    fn name(&self) -> &'static str {
        "calc"
    }

    fn downstream(&self) -> Option<&dyn Stage> {
        Some(self.next.as_ref())
    }
}
