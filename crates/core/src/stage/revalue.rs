//! Market revaluation.

use std::rc::Rc;

use chrono::NaiveDate;
use tallyline_shared::types::Balance;

use super::{Next, Stage};
use crate::chain::ChainError;
use crate::journal::{Entry, Transaction};
use crate::valuation::{value_balance, PriceSource};

/// Payee of synthesized revaluation entries.
pub const REVALUED_PAYEE: &str = "Commodities revalued";
/// Account of synthesized revaluation transactions.
pub const REVALUED_ACCOUNT: &str = "<Revalued>";

/// Inserts a virtual transaction whenever the market value of the running
/// total changed between the previous transaction's date and the current
/// one.
///
/// The delta is the previous total valued at the current date minus the
/// same total valued at the previous date; one transaction is emitted per
/// commodity of a non-zero delta, dated at the current transaction.
pub struct Revalue<'a> {
    prices: Rc<dyn PriceSource>,
    deltas_only: bool,
    last: Option<(NaiveDate, Balance)>,
    next: Next<'a>,
}

impl<'a> Revalue<'a> {
    /// Creates a revaluation stage. With `deltas_only` the original
    /// transactions are suppressed.
    #[must_use]
    pub fn new(prices: Rc<dyn PriceSource>, deltas_only: bool, next: Next<'a>) -> Self {
        Self {
            prices,
            deltas_only,
            last: None,
            next,
        }
    }

    fn emit_delta(&mut self, date: NaiveDate) -> Result<(), ChainError> {
        let Some((last_date, total)) = &self.last else {
            return Ok(());
        };
        if *last_date == date {
            return Ok(());
        }

        let before = value_balance(total, *last_date, self.prices.as_ref())?;
        let after = value_balance(total, date, self.prices.as_ref())?;
        let delta = after.checked_sub(&before)?;
        if delta.is_zero() {
            return Ok(());
        }

        tracing::trace!(%date, %delta, "Revaluing running total");
        let entry = Rc::new(Entry::synthetic(date, REVALUED_PAYEE, None));
        for amount in delta.amounts() {
            let mut xact = Transaction::synthetic(Rc::clone(&entry), REVALUED_ACCOUNT, amount);
            xact.total.clone_from(&after);
            self.next.accept(xact)?;
        }
        Ok(())
    }
}

impl Stage for Revalue<'_> {
    fn accept(&mut self, xact: Transaction) -> Result<(), ChainError> {
        self.emit_delta(xact.date())?;
        self.last = Some((xact.date(), xact.total.clone()));
        if self.deltas_only {
            return Ok(());
        }
        self.next.accept(xact)
    }

    fn finish(&mut self) -> Result<(), ChainError> {
        self.next.finish()
    }

    fn name(&self) -> &'static str {
        "revalue"
    }

    fn downstream(&self) -> Option<&dyn Stage> {
        Some(self.next.as_ref())
    }
}
