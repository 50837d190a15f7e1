//! Subtotal, day-of-week and payee grouping.
//!
//! Every grouping stage feeds a [`Subtotals`] accumulator per group and,
//! at finish, emits one synthesized entry per group carrying one virtual
//! transaction per account per commodity. Running totals of the emitted
//! transactions are recomputed over the emitted sequence.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use chrono::Datelike;
use rust_decimal::Decimal;
use tallyline_shared::types::{Amount, AmountOverflow, Balance};

use super::{Next, Stage};
use crate::chain::ChainError;
use crate::journal::{Entry, Transaction};
use crate::period::DateRange;

/// Per-account accumulator for one group.
#[derive(Debug, Clone, Default)]
pub struct Subtotals {
    accounts: BTreeMap<String, Balance>,
    range: Option<DateRange>,
}

impl Subtotals {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a transaction's amount to its account.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if the account's sum leaves the decimal
    /// range.
    pub fn add(&mut self, xact: &Transaction) -> Result<(), AmountOverflow> {
        let date = xact.date();
        match &mut self.range {
            Some(range) => range.include(date),
            None => self.range = Some(DateRange::new(date, date)),
        }
        self.accounts
            .entry(xact.account.clone())
            .or_default()
            .add_amount(&xact.amount)
    }

    /// Returns true if nothing has been added.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.range.is_none()
    }

    /// Span of the dates added so far.
    #[must_use]
    pub const fn range(&self) -> Option<DateRange> {
        self.range
    }

    /// Accumulated balance per account, ordered by account name.
    #[must_use]
    pub fn balances(&self) -> &BTreeMap<String, Balance> {
        &self.accounts
    }

    /// Emits the accumulated balances as transactions of `entry`.
    ///
    /// An account whose amounts cancelled out is emitted with a zero
    /// amount. `running` carries the running total across groups.
    ///
    /// # Errors
    ///
    /// Propagates any error from `next`.
    pub fn emit<S: Stage + ?Sized>(
        self,
        entry: &Rc<Entry>,
        running: &mut Balance,
        next: &mut S,
    ) -> Result<(), ChainError> {
        for (account, balance) in self.accounts {
            let mut amounts: Vec<Amount> = balance.amounts().collect();
            if amounts.is_empty() {
                amounts.push(Amount::number(Decimal::ZERO));
            }
            for amount in amounts {
                running.add_amount(&amount)?;
                let mut xact = Transaction::synthetic(Rc::clone(entry), account.as_str(), amount);
                xact.total = running.clone();
                next.accept(xact)?;
            }
        }
        Ok(())
    }
}

/// The synthesized entry for a group, dated at the start of its range.
fn group_entry(payee: impl Into<String>, range: DateRange) -> Rc<Entry> {
    Rc::new(Entry::synthetic(range.start, payee, Some(range)))
}

// ============================================================================
// Subtotal
// ============================================================================

/// Accumulates the whole stream into one group.
pub struct Subtotal<'a> {
    totals: Subtotals,
    next: Next<'a>,
}

impl<'a> Subtotal<'a> {
    /// Creates a subtotal stage.
    #[must_use]
    pub fn new(next: Next<'a>) -> Self {
        Self {
            totals: Subtotals::new(),
            next,
        }
    }
}

impl Stage for Subtotal<'_> {
    fn accept(&mut self, xact: Transaction) -> Result<(), ChainError> {
        self.totals.add(&xact)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ChainError> {
        let totals = std::mem::take(&mut self.totals);
        tracing::trace!(accounts = totals.balances().len(), "Flushing subtotal");
        if let Some(range) = totals.range() {
            let entry = group_entry(range.to_string(), range);
            totals.emit(&entry, &mut Balance::new(), &mut *self.next)?;
        }
        self.next.finish()
    }

    fn name(&self) -> &'static str {
        "subtotal"
    }

    fn downstream(&self) -> Option<&dyn Stage> {
        Some(self.next.as_ref())
    }
}

// ============================================================================
// Day of week
// ============================================================================

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Groups by day of the week, emitting Sunday through Saturday.
pub struct DayOfWeek<'a> {
    days: [Subtotals; 7],
    next: Next<'a>,
}

impl<'a> DayOfWeek<'a> {
    /// Creates a day-of-week grouping stage.
    #[must_use]
    pub fn new(next: Next<'a>) -> Self {
        Self {
            days: Default::default(),
            next,
        }
    }
}

impl Stage for DayOfWeek<'_> {
    fn accept(&mut self, xact: Transaction) -> Result<(), ChainError> {
        let day = xact.date().weekday().num_days_from_sunday() as usize;
        self.days[day].add(&xact)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ChainError> {
        let days = std::mem::take(&mut self.days);
        let mut running = Balance::new();
        for (name, totals) in WEEKDAYS.iter().zip(days) {
            if let Some(range) = totals.range() {
                tracing::trace!(day = name, accounts = totals.balances().len(), "Flushing weekday");
                totals.emit(&group_entry(*name, range), &mut running, &mut *self.next)?;
            }
        }
        self.next.finish()
    }

    fn name(&self) -> &'static str {
        "dow"
    }

    fn downstream(&self) -> Option<&dyn Stage> {
        Some(self.next.as_ref())
    }
}

// ============================================================================
// By payee
// ============================================================================

/// Groups by payee, emitting payees in the order first seen.
pub struct ByPayee<'a> {
    groups: Vec<(String, Subtotals)>,
    index: HashMap<String, usize>,
    next: Next<'a>,
}

impl<'a> ByPayee<'a> {
    /// Creates a payee grouping stage.
    #[must_use]
    pub fn new(next: Next<'a>) -> Self {
        Self {
            groups: Vec::new(),
            index: HashMap::new(),
            next,
        }
    }
}

impl Stage for ByPayee<'_> {
    fn accept(&mut self, xact: Transaction) -> Result<(), ChainError> {
        let slot = match self.index.get(xact.payee()) {
            Some(slot) => *slot,
            None => {
                self.groups.push((xact.payee().to_string(), Subtotals::new()));
                self.index.insert(xact.payee().to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        self.groups[slot].1.add(&xact)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ChainError> {
        let groups = std::mem::take(&mut self.groups);
        self.index.clear();
        tracing::trace!(payees = groups.len(), "Flushing payee groups");
        let mut running = Balance::new();
        for (payee, totals) in groups {
            if let Some(range) = totals.range() {
                totals.emit(&group_entry(payee, range), &mut running, &mut *self.next)?;
            }
        }
        self.next.finish()
    }

    fn name(&self) -> &'static str {
        "by_payee"
    }

    fn downstream(&self) -> Option<&dyn Stage> {
        Some(self.next.as_ref())
    }
}
