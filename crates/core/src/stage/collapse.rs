//! Per-entry collapsing.

use std::collections::HashMap;
use std::rc::Rc;

use rust_decimal::Decimal;
use tallyline_shared::types::{Amount, Balance, EntryId};

use super::{Next, Stage};
use crate::chain::ChainError;
use crate::journal::Transaction;

/// Account of collapsed transactions.
pub const TOTAL_ACCOUNT: &str = "<Total>";

struct Group {
    members: Vec<Transaction>,
}

impl Group {
    fn into_output(self) -> Result<Vec<Transaction>, ChainError> {
        if self.members.len() == 1 {
            return Ok(self.members);
        }

        let mut sum = Balance::new();
        for xact in &self.members {
            sum.add_amount(&xact.amount)?;
        }
        let Some(last) = self.members.last() else {
            return Ok(Vec::new());
        };

        let mut amounts: Vec<Amount> = sum.amounts().collect();
        if amounts.is_empty() {
            amounts.push(Amount::number(Decimal::ZERO));
        }
        Ok(amounts
            .into_iter()
            .map(|amount| {
                let mut xact = Transaction::synthetic(Rc::clone(&last.entry), TOTAL_ACCOUNT, amount);
                xact.total.clone_from(&last.total);
                xact
            })
            .collect())
    }
}

/// Replaces each entry's transactions with one `<Total>` transaction per
/// commodity.
///
/// Groups are keyed by entry and emitted at finish in the order their
/// entries were first seen. An entry that contributed a single
/// transaction passes it through unchanged.
pub struct Collapse<'a> {
    groups: Vec<Group>,
    index: HashMap<EntryId, usize>,
    next: Next<'a>,
}

impl<'a> Collapse<'a> {
    /// Creates a collapsing stage.
    #[must_use]
    pub fn new(next: Next<'a>) -> Self {
        Self {
            groups: Vec::new(),
            index: HashMap::new(),
            next,
        }
    }
}

impl Stage for Collapse<'_> {
    fn accept(&mut self, xact: Transaction) -> Result<(), ChainError> {
        let groups = &mut self.groups;
        let slot = *self.index.entry(xact.entry_id()).or_insert_with(|| {
            groups.push(Group {
                members: Vec::new(),
            });
            groups.len() - 1
        });
        self.groups[slot].members.push(xact);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ChainError> {
        let groups = std::mem::take(&mut self.groups);
        self.index.clear();
        tracing::trace!(entries = groups.len(), "Flushing collapsed entries");
        for group in groups {
            for xact in group.into_output()? {
                self.next.accept(xact)?;
            }
        }
        self.next.finish()
    }

    fn name(&self) -> &'static str {
        "collapse"
    }

    fn downstream(&self) -> Option<&dyn Stage> {
        Some(self.next.as_ref())
    }
}
