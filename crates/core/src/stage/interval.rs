//! Interval (period) grouping.

use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::NaiveDate;
use tallyline_shared::types::Balance;

use super::subtotal::Subtotals;
use super::{Next, Stage};
use crate::chain::ChainError;
use crate::journal::{Entry, Transaction};
use crate::period::{DateRange, PeriodSpec};

/// Buckets transactions into the periods of a [`PeriodSpec`].
///
/// Transactions outside the period's range are dropped. Buckets are
/// anchored at the period's beginning, or at the natural boundary of the
/// first date seen, and are emitted in date order at finish. Without an
/// interval the whole range forms one bucket.
pub struct IntervalGroup<'a> {
    spec: PeriodSpec,
    anchor: Option<NaiveDate>,
    buckets: BTreeMap<DateRange, Subtotals>,
    whole: Subtotals,
    next: Next<'a>,
}

impl<'a> IntervalGroup<'a> {
    /// Creates an interval grouping stage.
    #[must_use]
    pub fn new(spec: PeriodSpec, next: Next<'a>) -> Self {
        Self {
            spec,
            anchor: None,
            buckets: BTreeMap::new(),
            whole: Subtotals::new(),
            next,
        }
    }

    /// Range reported for the single bucket of an interval-less spec.
    fn whole_range(&self, seen: DateRange) -> DateRange {
        let start = self.spec.begin.unwrap_or(seen.start);
        let end = self
            .spec
            .end
            .and_then(|end| end.pred_opt())
            .unwrap_or(seen.end);
        DateRange::new(start, end)
    }
}

impl Stage for IntervalGroup<'_> {
    fn accept(&mut self, xact: Transaction) -> Result<(), ChainError> {
        let date = xact.date();
        if !self.spec.contains(date) {
            return Ok(());
        }

        let Some(interval) = self.spec.interval else {
            self.whole.add(&xact)?;
            return Ok(());
        };
        let spec = self.spec;
        let anchor = *self.anchor.get_or_insert_with(|| spec.anchor_for(date));
        let bucket = interval.bucket(anchor, date)?;
        self.buckets.entry(bucket).or_default().add(&xact)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ChainError> {
        let buckets = std::mem::take(&mut self.buckets);
        let whole = std::mem::take(&mut self.whole);
        tracing::trace!(buckets = buckets.len(), "Flushing interval buckets");

        let mut running = Balance::new();
        if let Some(seen) = whole.range() {
            let range = self.whole_range(seen);
            whole.emit(&bucket_entry(range), &mut running, &mut *self.next)?;
        }
        for (range, totals) in buckets {
            totals.emit(&bucket_entry(range), &mut running, &mut *self.next)?;
        }
        self.next.finish()
    }

    fn name(&self) -> &'static str {
        "interval"
    }

    fn downstream(&self) -> Option<&dyn Stage> {
        Some(self.next.as_ref())
    }
}

fn bucket_entry(range: DateRange) -> Rc<Entry> {
    Rc::new(Entry::synthetic(range.start, range.to_string(), Some(range)))
}
