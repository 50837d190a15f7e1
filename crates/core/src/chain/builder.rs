//! Chain assembly.
//!
//! Stages execute in this order, each enabled by its option:
//!
//! | # | Stage | Option |
//! |---|-------|--------|
//! | 1 | truncate | `head` / `tail` |
//! | 2 | display filter | `display` |
//! | 3 | running total | `amount` (required) |
//! | 4 | only filter | `only` |
//! | 5 | sort | `sort`, `sort_entries` |
//! | 6 | revaluation | `revalued`, `revalued_only` |
//! | 7 | collapse | `collapse` |
//! | 8 | grouping | `dow`, else `by_payee`, else `subtotal` |
//! | 9 | interval grouping, then date sort | `period` |
//! | 10 | invert | `invert` |
//! | 11 | related expansion | `related`, `related_all` |
//! | 12 | anonymize | `anon` |
//! | 13 | limit filter | `limit` |
//! | 14 | payee substitution | `comm_as_payee`, else `code_as_payee` |
//!
//! Stages 1 through 9 exist only for individual-transaction reports.
//! Each stage wraps the chain assembled so far, so wiring runs from the
//! base stage back to the head: the stage wired last executes first.

use std::rc::Rc;

use tallyline_shared::ReportOptions;

use super::error::ChainError;
use super::Chain;
use crate::expr::Evaluator;
use crate::period::PeriodSpec;
use crate::stage::{
    Anonymize, ByPayee, Calculator, Collapse, DayOfWeek, Filter, IntervalGroup, Invert, Next,
    PayeeSource, PayeeSubstitution, Predicate, Related, Revalue, Sort, Stage, Subtotal, Truncate,
};
use crate::valuation::{NoPrices, PriceSource};

/// Builds report chains from a set of options.
///
/// The builder compiles every expression and parses the period before
/// returning, so configuration errors surface before any transaction is
/// processed.
pub struct ChainBuilder<'o> {
    options: &'o ReportOptions,
    evaluator: &'o dyn Evaluator,
    prices: Rc<dyn PriceSource>,
}

impl<'o> ChainBuilder<'o> {
    /// Creates a builder. Revaluation uses [`NoPrices`] unless a price
    /// source is supplied.
    #[must_use]
    pub fn new(options: &'o ReportOptions, evaluator: &'o dyn Evaluator) -> Self {
        Self {
            options,
            evaluator,
            prices: Rc::new(NoPrices),
        }
    }

    /// Sets the price source used by revaluation.
    #[must_use]
    pub fn with_prices(mut self, prices: Rc<dyn PriceSource>) -> Self {
        self.prices = prices;
        self
    }

    fn predicate(&self, text: &str) -> Result<Predicate, ChainError> {
        Ok(Predicate::compile(self.evaluator, text, self.options.keep)?)
    }

    /// Wires the chain in front of `base`.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::MissingOption` if an individual-transaction
    /// report has no amount expression, or the first expression or period
    /// error encountered.
    pub fn build<'a>(&self, base: &'a mut dyn Stage) -> Result<Chain<'a>, ChainError> {
        let options = self.options;

        let amount = if options.individual_xacts {
            let text = options
                .amount
                .as_deref()
                .ok_or(ChainError::MissingOption("amount"))?;
            Some(self.evaluator.compile(text)?)
        } else {
            None
        };

        let mut chain: Next<'a> = Box::new(base);

        if options.comm_as_payee {
            chain = wire(PayeeSubstitution::new(PayeeSource::Commodity, chain));
        } else if options.code_as_payee {
            chain = wire(PayeeSubstitution::new(PayeeSource::Code, chain));
        }

        if let Some(text) = &options.limit {
            let predicate = self.predicate(text)?;
            tracing::debug!(predicate = predicate.source(), "Limit predicate");
            chain = wire(Filter::new("limit_filter", predicate, chain));
        }

        if options.anon {
            chain = wire(Anonymize::new(chain));
        }

        if options.related_enabled() {
            chain = wire(Related::new(options.related_all, chain));
        }

        if options.invert {
            chain = wire(Invert::new(chain));
        }

        let Some(amount) = amount else {
            return Ok(Chain::new(chain));
        };

        if let Some(text) = &options.period {
            let spec = PeriodSpec::parse(text)?;
            chain = wire(Sort::by_date(chain));
            chain = wire(IntervalGroup::new(spec, chain));
        }

        if options.dow {
            chain = wire(DayOfWeek::new(chain));
        } else if options.by_payee {
            chain = wire(ByPayee::new(chain));
        } else if options.subtotal {
            chain = wire(Subtotal::new(chain));
        }

        if options.collapse {
            chain = wire(Collapse::new(chain));
        }

        if options.revaluation_enabled() {
            chain = wire(Revalue::new(
                Rc::clone(&self.prices),
                options.revalued_only,
                chain,
            ));
        }

        if let Some(text) = &options.sort {
            let key = self.evaluator.compile(text)?;
            chain = if options.sort_entries {
                wire(Sort::entries(key, chain))
            } else {
                wire(Sort::transactions(key, chain))
            };
        }

        if let Some(text) = &options.only {
            chain = wire(Filter::new("only_filter", self.predicate(text)?, chain));
        }

        chain = wire(Calculator::new(amount, chain));

        if let Some(text) = &options.display {
            chain = wire(Filter::new("display_filter", self.predicate(text)?, chain));
        }

        if options.truncation_enabled() {
            chain = wire(Truncate::new(options.head, options.tail, chain));
        }

        Ok(Chain::new(chain))
    }
}

fn wire<'a>(stage: impl Stage + 'a) -> Next<'a> {
    tracing::debug!(stage = stage.name(), "Wiring stage");
    Box::new(stage)
}
