//! Predicate filtering.

use tallyline_shared::KeepPolicy;

use super::{Next, Stage};
use crate::chain::ChainError;
use crate::expr::{Evaluator, Expr, ExprError};
use crate::journal::Transaction;

/// A compiled predicate together with its evaluation policy.
#[derive(Debug)]
pub struct Predicate {
    expr: Box<dyn Expr>,
    keep: KeepPolicy,
}

impl Predicate {
    /// Wraps an already compiled expression.
    #[must_use]
    pub fn new(expr: Box<dyn Expr>, keep: KeepPolicy) -> Self {
        Self { expr, keep }
    }

    /// Compiles `text` with `evaluator`.
    ///
    /// # Errors
    ///
    /// Returns the evaluator's error for malformed text.
    pub fn compile(
        evaluator: &dyn Evaluator,
        text: &str,
        keep: KeepPolicy,
    ) -> Result<Self, ExprError> {
        Ok(Self::new(evaluator.compile(text)?, keep))
    }

    /// The predicate's source text.
    #[must_use]
    pub fn source(&self) -> &str {
        self.expr.source()
    }

    /// Evaluates the predicate for `xact`.
    ///
    /// Under [`KeepPolicy::Entry`] a transaction also matches when any
    /// other posting of its entry does.
    ///
    /// # Errors
    ///
    /// Returns `ExprError` if evaluation fails.
    pub fn matches(&self, xact: &Transaction) -> Result<bool, ExprError> {
        if self.expr.eval(xact)?.is_truthy() {
            return Ok(true);
        }
        if self.keep == KeepPolicy::Transaction {
            return Ok(false);
        }
        for sibling in Transaction::all_of(&xact.entry) {
            if sibling.origin != xact.origin && self.expr.eval(&sibling)?.is_truthy() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Forwards only the transactions its predicate keeps.
pub struct Filter<'a> {
    name: &'static str,
    predicate: Predicate,
    next: Next<'a>,
}

impl<'a> Filter<'a> {
    /// Creates a filter; `name` distinguishes filters in a chain listing.
    #[must_use]
    pub fn new(name: &'static str, predicate: Predicate, next: Next<'a>) -> Self {
        Self {
            name,
            predicate,
            next,
        }
    }
}

impl Stage for Filter<'_> {
    fn accept(&mut self, xact: Transaction) -> Result<(), ChainError> {
        if self.predicate.matches(&xact)? {
            self.next.accept(xact)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ChainError> {
        self.next.finish()
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn downstream(&self) -> Option<&dyn Stage> {
        Some(self.next.as_ref())
    }
}
