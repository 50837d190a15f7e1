//! Report stages.
//!
//! A stage receives transactions one at a time through [`Stage::accept`]
//! and is told the stream has ended through [`Stage::finish`]. Each stage
//! owns the stage it feeds; a stage with buffered state emits it during
//! `finish` and then finishes its downstream stage. Stages that need the
//! whole stream (sorting, grouping, tail truncation) never emit before
//! `finish`.

pub mod anonymize;
pub mod calc;
pub mod collapse;
pub mod filter;
pub mod interval;
pub mod invert;
pub mod payee;
pub mod related;
pub mod revalue;
pub mod sink;
pub mod sort;
pub mod subtotal;
pub mod truncate;

pub use anonymize::Anonymize;
pub use calc::Calculator;
pub use collapse::Collapse;
pub use filter::{Filter, Predicate};
pub use interval::IntervalGroup;
pub use invert::Invert;
pub use payee::{PayeeSource, PayeeSubstitution};
pub use related::Related;
pub use revalue::Revalue;
pub use sink::CollectSink;
pub use sort::Sort;
pub use subtotal::{ByPayee, DayOfWeek, Subtotal, Subtotals};
pub use truncate::Truncate;

use crate::chain::ChainError;
use crate::journal::Transaction;

/// A unit of a report chain.
pub trait Stage {
    /// Receives one transaction, possibly forwarding it or others.
    ///
    /// # Errors
    ///
    /// Returns `ChainError` if an expression fails or downstream rejects
    /// the transaction.
    fn accept(&mut self, xact: Transaction) -> Result<(), ChainError>;

    /// Signals end of input: emits buffered output, then finishes the
    /// downstream stage.
    ///
    /// # Errors
    ///
    /// Returns `ChainError` if emitting buffered output fails.
    fn finish(&mut self) -> Result<(), ChainError>;

    /// Short name used in logs and chain listings.
    fn name(&self) -> &'static str;

    /// The stage this one feeds, if any.
    fn downstream(&self) -> Option<&dyn Stage> {
        None
    }
}

/// Owned handle to the rest of a chain.
pub type Next<'a> = Box<dyn Stage + 'a>;

impl<S: Stage + ?Sized> Stage for &mut S {
    fn accept(&mut self, xact: Transaction) -> Result<(), ChainError> {
        (**self).accept(xact)
    }

    fn finish(&mut self) -> Result<(), ChainError> {
        (**self).finish()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn downstream(&self) -> Option<&dyn Stage> {
        (**self).downstream()
    }
}
