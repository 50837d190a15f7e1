//! Report chains: assembly and driving.

pub mod builder;
pub mod error;

#[cfg(test)]
mod chain_props;
#[cfg(test)]
mod tests;

pub use builder::ChainBuilder;
pub use error::ChainError;

use crate::journal::{Journal, Transaction};
use crate::stage::{Next, Stage};

/// The head of a wired chain.
///
/// A chain accepts transactions until it is finished; any call after
/// `finish` fails with [`ChainError::StreamFinished`].
pub struct Chain<'a> {
    head: Next<'a>,
    finished: bool,
}

impl<'a> Chain<'a> {
    /// Wraps an assembled chain head.
    #[must_use]
    pub fn new(head: Next<'a>) -> Self {
        Self {
            head,
            finished: false,
        }
    }

    /// Pushes one transaction into the chain.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::StreamFinished` after `finish`, or the first
    /// error raised by a stage.
    pub fn accept(&mut self, xact: Transaction) -> Result<(), ChainError> {
        if self.finished {
            return Err(ChainError::StreamFinished);
        }
        self.head.accept(xact)
    }

    /// Ends the stream, flushing every buffering stage.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::StreamFinished` if already finished, or the
    /// first error raised while flushing.
    pub fn finish(&mut self) -> Result<(), ChainError> {
        if self.finished {
            return Err(ChainError::StreamFinished);
        }
        self.finished = true;
        self.head.finish()
    }

    /// Returns true once `finish` has been called.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Names of the stages from head to base, in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut stage: Option<&dyn Stage> = Some(self.head.as_ref());
        while let Some(current) = stage {
            names.push(current.name());
            stage = current.downstream();
        }
        names
    }

    /// Streams every transaction of `journal` through the chain and
    /// finishes it. Returns the number of transactions read.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a stage.
    pub fn run(&mut self, journal: &Journal) -> Result<usize, ChainError> {
        let mut count = 0;
        for xact in journal.transactions() {
            self.accept(xact)?;
            count += 1;
        }
        self.finish()?;
        tracing::debug!(transactions = count, "Chain finished");
        Ok(count)
    }
}
