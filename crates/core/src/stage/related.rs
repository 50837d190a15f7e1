//! Related-transaction expansion.

use std::collections::HashSet;
use std::rc::Rc;

use tallyline_shared::types::EntryId;

use super::{Next, Stage};
use crate::chain::ChainError;
use crate::journal::{Entry, Transaction};

/// The transactions of one entry received in a row.
struct Run {
    entry: Rc<Entry>,
    received: Vec<Transaction>,
}

/// Replaces each entry's received transactions with the entry's other
/// postings.
///
/// By default only the real postings that did not themselves arrive are
/// emitted. In `all` mode every posting of the entry is emitted, using the
/// received transaction where one arrived. Each posting is emitted at
/// most once over the whole stream. Transactions are grouped by runs of
/// consecutive arrivals from the same entry.
pub struct Related<'a> {
    all: bool,
    run: Option<Run>,
    emitted: HashSet<(EntryId, usize)>,
    next: Next<'a>,
}

impl<'a> Related<'a> {
    /// Creates a related-expansion stage.
    #[must_use]
    pub fn new(all: bool, next: Next<'a>) -> Self {
        Self {
            all,
            run: None,
            emitted: HashSet::new(),
            next,
        }
    }

    fn flush_run(&mut self) -> Result<(), ChainError> {
        let Some(Run { entry, mut received }) = self.run.take() else {
            return Ok(());
        };

        let mut output = Vec::new();
        for (index, posting) in entry.postings.iter().enumerate() {
            let arrived = received.iter().position(|x| x.origin == Some(index));
            let wanted = self.all || (arrived.is_none() && !posting.is_virtual);
            if !wanted || !self.emitted.insert((entry.id, index)) {
                continue;
            }
            match arrived {
                Some(position) => output.push(received.swap_remove(position)),
                None => output.extend(Transaction::from_posting(&entry, index)),
            }
        }
        if self.all {
            // Synthesized transactions have no posting of their own.
            output.extend(received.into_iter().filter(|x| x.origin.is_none()));
        }

        for xact in output {
            self.next.accept(xact)?;
        }
        Ok(())
    }
}

impl Stage for Related<'_> {
    fn accept(&mut self, xact: Transaction) -> Result<(), ChainError> {
        let continues = self
            .run
            .as_ref()
            .is_some_and(|run| run.entry.id == xact.entry_id());
        if !continues {
            self.flush_run()?;
            self.run = Some(Run {
                entry: Rc::clone(&xact.entry),
                received: Vec::new(),
            });
        }
        if let Some(run) = &mut self.run {
            run.received.push(xact);
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ChainError> {
        self.flush_run()?;
        self.next.finish()
    }

    fn name(&self) -> &'static str {
        "related"
    }

    fn downstream(&self) -> Option<&dyn Stage> {
        Some(self.next.as_ref())
    }
}
