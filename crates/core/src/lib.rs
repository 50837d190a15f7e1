//! Report chain logic for Tallyline.
//!
//! A report is a chain of stages fed one transaction at a time. This crate
//! holds the journal model, the stages, and the builder that wires them
//! from a [`ReportOptions`](tallyline_shared::ReportOptions) set.
//!
//! # Modules
//!
//! - `journal` - Entries, postings, and the transactions read from them
//! - `expr` - Value expressions used by filters, sorting, and totals
//! - `period` - Period specifications and date ranges for interval grouping
//! - `valuation` - Price sources for market revaluation
//! - `stage` - The stage protocol and every stage implementation
//! - `chain` - Chain assembly and driving

pub mod chain;
pub mod expr;
pub mod journal;
pub mod period;
pub mod stage;
pub mod valuation;

pub use chain::{Chain, ChainBuilder, ChainError};
pub use expr::BuiltinEvaluator;
pub use journal::{Entry, Journal, Posting, Transaction};
pub use stage::{CollectSink, Stage};
pub use valuation::{PriceSource, PriceTable};
