//! Reporting periods and interval bucketing.

pub mod error;
pub mod spec;

pub use error::PeriodError;
pub use spec::{DateRange, Interval, IntervalUnit, PeriodSpec};
