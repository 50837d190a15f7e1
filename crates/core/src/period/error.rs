//! Period specification errors.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while parsing or applying a period specification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PeriodError {
    /// The specification text is empty.
    #[error("Period specification is empty")]
    Empty,

    /// A token could not be understood.
    #[error("Unrecognized period token '{0}'")]
    UnknownToken(String),

    /// A keyword was not followed by the value it needs.
    #[error("Period keyword '{0}' is missing its argument")]
    MissingArgument(String),

    /// A date literal could not be parsed.
    #[error("Invalid period date '{0}'")]
    InvalidDate(String),

    /// An interval count was zero or not a number.
    #[error("Invalid interval count '{0}'")]
    InvalidCount(String),

    /// More than one interval was given.
    #[error("Period specification names more than one interval")]
    DuplicateInterval,

    /// The range end precedes its beginning.
    #[error("Period range is inverted: {begin} is after {end}")]
    InvertedRange {
        /// Inclusive beginning.
        begin: NaiveDate,
        /// Exclusive end.
        end: NaiveDate,
    },

    /// Bucket arithmetic left the representable calendar.
    #[error("Date {0} falls outside the representable period range")]
    OutOfRange(NaiveDate),
}

impl PeriodError {
    /// Returns a stable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Empty => "PERIOD_EMPTY",
            Self::UnknownToken(_) => "PERIOD_UNKNOWN_TOKEN",
            Self::MissingArgument(_) => "PERIOD_MISSING_ARGUMENT",
            Self::InvalidDate(_) => "PERIOD_INVALID_DATE",
            Self::InvalidCount(_) => "PERIOD_INVALID_COUNT",
            Self::DuplicateInterval => "PERIOD_DUPLICATE_INTERVAL",
            Self::InvertedRange { .. } => "PERIOD_INVERTED_RANGE",
            Self::OutOfRange(_) => "PERIOD_OUT_OF_RANGE",
        }
    }
}
