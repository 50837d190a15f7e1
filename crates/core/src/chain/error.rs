//! Chain building and streaming errors.

use tallyline_shared::types::AmountOverflow;
use thiserror::Error;

use crate::expr::ExprError;
use crate::period::PeriodError;

/// Errors raised while building or driving a report chain.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    /// An option required by the selected configuration is absent.
    #[error("Missing required option: {0}")]
    MissingOption(&'static str),

    /// An expression failed to compile or evaluate.
    #[error(transparent)]
    Expr(#[from] ExprError),

    /// A period specification failed to parse or a bucket overflowed.
    #[error(transparent)]
    Period(#[from] PeriodError),

    /// A running sum left the decimal range.
    #[error(transparent)]
    Overflow(#[from] AmountOverflow),

    /// `accept` or `finish` was called after `finish`.
    #[error("Stream already finished")]
    StreamFinished,
}

impl ChainError {
    /// Returns a stable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingOption(_) => "MISSING_OPTION",
            Self::Expr(e) => e.error_code(),
            Self::Period(e) => e.error_code(),
            Self::Overflow(e) => e.error_code(),
            Self::StreamFinished => "STREAM_FINISHED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ChainError::MissingOption("amount").error_code(), "MISSING_OPTION");
        assert_eq!(
            ChainError::MissingOption("amount").to_string(),
            "Missing required option: amount"
        );
        assert_eq!(ChainError::StreamFinished.error_code(), "STREAM_FINISHED");
        assert_eq!(
            ChainError::from(ExprError::UnknownIdentifier("x".to_string())).error_code(),
            "EXPR_UNKNOWN_IDENTIFIER"
        );
    }
}
