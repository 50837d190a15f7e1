//! Expression errors.

use thiserror::Error;

/// Errors raised while compiling or evaluating an expression.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExprError {
    /// The expression text is malformed.
    #[error("Parse error at offset {position}: {message}")]
    Parse {
        /// Byte offset of the offending token.
        position: usize,
        /// What was wrong.
        message: String,
    },

    /// An identifier does not name a transaction field.
    #[error("Unknown identifier: {0}")]
    UnknownIdentifier(String),

    /// An operator was applied to values it does not support.
    #[error("Cannot apply '{op}' to {left} and {right}")]
    TypeMismatch {
        /// The operator.
        op: &'static str,
        /// Type of the left operand.
        left: &'static str,
        /// Type of the right operand.
        right: &'static str,
    },

    /// A regular expression literal failed to compile.
    #[error("Invalid regex /{pattern}/: {message}")]
    InvalidRegex {
        /// The pattern text.
        pattern: String,
        /// Compiler diagnostic.
        message: String,
    },

    /// Arithmetic left the decimal range.
    #[error("Overflow in '{op}'")]
    Overflow {
        /// The operator.
        op: &'static str,
    },
}

impl ExprError {
    /// Returns a stable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "EXPR_PARSE",
            Self::UnknownIdentifier(_) => "EXPR_UNKNOWN_IDENTIFIER",
            Self::TypeMismatch { .. } => "EXPR_TYPE_MISMATCH",
            Self::InvalidRegex { .. } => "EXPR_INVALID_REGEX",
            Self::Overflow { .. } => "EXPR_OVERFLOW",
        }
    }

    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }
}
