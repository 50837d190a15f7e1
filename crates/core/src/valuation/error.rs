//! Price table errors.

use thiserror::Error;

/// Errors that can occur while loading a price table.
#[derive(Debug, Error)]
pub enum ValuationError {
    /// The price file could not be read.
    #[error("Failed to read price table: {0}")]
    Io(#[from] std::io::Error),

    /// The price file is not valid JSON for the price schema.
    #[error("Malformed price table: {0}")]
    Json(#[from] serde_json::Error),
}

impl ValuationError {
    /// Returns a stable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "PRICES_IO",
            Self::Json(_) => "PRICES_MALFORMED",
        }
    }
}
