//! Boundary error type returned by the engine to its callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using `CommonError`.
pub type CommonResult<T> = Result<T, CommonError>;

/// The only error shape that crosses the engine boundary.
///
/// Callers surface `message` to the user as-is. `code` is a stable
/// machine-readable tag taken from the underlying failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct CommonError {
    /// Stable error code (e.g. `LEDGER_IMBALANCE`).
    pub code: String,
    /// Human readable message; always names the charge it belongs to.
    pub message: String,
}

impl CommonError {
    /// Creates a new boundary error.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates an error with the generic `INTERNAL_ERROR` code.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}
