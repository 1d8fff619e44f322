//! Operation errors.

use serde::Serialize;
use thiserror::Error;

/// Failure reported by an operation's action.
///
/// The queue assigns no meaning to the contents: any `Err` from an action
/// (or a panic inside it) is treated uniformly as "operation failed".
#[derive(Debug, Clone, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationError {
    /// The action returned a failure.
    #[error("operation failed: {0}")]
    Failed(String),

    /// The action panicked while executing.
    #[error("operation panicked: {0}")]
    Panicked(String),
}

impl OperationError {
    /// Wrap an arbitrary error value as an operation failure.
    pub fn failed(err: impl std::fmt::Display) -> Self {
        Self::Failed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_wraps_display() {
        let error = OperationError::failed("disk full");
        assert_eq!(error.to_string(), "operation failed: disk full");
    }
}
