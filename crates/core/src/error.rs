//! Unified error types for the emissions cache.
//!
//! Every failure of the measure engine falls into one of three classes, each
//! with its own client-facing outcome when surfaced through the MCP server.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Unified error type for the emissions cache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller supplied malformed or empty input. Never retried.
    #[error("VALIDATION_ERROR: {message}")]
    Validation {
        /// Index of the offending row, when the failure is row-specific.
        row: Option<usize>,
        message: String,
    },

    /// The resolver call failed or returned an unusable payload.
    #[error("EXTERNAL_ERROR: {0}")]
    External(String),

    /// An invariant the engine relies on was violated.
    #[error("INTERNAL_ERROR: {0}")]
    Internal(String),

    /// No live cache entry for the given key.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),
}

impl Error {
    /// Validation failure that is not tied to a single row.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation { row: None, message: message.into() }
    }

    /// Validation failure for the row at `index`.
    pub fn invalid_row(index: usize, message: impl Into<String>) -> Self {
        Error::Validation { row: Some(index), message: message.into() }
    }

    /// Only external failures may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::External(_))
    }

    /// Reclassify a resolver failure as [`Error::External`].
    pub(crate) fn into_external(self) -> Self {
        match self {
            Error::External(_) => self,
            other => Error::External(format!("failed to fetch emissions data: {other}")),
        }
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message, data) = match &err {
            Error::Validation { row, message } => {
                (-32602, message.clone(), row.map(|i| serde_json::json!({ "row": i })))
            }
            Error::External(msg) => (-32003, msg.clone(), Some(serde_json::json!({ "retryable": true }))),
            Error::Internal(msg) => (-32603, msg.clone(), None),
            Error::CacheMiss(key) => (-32001, format!("no cache entry for key: {key}"), None),
        };

        McpError { code: ErrorCode(code), message: message.into(), data }
    }
}
