//! Scope3 API client error types.

use std::sync::Arc;

use emissions_core::Error;

/// Errors from the Scope3 API client.
#[derive(Debug, thiserror::Error)]
pub enum Scope3Error {
    /// No API token configured.
    #[error("missing API token: EMISSIONS_SCOPE3_TOKEN not set")]
    MissingToken,

    /// The configured base URL cannot be used.
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    /// Nothing to measure.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication failed (invalid token).
    #[error("authentication failed: invalid API token")]
    AuthError,

    /// Rate limited by the Scope3 API.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// Non-success HTTP response.
    #[error("Scope3 API error (status: {status}): {body}")]
    HttpError { status: u16, body: String },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for Scope3Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { Scope3Error::Timeout } else { Scope3Error::Network(Arc::new(err)) }
    }
}

impl From<Scope3Error> for Error {
    fn from(err: Scope3Error) -> Self {
        Error::External(format!("failed to fetch emissions data from Scope3: {err}"))
    }
}
