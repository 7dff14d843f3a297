//! Feed error types

use thiserror::Error;

/// Errors raised by market data collaborators
#[derive(Debug, Error)]
pub enum FeedError {
    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Exchange answered with a non-zero return code
    #[error("Exchange API error {code}: {message}")]
    Api { code: i64, message: String },
    /// Response body could not be interpreted
    #[error("Malformed response: {0}")]
    Parse(String),
    /// Source has no data for the symbol
    #[error("No data for {0}")]
    NotFound(String),
    /// Source is not configured or reachable
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}
