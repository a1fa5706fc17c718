//! Error types for GitHub API operations.
//!
//! Errors are [`Clone`] so that one failed fetch can be reported to every
//! caller that was waiting on it; underlying sources are shared through
//! [`Arc`].

use std::sync::Arc;

use hubnote_config::ConfigError;

/// HTTP status GitHub uses for missing resources.
pub const NOT_FOUND: u16 = 404;

/// Errors that can occur during GitHub API operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// GitHub answered with a non-success status.
    #[error("GitHub request failed with status {status}{}", format_message(.body))]
    Request {
        /// The HTTP status code.
        status: u16,
        /// The raw response body.
        body: String,
    },

    /// The HTTP client failed before a response was received.
    #[error("GitHub API error: {0}")]
    Api(Arc<octocrab::Error>),

    /// A response or parameter object could not be (de)serialized.
    #[error("failed to decode GitHub payload: {0}")]
    Decode(Arc<serde_json::Error>),

    /// A request URL or header could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The configuration could not be turned into a client.
    #[error("invalid configuration: {0}")]
    Config(Arc<ConfigError>),

    /// An I/O error occurred during cache operations.
    #[error("I/O error during cache operation: {0}")]
    Io(Arc<std::io::Error>),
}

impl Error {
    /// Returns the HTTP status if GitHub answered with an error status.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if GitHub reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(NOT_FOUND)
    }
}

/// Extracts GitHub's `message` from an error body for display.
fn format_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("message")?.as_str().map(ToOwned::to_owned))
        .map(|message| format!(": {message}"))
        .unwrap_or_default()
}

impl From<octocrab::Error> for Error {
    fn from(error: octocrab::Error) -> Self {
        Self::Api(Arc::new(error))
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(Arc::new(error))
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io(Arc::new(error))
    }
}

impl From<ConfigError> for Error {
    fn from(error: ConfigError) -> Self {
        Self::Config(Arc::new(error))
    }
}

impl From<url::ParseError> for Error {
    fn from(error: url::ParseError) -> Self {
        Self::InvalidRequest(error.to_string())
    }
}

/// A specialized Result type for GitHub API operations.
pub type Result<T> = std::result::Result<T, Error>;
