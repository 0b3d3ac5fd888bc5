//! Muninn error types
//!
//! [`MuninnError`] is the internal error type shared by providers, stores and
//! configuration. It never reaches callers of
//! [`TickerResolutionService::resolve`](crate::TickerResolutionService::resolve)
//! directly: the provider switcher translates it into the user-facing
//! [`ErrorCode`](crate::ErrorCode) taxonomy.

use std::time::Duration;

/// Muninn error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum MuninnError {
    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Request budget exhausted, either locally (token bucket / daily cap)
    /// or upstream (HTTP 429). Never retried internally.
    #[error("rate limit exceeded for {provider}, retry after {retry_after_secs}s")]
    RateLimited {
        provider: String,
        retry_after_secs: u64,
    },

    // Data errors
    #[error("JSON error: {0}")]
    Json(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Persistence errors
    #[error("storage error: {0}")]
    Storage(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<serde_json::Error> for MuninnError {
    fn from(err: serde_json::Error) -> Self {
        MuninnError::Json(err.to_string())
    }
}

impl From<reqwest::Error> for MuninnError {
    fn from(err: reqwest::Error) -> Self {
        MuninnError::Http(err.to_string())
    }
}

impl MuninnError {
    /// Whether a later attempt at the same operation could succeed.
    ///
    /// Rate limits, transport failures and 5xx responses are transient;
    /// client errors, bad payloads, storage and configuration problems are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Http(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Json(_)
            | Self::InvalidInput(_)
            | Self::Storage(_)
            | Self::Configuration(_) => false,
        }
    }

    /// The retry-after hint carried by a rate-limit error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited {
                retry_after_secs, ..
            } => Some(Duration::from_secs(*retry_after_secs)),
            _ => None,
        }
    }
}

/// Result type alias for Muninn operations
pub type Result<T> = std::result::Result<T, MuninnError>;
