//! Resolution outcome types.
//!
//! [`ResolutionResult`] is the only shape `resolve` ever returns: a
//! confirmed ticker, a list of candidates needing confirmation, or a typed
//! error. There is no fourth "best guess" variant.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// User-facing error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No provider (or the mock table) knows the query.
    NotFound,
    /// A provider's request budget is exhausted; see `retry_after`.
    RateLimit,
    /// Every provider was skipped or failed.
    ProviderDown,
    LowConfidence,
    Ambiguous,
    /// Empty or whitespace-only query.
    InvalidInput,
    NetworkError,
}

impl ErrorCode {
    /// Wire name, e.g. `"NOT_FOUND"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::RateLimit => "RATE_LIMIT",
            Self::ProviderDown => "PROVIDER_DOWN",
            Self::LowConfidence => "LOW_CONFIDENCE",
            Self::Ambiguous => "AMBIGUOUS",
            Self::InvalidInput => "INVALID_INPUT",
            Self::NetworkError => "NETWORK_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A confirmed resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTicker {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    /// Match confidence in `0.0..=1.0`.
    pub confidence: f64,
    /// Provider that produced the mapping ("Yahoo", "Mock", ...).
    pub source: String,
    /// Whether the answer came from the name→symbol cache.
    pub from_cache: bool,
}

/// A low-confidence match offered for confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub confidence: f64,
}

/// A typed, user-visible resolution failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    /// How long to wait before asking again (serialised as milliseconds).
    #[serde(
        default,
        rename = "retry_after_ms",
        skip_serializing_if = "Option::is_none",
        with = "duration_ms"
    )]
    pub retry_after: Option<Duration>,
}

impl ResolutionError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            suggestions: None,
            retry_after: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn provider_down(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProviderDown, message)
    }

    pub fn rate_limited(message: impl Into<String>, retry_after: Duration) -> Self {
        Self::new(ErrorCode::RateLimit, message).with_retry_after(retry_after)
    }

    /// Attach suggestions. An empty list leaves `suggestions` unset.
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        if !suggestions.is_empty() {
            self.suggestions = Some(suggestions);
        }
        self
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    /// Retry-after hint in whole milliseconds.
    pub fn retry_after_ms(&self) -> Option<u64> {
        self.retry_after.map(saturating_ms)
    }
}

fn saturating_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ResolutionError {}

/// Outcome of a single `resolve` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResolutionResult {
    Success(ResolvedTicker),
    Candidates {
        candidates: Vec<Candidate>,
        message: String,
    },
    Error(ResolutionError),
}

impl ResolutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The resolved ticker, if this is a success.
    pub fn as_success(&self) -> Option<&ResolvedTicker> {
        match self {
            Self::Success(ticker) => Some(ticker),
            _ => None,
        }
    }

    /// The error, if this is a failure.
    pub fn as_error(&self) -> Option<&ResolutionError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.as_error().map(|e| e.code)
    }

    /// Short outcome label used for metrics and logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Candidates { .. } => "candidates",
            Self::Error(err) => err.code.as_str(),
        }
    }
}

impl From<ResolutionError> for ResolutionResult {
    fn from(err: ResolutionError) -> Self {
        Self::Error(err)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&super::saturating_ms(*d)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
