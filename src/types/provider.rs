//! Provider-facing value types.

use serde::{Deserialize, Serialize};

/// A single match returned by a [`TickerProvider`](crate::providers::TickerProvider).
///
/// Transient: it only becomes a cache entry after passing the service's
/// confidence gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub confidence: f64,
    /// Original upstream payload, kept for diagnostics only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

impl ProviderResult {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        sector: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            sector: sector.into(),
            confidence,
            raw: None,
        }
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }
}

/// Diagnostic snapshot of a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub name: String,
    pub available: bool,
    /// Requests left in the current daily window.
    pub remaining_quota: u32,
    /// ISO-8601 timestamp of the next daily quota reset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<String>,
    /// ISO-8601 timestamp until which the provider is cooling down after a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_until: Option<String>,
    /// Most recent transport failure, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ProviderStatus {
    pub fn new(name: impl Into<String>, available: bool, remaining_quota: u32) -> Self {
        Self {
            name: name.into(),
            available,
            remaining_quota,
            reset_at: None,
            down_until: None,
            last_error: None,
        }
    }
}
