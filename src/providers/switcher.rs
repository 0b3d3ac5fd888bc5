//! Provider fallback chain.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument, warn};

use super::traits::TickerProvider;
use crate::MuninnError;
use crate::matching;
use crate::telemetry;
use crate::types::{ProviderResult, ProviderStatus, ResolutionError};

/// A provider match, tagged with the provider that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderMatch {
    pub result: ProviderResult,
    pub provider: String,
}

/// A typed failure, tagged with the provider that decided it (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderFailure {
    pub error: ResolutionError,
    pub provider: Option<String>,
}

impl ProviderFailure {
    fn new(error: ResolutionError, provider: Option<&str>) -> Self {
        Self {
            error,
            provider: provider.map(str::to_owned),
        }
    }
}

/// Ordered list of providers with fallback semantics.
///
/// Providers are tried in registration order (index 0 = primary). For each:
///
/// - unavailable → skipped without a request
/// - match → returned immediately
/// - not found → `NOT_FOUND` immediately, with alias suggestions; the next
///   provider is *not* consulted unless
///   [`not_found_fallthrough`](Self::not_found_fallthrough) is enabled
/// - rate limited → `RATE_LIMIT` immediately, with the retry-after hint
/// - any other error → logged, next provider
///
/// When every provider has been skipped or failed the outcome is
/// `PROVIDER_DOWN`.
#[derive(Default)]
pub struct ProviderSwitcher {
    providers: Vec<Arc<dyn TickerProvider>>,
    not_found_fallthrough: bool,
}

impl ProviderSwitcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider. Earlier registrations keep priority.
    pub fn register(&mut self, provider: Arc<dyn TickerProvider>) {
        debug!(provider = provider.name(), position = self.providers.len(), "provider registered");
        self.providers.push(provider);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_provider(mut self, provider: Arc<dyn TickerProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Let a not-found from one provider fall through to the next.
    ///
    /// Off by default. When on, `NOT_FOUND` is only returned once every
    /// remaining provider has been asked (or skipped) and at least one of
    /// them answered not-found.
    pub fn not_found_fallthrough(mut self, enabled: bool) -> Self {
        self.not_found_fallthrough = enabled;
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Names in priority order.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_owned()).collect()
    }

    /// Names of the providers that would currently accept a request.
    pub fn available_providers(&self) -> Vec<String> {
        self.providers
            .iter()
            .filter(|p| p.is_available())
            .map(|p| p.name().to_owned())
            .collect()
    }

    pub fn is_any_available(&self) -> bool {
        self.providers.iter().any(|p| p.is_available())
    }

    pub fn statuses(&self) -> Vec<ProviderStatus> {
        self.providers.iter().map(|p| p.status()).collect()
    }

    /// Resolve `query` through the chain.
    #[instrument(skip(self), fields(providers = self.providers.len()))]
    pub async fn search(&self, query: &str) -> Result<ProviderMatch, ProviderFailure> {
        if query.trim().is_empty() {
            return Err(ProviderFailure::new(
                ResolutionError::invalid_input("Search query cannot be empty"),
                None,
            ));
        }

        let mut not_found_by: Option<&str> = None;

        for provider in &self.providers {
            let name = provider.name();
            if !provider.is_available() {
                debug!(provider = name, "skipping unavailable provider");
                continue;
            }

            let start = Instant::now();
            match provider.search(query).await {
                Ok(Some(result)) => {
                    Self::record_request(name, "found", start);
                    debug!(provider = name, symbol = %result.symbol, confidence = result.confidence, "provider match");
                    return Ok(ProviderMatch {
                        result,
                        provider: name.to_owned(),
                    });
                }
                Ok(None) => {
                    Self::record_request(name, "not_found", start);
                    if !self.not_found_fallthrough {
                        return Err(Self::not_found(query, name));
                    }
                    not_found_by.get_or_insert(name);
                }
                Err(e @ MuninnError::RateLimited { .. }) => {
                    Self::record_request(name, "rate_limited", start);
                    let retry_after = e.retry_after().unwrap_or_default();
                    return Err(ProviderFailure::new(
                        ResolutionError::rate_limited(e.to_string(), retry_after),
                        Some(name),
                    ));
                }
                Err(e) => {
                    Self::record_request(name, "error", start);
                    warn!(provider = name, error = %e, "provider failed, trying next");
                }
            }
        }

        if let Some(name) = not_found_by {
            return Err(Self::not_found(query, name));
        }

        Err(ProviderFailure::new(
            ResolutionError::provider_down(
                "All ticker resolution providers are currently unavailable",
            ),
            None,
        ))
    }

    fn not_found(query: &str, provider: &str) -> ProviderFailure {
        ProviderFailure::new(
            ResolutionError::not_found(format!("No results found for \"{query}\""))
                .with_suggestions(matching::suggestions(query)),
            Some(provider),
        )
    }

    /// Record request count and latency for one provider attempt.
    fn record_request(provider: &str, status: &'static str, start: Instant) {
        let elapsed = start.elapsed().as_secs_f64();
        metrics::counter!(telemetry::PROVIDER_REQUESTS_TOTAL,
            "provider" => provider.to_owned(),
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::PROVIDER_REQUEST_DURATION_SECONDS,
            "provider" => provider.to_owned(),
        )
        .record(elapsed);
    }
}

impl std::fmt::Debug for ProviderSwitcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSwitcher")
            .field("providers", &self.provider_names())
            .field("not_found_fallthrough", &self.not_found_fallthrough)
            .finish()
    }
}
