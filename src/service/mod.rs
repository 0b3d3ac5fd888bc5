//! The ticker resolution façade.
//!
//! [`TickerResolutionService`] is what callers hold. It owns both caches,
//! the provider chain and the blob store, and is assembled by
//! [`MuninnBuilder`](crate::MuninnBuilder):
//!
//! ```rust,no_run
//! use muninn::{Muninn, ResolveOptions, ResolutionResult};
//!
//! # async fn run() -> muninn::Result<()> {
//! let service = Muninn::builder().yahoo().build()?;
//! service.initialize()?;
//!
//! match service.resolve("apple", &ResolveOptions::default()).await {
//!     ResolutionResult::Success(t) => println!("{} ({})", t.symbol, t.name),
//!     ResolutionResult::Candidates { message, .. } => println!("{message}"),
//!     ResolutionResult::Error(e) => eprintln!("{e}"),
//! }
//! # Ok(())
//! # }
//! ```

mod builder;
pub mod mock;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

pub use builder::{Muninn, MuninnBuilder};

use crate::Result;
use crate::cache::{BlobStore, CacheEntry, CacheStats, CacheValue, TickerCache};
use crate::matching;
use crate::providers::{ProviderMatch, ProviderSwitcher};
use crate::telemetry;
use crate::types::{
    Candidate, ErrorCode, ProviderStatus, ResolutionError, ResolutionMode, ResolutionResult,
    ResolveOptions, ResolvedTicker, normalize_query,
};

/// Minimum provider confidence for an automatic match.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.85;

/// Source recorded on a negative entry when no provider claimed the not-found.
const UNKNOWN_SOURCE: &str = "Unknown";

/// Stats of both caches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatus {
    pub name_to_symbol: CacheStats,
    pub symbol_to_name: CacheStats,
}

/// Diagnostic snapshot returned by [`TickerResolutionService::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub mode: ResolutionMode,
    pub providers: Vec<ProviderStatus>,
    pub cache: CacheStatus,
}

/// Turns free-text queries into ticker symbols.
///
/// In [`ResolutionMode::Live`] a query is answered from the name→symbol
/// cache when possible, otherwise by the provider chain; confident matches
/// and not-founds are written back and persisted. In
/// [`ResolutionMode::Mock`] the static alias table answers and neither the
/// caches nor the providers are touched.
///
/// The service never invents a symbol: a match below the confidence
/// threshold comes back as [`ResolutionResult::Candidates`].
pub struct TickerResolutionService {
    mode: ResolutionMode,
    switcher: ProviderSwitcher,
    name_to_symbol: TickerCache,
    symbol_to_name: TickerCache,
    store: Arc<dyn BlobStore>,
    confidence_threshold: f64,
}

impl TickerResolutionService {
    pub(crate) fn from_parts(
        mode: ResolutionMode,
        switcher: ProviderSwitcher,
        name_to_symbol: TickerCache,
        symbol_to_name: TickerCache,
        store: Arc<dyn BlobStore>,
        confidence_threshold: f64,
    ) -> Self {
        Self {
            mode,
            switcher,
            name_to_symbol,
            symbol_to_name,
            store,
            confidence_threshold,
        }
    }

    /// Warm both caches from the blob store.
    ///
    /// Call once at startup. Corrupt snapshots are logged and skipped; only
    /// a failing store is an error.
    pub fn initialize(&self) -> Result<()> {
        let names = self.name_to_symbol.load(self.store.as_ref())?;
        let symbols = self.symbol_to_name.load(self.store.as_ref())?;
        info!(
            mode = %self.mode,
            name_to_symbol = names,
            symbol_to_name = symbols,
            "resolution caches loaded"
        );
        Ok(())
    }

    /// Write both caches to the blob store.
    pub fn persist(&self) -> Result<()> {
        self.name_to_symbol.persist(self.store.as_ref())?;
        self.symbol_to_name.persist(self.store.as_ref())
    }

    fn persist_quietly(&self, cache: &TickerCache) {
        if let Err(e) = cache.persist(self.store.as_ref()) {
            warn!(cache = cache.name(), error = %e, "failed to persist cache");
        }
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    pub fn switcher(&self) -> &ProviderSwitcher {
        &self.switcher
    }

    pub fn name_to_symbol_cache(&self) -> &TickerCache {
        &self.name_to_symbol
    }

    pub fn symbol_to_name_cache(&self) -> &TickerCache {
        &self.symbol_to_name
    }

    /// Resolve a user query to a ticker.
    #[instrument(skip(self, options), fields(mode = %self.mode, skip_cache = options.skip_cache))]
    pub async fn resolve(&self, query: &str, options: &ResolveOptions) -> ResolutionResult {
        let normalized = normalize_query(query);
        let result = if normalized.is_empty() {
            ResolutionError::invalid_input("Search query cannot be empty").into()
        } else {
            match self.mode {
                ResolutionMode::Mock => mock::resolve(&normalized),
                ResolutionMode::Live => self.resolve_live(&normalized, options).await,
            }
        };

        metrics::counter!(telemetry::RESOLUTIONS_TOTAL,
            "mode" => self.mode.as_str(),
            "outcome" => result.outcome(),
        )
        .increment(1);
        debug!(query = %normalized, outcome = result.outcome(), "resolution finished");
        result
    }

    async fn resolve_live(&self, normalized: &str, options: &ResolveOptions) -> ResolutionResult {
        if !options.skip_cache {
            if let Some(entry) = self.name_to_symbol.get(normalized) {
                return Self::from_cache_entry(normalized, entry);
            }
        }

        match self.switcher.search(normalized).await {
            Ok(found) => self.accept_match(normalized, found),
            Err(failure) => {
                if failure.error.code == ErrorCode::NotFound {
                    let source = failure.provider.as_deref().unwrap_or(UNKNOWN_SOURCE);
                    self.name_to_symbol
                        .set(normalized, CacheValue::negative(source), true);
                    self.persist_quietly(&self.name_to_symbol);
                }
                failure.error.into()
            }
        }
    }

    fn from_cache_entry(normalized: &str, entry: CacheEntry) -> ResolutionResult {
        if entry.is_negative {
            return ResolutionError::not_found(format!(
                "No results found for \"{normalized}\" (cached)"
            ))
            .with_suggestions(matching::suggestions(normalized))
            .into();
        }
        ResolutionResult::Success(ResolvedTicker {
            symbol: entry.symbol,
            name: entry.name,
            sector: entry.sector,
            confidence: entry.confidence,
            source: entry.source,
            from_cache: true,
        })
    }

    fn accept_match(&self, normalized: &str, found: ProviderMatch) -> ResolutionResult {
        let ProviderMatch { result, provider } = found;

        if result.confidence < self.confidence_threshold {
            debug!(
                symbol = %result.symbol,
                confidence = result.confidence,
                threshold = self.confidence_threshold,
                "match below threshold, asking for confirmation"
            );
            let message = format!(
                "Low confidence match. Did you mean {} ({})?",
                result.symbol, result.name
            );
            return ResolutionResult::Candidates {
                candidates: vec![Candidate {
                    symbol: result.symbol,
                    name: result.name,
                    sector: result.sector,
                    confidence: result.confidence,
                }],
                message,
            };
        }

        self.name_to_symbol.set(
            normalized,
            CacheValue {
                symbol: result.symbol.clone(),
                name: result.name.clone(),
                sector: result.sector.clone(),
                confidence: result.confidence,
                source: provider.clone(),
            },
            false,
        );
        self.symbol_to_name.set(
            &result.symbol,
            CacheValue {
                symbol: result.symbol.clone(),
                name: result.name.clone(),
                sector: result.sector.clone(),
                confidence: 1.0,
                source: provider.clone(),
            },
            false,
        );
        self.persist_quietly(&self.name_to_symbol);
        self.persist_quietly(&self.symbol_to_name);

        ResolutionResult::Success(ResolvedTicker {
            symbol: result.symbol,
            name: result.name,
            sector: result.sector,
            confidence: result.confidence,
            source: provider,
            from_cache: false,
        })
    }

    /// Reverse lookup: display data for a symbol resolved earlier.
    pub fn lookup_symbol(&self, symbol: &str) -> Option<CacheEntry> {
        self.symbol_to_name.get(symbol).filter(|e| !e.is_negative)
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            mode: self.mode,
            providers: self.switcher.statuses(),
            cache: CacheStatus {
                name_to_symbol: self.name_to_symbol.stats(),
                symbol_to_name: self.symbol_to_name.stats(),
            },
        }
    }

    /// Empty both caches and persist the empty state.
    ///
    /// Rate limiter and in-flight state are left alone.
    pub fn clear_cache(&self) {
        self.name_to_symbol.clear();
        self.symbol_to_name.clear();
        self.persist_quietly(&self.name_to_symbol);
        self.persist_quietly(&self.symbol_to_name);
        info!("resolution caches cleared");
    }
}

impl std::fmt::Debug for TickerResolutionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickerResolutionService")
            .field("mode", &self.mode)
            .field("switcher", &self.switcher)
            .field("name_to_symbol", &self.name_to_symbol)
            .field("symbol_to_name", &self.symbol_to_name)
            .field("confidence_threshold", &self.confidence_threshold)
            .finish_non_exhaustive()
    }
}
