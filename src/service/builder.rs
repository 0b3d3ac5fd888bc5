//! Builder for configuring resolution service instances

use std::path::PathBuf;
use std::sync::Arc;

use super::{DEFAULT_CONFIDENCE_THRESHOLD, TickerResolutionService};
use crate::cache::{BlobStore, CacheConfig, FileStore, MemoryStore, TickerCache};
use crate::config::Config;
#[cfg(feature = "yahoo")]
use crate::limiter::RateLimiterConfig;
use crate::providers::{ProviderSwitcher, TickerProvider};
use crate::types::ResolutionMode;
use crate::{MuninnError, Result};

/// Main entry point for creating resolution services.
pub struct Muninn;

impl Muninn {
    /// Create a new builder for configuring the service.
    pub fn builder() -> MuninnBuilder {
        MuninnBuilder::new()
    }
}

#[cfg(feature = "yahoo")]
#[derive(Debug, Clone, Default)]
struct YahooSettings {
    base_url: Option<String>,
    rate_limit: Option<RateLimiterConfig>,
}

/// Builder for configuring resolution services.
///
/// The built-in Yahoo provider, when enabled, is always the primary;
/// providers added with [`provider`](Self::provider) follow in the order
/// they were added.
pub struct MuninnBuilder {
    mode: ResolutionMode,
    providers: Vec<Arc<dyn TickerProvider>>,
    #[cfg(feature = "yahoo")]
    yahoo: Option<YahooSettings>,
    store: Option<Arc<dyn BlobStore>>,
    name_cache: CacheConfig,
    symbol_cache: CacheConfig,
    confidence_threshold: f64,
    not_found_fallthrough: bool,
}

impl MuninnBuilder {
    pub fn new() -> Self {
        Self {
            mode: ResolutionMode::default(),
            providers: Vec::new(),
            #[cfg(feature = "yahoo")]
            yahoo: None,
            store: None,
            name_cache: CacheConfig::name_to_symbol(),
            symbol_cache: CacheConfig::symbol_to_name(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            not_found_fallthrough: false,
        }
    }

    /// Apply a loaded [`Config`].
    ///
    /// Sets mode, cache limits, resolution policy and the Yahoo provider.
    /// A configured `cache.dir` selects a [`FileStore`] there; otherwise
    /// the store is left as is.
    pub fn from_config(mut self, config: &Config) -> Self {
        self.mode = config.mode;
        self.name_cache = config.cache.name_to_symbol();
        self.symbol_cache = config.cache.symbol_to_name();
        self.confidence_threshold = config.resolution.confidence_threshold;
        self.not_found_fallthrough = config.resolution.not_found_fallthrough;

        if let Some(dir) = &config.cache.dir {
            self = self.file_store(dir.clone());
        }

        #[cfg(feature = "yahoo")]
        {
            let yahoo = &config.providers.yahoo;
            self.yahoo = yahoo.enabled.then(|| YahooSettings {
                base_url: yahoo.base_url.clone(),
                rate_limit: Some(yahoo.rate_limit()),
            });
        }

        self
    }

    /// Select mock or live resolution (default: live).
    pub fn mode(mut self, mode: ResolutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Add a provider after the ones already configured.
    pub fn provider(mut self, provider: Arc<dyn TickerProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Enable the Yahoo Finance provider as primary.
    #[cfg(feature = "yahoo")]
    pub fn yahoo(mut self) -> Self {
        self.yahoo.get_or_insert_with(YahooSettings::default);
        self
    }

    /// Enable Yahoo against a custom base URL (for testing with wiremock).
    #[cfg(feature = "yahoo")]
    pub fn yahoo_with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.yahoo.get_or_insert_with(YahooSettings::default).base_url = Some(base_url.into());
        self
    }

    /// Override Yahoo's rate limits. Enables Yahoo.
    #[cfg(feature = "yahoo")]
    pub fn yahoo_rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.yahoo.get_or_insert_with(YahooSettings::default).rate_limit = Some(config);
        self
    }

    /// Persist cache snapshots to `store` (default: in-memory only).
    pub fn store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Persist cache snapshots as JSON files in `dir`.
    pub fn file_store(self, dir: impl Into<PathBuf>) -> Self {
        self.store(Arc::new(FileStore::new(dir)))
    }

    pub fn name_cache(mut self, config: CacheConfig) -> Self {
        self.name_cache = config;
        self
    }

    pub fn symbol_cache(mut self, config: CacheConfig) -> Self {
        self.symbol_cache = config;
        self
    }

    /// Minimum confidence for an automatic match (default: 0.85, inclusive).
    pub fn confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Let a not-found fall through to the next provider (default: off).
    pub fn not_found_fallthrough(mut self, enabled: bool) -> Self {
        self.not_found_fallthrough = enabled;
        self
    }

    /// Build the service.
    ///
    /// Fails on a threshold outside `0.0..=1.0`, or in live mode without
    /// any provider.
    pub fn build(self) -> Result<TickerResolutionService> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(MuninnError::Configuration(format!(
                "confidence threshold must be within 0.0..=1.0, got {}",
                self.confidence_threshold
            )));
        }

        let mut switcher = ProviderSwitcher::new().not_found_fallthrough(self.not_found_fallthrough);

        #[cfg(feature = "yahoo")]
        if let Some(settings) = self.yahoo {
            use crate::providers::YahooProvider;

            let mut yahoo = match settings.base_url {
                Some(url) => YahooProvider::with_base_url(url),
                None => YahooProvider::new(),
            };
            if let Some(limits) = settings.rate_limit {
                yahoo = yahoo.rate_limit(limits);
            }
            switcher.register(Arc::new(yahoo));
        }

        for provider in self.providers {
            switcher.register(provider);
        }

        if self.mode == ResolutionMode::Live && switcher.is_empty() {
            return Err(MuninnError::Configuration(
                "live mode requires at least one provider".to_string(),
            ));
        }

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn BlobStore>);

        Ok(TickerResolutionService::from_parts(
            self.mode,
            switcher,
            TickerCache::new("name_to_symbol", self.name_cache),
            TickerCache::new("symbol_to_name", self.symbol_cache),
            store,
            self.confidence_threshold,
        ))
    }
}

impl Default for MuninnBuilder {
    fn default() -> Self {
        Self::new()
    }
}
