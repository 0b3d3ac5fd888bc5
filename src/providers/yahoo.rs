//! Yahoo Finance symbol search provider.
//!
//! Uses the public search endpoint:
//! `GET {base}/v1/finance/search?q=..&quotesCount=5&newsCount=0&enableFuzzyQuery=true`.
//! No API key is required.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::traits::TickerProvider;
use crate::limiter::{RateLimitedRequestHandler, RateLimiterConfig};
use crate::telemetry;
use crate::types::{ProviderResult, ProviderStatus, normalize_query};
use crate::{MuninnError, Result};

/// Default base URL for the Yahoo Finance query API.
const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Name reported by this provider.
pub const PROVIDER_NAME: &str = "Yahoo";

/// How long the provider stays down after a non-rate-limit failure.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5 * 60);

/// Retry-after assumed for an HTTP 429 without a usable `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const QUOTES_COUNT: &str = "5";

#[derive(Debug, Default)]
struct Health {
    down_until: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Yahoo Finance search provider.
///
/// Every search goes through a [`RateLimitedRequestHandler`] (5 req/s and
/// 500 req/day by default), so concurrent searches for the same query share
/// one HTTP call.
pub struct YahooProvider {
    http: Client,
    base_url: String,
    handler: RateLimitedRequestHandler<Option<ProviderResult>>,
    health: Mutex<Health>,
    cooldown: Duration,
}

impl YahooProvider {
    /// Provider against the public Yahoo endpoint with default limits.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Provider with a custom base URL (for testing with wiremock).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(crate::version::user_agent())
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build configured HTTP client, using defaults");
                Client::new()
            });

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            handler: RateLimitedRequestHandler::new(PROVIDER_NAME, RateLimiterConfig::yahoo()),
            health: Mutex::new(Health::default()),
            cooldown: DEFAULT_COOLDOWN,
        }
    }

    /// Replace the rate limits. Resets the limiter state.
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.handler = RateLimitedRequestHandler::new(PROVIDER_NAME, config);
        self
    }

    /// Replace the outage cooldown window.
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Most recent non-rate-limit failure, cleared by the next success.
    pub fn last_error(&self) -> Option<String> {
        self.health().last_error.clone()
    }

    fn health(&self) -> MutexGuard<'_, Health> {
        self.health.lock().unwrap_or_else(|poisoned| {
            warn!(provider = PROVIDER_NAME, "health mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn is_cooling_down(&self) -> bool {
        let mut health = self.health();
        match health.down_until {
            Some(until) if Utc::now() < until => true,
            Some(_) => {
                health.down_until = None;
                false
            }
            None => false,
        }
    }

    fn mark_healthy(&self) {
        let mut health = self.health();
        health.down_until = None;
        health.last_error = None;
    }

    fn mark_down(&self, err: &MuninnError) {
        let until = TimeDelta::from_std(self.cooldown)
            .ok()
            .and_then(|d| Utc::now().checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut health = self.health();
        health.down_until = Some(until);
        health.last_error = Some(err.to_string());
        drop(health);
        error!(
            provider = PROVIDER_NAME,
            error = %err,
            down_until = %until.to_rfc3339(),
            "provider marked down"
        );
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TickerProvider for YahooProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn search(&self, query: &str) -> Result<Option<ProviderResult>> {
        if !self.is_available() {
            warn!(provider = PROVIDER_NAME, "provider is currently unavailable");
            return Err(MuninnError::Api {
                status: 503,
                message: format!("{PROVIDER_NAME} is temporarily unavailable"),
            });
        }

        let query = normalize_query(query);
        let http = self.http.clone();
        let url = format!("{}/v1/finance/search", self.base_url);
        let q = query.clone();

        match self
            .handler
            .execute(&query, move || fetch_best_quote(http, url, q))
            .await
        {
            Ok(result) => {
                self.mark_healthy();
                Ok(result)
            }
            Err(e @ MuninnError::RateLimited { .. }) => {
                warn!(provider = PROVIDER_NAME, error = %e, "rate limit hit");
                Err(e)
            }
            Err(e) => {
                self.mark_down(&e);
                Ok(None)
            }
        }
    }

    fn is_available(&self) -> bool {
        !self.is_cooling_down() && self.handler.limiter().can_make_request()
    }

    fn remaining_quota(&self) -> u32 {
        self.handler.limiter().remaining_quota()
    }

    fn status(&self) -> ProviderStatus {
        let limiter = self.handler.status();
        let available = self.is_available();
        let health = self.health();
        ProviderStatus {
            name: PROVIDER_NAME.to_owned(),
            available,
            remaining_quota: limiter.daily_remaining,
            reset_at: Some(limiter.reset_at),
            down_until: health.down_until.map(|t| t.to_rfc3339()),
            last_error: health.last_error.clone(),
        }
    }
}

/// One HTTP search, reduced to the first quote.
async fn fetch_best_quote(
    http: Client,
    url: String,
    query: String,
) -> Result<Option<ProviderResult>> {
    let response = http
        .get(&url)
        .header("Accept", "application/json")
        .query(&[
            ("q", query.as_str()),
            ("quotesCount", QUOTES_COUNT),
            ("newsCount", "0"),
            ("enableFuzzyQuery", "true"),
        ])
        .send()
        .await?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        metrics::counter!(telemetry::RATE_LIMITED_TOTAL, "provider" => PROVIDER_NAME)
            .increment(1);
        return Err(MuninnError::RateLimited {
            provider: PROVIDER_NAME.to_owned(),
            retry_after_secs,
        });
    }
    if !status.is_success() {
        return Err(MuninnError::Api {
            status: status.as_u16(),
            message: format!("Yahoo API error: {status}"),
        });
    }

    let body = response.text().await?;
    let parsed: YahooSearchResponse = serde_json::from_str(&body)?;
    debug!(
        provider = PROVIDER_NAME,
        query = %query,
        quotes = parsed.quotes.len(),
        "search response received"
    );

    Ok(parsed
        .quotes
        .into_iter()
        .next()
        .map(|quote| quote.into_result(&query)))
}

/// Match confidence for a quote, first matching rule wins.
///
/// | rule                   | confidence |
/// |------------------------|------------|
/// | symbol equals query    | 1.00       |
/// | symbol contains query  | 0.95       |
/// | name starts with query | 0.90       |
/// | name contains query    | 0.85       |
/// | anything else          | 0.75       |
pub fn score_confidence(query: &str, symbol: &str, name: &str) -> f64 {
    let query = query.to_uppercase();
    let symbol = symbol.to_uppercase();
    let name = name.to_uppercase();

    if symbol == query {
        1.0
    } else if symbol.contains(&query) {
        0.95
    } else if name.starts_with(&query) {
        0.90
    } else if name.contains(&query) {
        0.85
    } else {
        0.75
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct YahooSearchResponse {
    #[serde(default)]
    quotes: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuote {
    symbol: String,
    #[serde(default)]
    shortname: Option<String>,
    #[serde(default)]
    longname: Option<String>,
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    industry: Option<String>,
    #[serde(default)]
    exchange: Option<String>,
    #[serde(default)]
    quote_type: Option<String>,
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

impl YahooQuote {
    fn into_result(self, query: &str) -> ProviderResult {
        let display_name = non_empty(&self.shortname)
            .or_else(|| non_empty(&self.longname))
            .map(str::to_owned);
        let confidence = score_confidence(
            query,
            &self.symbol,
            display_name.as_deref().unwrap_or_default(),
        );
        let sector = non_empty(&self.sector)
            .or_else(|| non_empty(&self.industry))
            .unwrap_or("Unknown")
            .to_owned();
        let raw = serde_json::to_value(&self).ok();

        let mut result = ProviderResult::new(
            self.symbol.clone(),
            display_name.unwrap_or_else(|| self.symbol.clone()),
            sector,
            confidence,
        );
        result.raw = raw;
        result
    }
}
