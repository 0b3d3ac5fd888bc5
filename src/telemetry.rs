//! Telemetry metric name constants.
//!
//! Centralised metric names for muninn operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `muninn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider`: provider name (e.g. "Yahoo")
//! - `status`: provider outcome: "found", "not_found", "rate_limited", "error"
//! - `cache`: cache instance: "name_to_symbol" or "symbol_to_name"
//! - `mode`: resolution mode: "mock" or "live"
//! - `outcome`: resolution result: "success", "candidates", or an error code

/// Total provider searches dispatched by the switcher.
///
/// Labels: `provider`, `status`.
pub const PROVIDER_REQUESTS_TOTAL: &str = "muninn_provider_requests_total";

/// Provider search duration in seconds.
///
/// Labels: `provider`.
pub const PROVIDER_REQUEST_DURATION_SECONDS: &str = "muninn_provider_request_duration_seconds";

/// Total requests refused by a rate limiter or answered with HTTP 429.
///
/// Labels: `provider`.
pub const RATE_LIMITED_TOTAL: &str = "muninn_rate_limited_total";

/// Total resolution cache hits (negative entries included).
///
/// Labels: `cache`.
pub const CACHE_HITS_TOTAL: &str = "muninn_cache_hits_total";

/// Total resolution cache misses (expired entries included).
///
/// Labels: `cache`.
pub const CACHE_MISSES_TOTAL: &str = "muninn_cache_misses_total";

/// Total `resolve` calls.
///
/// Labels: `mode`, `outcome`.
pub const RESOLUTIONS_TOTAL: &str = "muninn_resolutions_total";

/// Total callers that joined an already in-flight lookup instead of
/// starting a new one.
pub const DEDUP_JOINS_TOTAL: &str = "muninn_dedup_joins_total";
