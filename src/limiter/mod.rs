//! Request admission for upstream providers.
//!
//! - [`TokenBucketRateLimiter`]: per-provider burst limit plus a daily cap.
//! - [`ExponentialBackoff`]: advisory retry delays with jitter.
//! - [`InFlightDeduplicator`]: collapses concurrent identical lookups into
//!   one upstream call.
//! - [`RateLimitedRequestHandler`]: limiter and deduplicator combined, so concurrent
//!   callers for the same key share one admission decision and one call.

mod backoff;
mod bucket;
mod dedup;
mod handler;

pub use backoff::ExponentialBackoff;
pub use bucket::{RateLimiterConfig, RateLimiterStatus, TokenBucketRateLimiter};
pub use dedup::InFlightDeduplicator;
pub use handler::RateLimitedRequestHandler;
