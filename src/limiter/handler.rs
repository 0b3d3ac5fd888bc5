//! Rate limiting and de-duplication for one provider.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use super::bucket::ceil_secs;
use super::{InFlightDeduplicator, RateLimiterConfig, RateLimiterStatus, TokenBucketRateLimiter};
use crate::telemetry;
use crate::{MuninnError, Result};

/// Gatekeeper for a provider's upstream calls.
///
/// Each call is keyed (normally by the normalised query). The admission
/// check runs *inside* the de-duplicated operation, so N concurrent callers
/// for one key consume one token and share one outcome, including a
/// [`MuninnError::RateLimited`] refusal.
pub struct RateLimitedRequestHandler<T> {
    limiter: Arc<TokenBucketRateLimiter>,
    dedup: InFlightDeduplicator<Result<T>>,
}

impl<T> RateLimitedRequestHandler<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(provider: impl Into<String>, config: RateLimiterConfig) -> Self {
        Self::with_limiter(Arc::new(TokenBucketRateLimiter::new(provider, config)))
    }

    /// Share an existing limiter (e.g. between two endpoints of one API).
    pub fn with_limiter(limiter: Arc<TokenBucketRateLimiter>) -> Self {
        Self {
            limiter,
            dedup: InFlightDeduplicator::new(),
        }
    }

    pub fn limiter(&self) -> &TokenBucketRateLimiter {
        &self.limiter
    }

    pub fn status(&self) -> RateLimiterStatus {
        self.limiter.status()
    }

    /// Whether a call for `key` is in flight.
    pub fn has_pending(&self, key: &str) -> bool {
        self.dedup.has_pending(key)
    }

    /// Run `operation` under the limiter, joining any in-flight call for `key`.
    ///
    /// Refusal yields `MuninnError::RateLimited` with the limiter's
    /// retry-after hint; `operation` is then never invoked.
    pub async fn execute<F, Fut>(&self, key: &str, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let limiter = Arc::clone(&self.limiter);
        self.dedup
            .dedupe(key, move || async move {
                if !limiter.consume_token() {
                    let retry_after_secs = ceil_secs(limiter.retry_after());
                    debug!(
                        provider = limiter.provider(),
                        retry_after_secs, "request refused by rate limiter"
                    );
                    metrics::counter!(telemetry::RATE_LIMITED_TOTAL,
                        "provider" => limiter.provider().to_owned(),
                    )
                    .increment(1);
                    return Err(MuninnError::RateLimited {
                        provider: limiter.provider().to_owned(),
                        retry_after_secs,
                    });
                }
                operation().await
            })
            .await
    }
}
