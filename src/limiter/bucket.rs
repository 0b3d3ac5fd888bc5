//! Token bucket with a daily request cap.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Limits and retry policy for one provider.
///
/// ```rust
/// # use muninn::limiter::RateLimiterConfig;
/// # use std::time::Duration;
/// let config = RateLimiterConfig::yahoo()
///     .max_requests_per_day(100)
///     .base_backoff(Duration::from_millis(250));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Burst size and refill rate (tokens per second).
    pub max_requests_per_second: u32,
    /// Requests allowed between two local midnights.
    pub max_requests_per_day: u32,
    /// Retry budget for [`ExponentialBackoff`](super::ExponentialBackoff).
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::yahoo()
    }
}

impl RateLimiterConfig {
    /// Yahoo Finance search: 5/s, 500/day, 5 retries, 1s..60s backoff.
    pub fn yahoo() -> Self {
        Self {
            max_requests_per_second: 5,
            max_requests_per_day: 500,
            max_retries: 5,
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }

    /// Financial Modeling Prep free tier: 2/s, 250/day, 3 retries, 1s..30s backoff.
    pub fn fmp() -> Self {
        Self {
            max_requests_per_second: 2,
            max_requests_per_day: 250,
            max_retries: 3,
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }

    pub fn max_requests_per_second(mut self, n: u32) -> Self {
        self.max_requests_per_second = n;
        self
    }

    pub fn max_requests_per_day(mut self, n: u32) -> Self {
        self.max_requests_per_day = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn base_backoff(mut self, delay: Duration) -> Self {
        self.base_backoff = delay;
        self
    }

    pub fn max_backoff(mut self, delay: Duration) -> Self {
        self.max_backoff = delay;
        self
    }
}

/// Diagnostic snapshot of a limiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimiterStatus {
    pub provider: String,
    /// Whole tokens currently in the bucket.
    pub tokens_available: u32,
    pub daily_remaining: u32,
    pub daily_limit: u32,
    /// ISO-8601 timestamp of the next daily reset.
    pub reset_at: String,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
    daily_usage: u32,
    daily_reset_at: DateTime<Local>,
}

impl BucketState {
    fn refill(&mut self, rate: f64, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(rate);
        self.last_refill = now;
    }

    fn roll_daily(&mut self, now: DateTime<Local>) -> bool {
        if now < self.daily_reset_at {
            return false;
        }
        self.daily_usage = 0;
        self.daily_reset_at = next_local_midnight(now);
        true
    }
}

/// First local midnight strictly after `now`.
fn next_local_midnight(now: DateTime<Local>) -> DateTime<Local> {
    now.date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .unwrap_or_else(|| now + TimeDelta::days(1))
}

/// Continuous-refill token bucket with an independent daily counter.
///
/// The bucket holds at most `max_requests_per_second` tokens and refills at
/// that many tokens per second. The daily counter resets at local midnight.
/// A request is admitted only when both a whole token and daily quota are
/// available; [`consume_token`](Self::consume_token) checks and consumes
/// under one lock, so concurrent callers can never overrun either limit.
pub struct TokenBucketRateLimiter {
    provider: String,
    config: RateLimiterConfig,
    state: Mutex<BucketState>,
}

impl TokenBucketRateLimiter {
    /// Create a limiter with a full bucket and an unused daily quota.
    pub fn new(provider: impl Into<String>, config: RateLimiterConfig) -> Self {
        let state = BucketState {
            tokens: f64::from(config.max_requests_per_second),
            last_refill: Instant::now(),
            daily_usage: 0,
            daily_reset_at: next_local_midnight(Local::now()),
        };
        Self {
            provider: provider.into(),
            config,
            state: Mutex::new(state),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    fn rate(&self) -> f64 {
        f64::from(self.config.max_requests_per_second)
    }

    /// Lock the state, refilled and rolled forward to now.
    fn lock(&self) -> MutexGuard<'_, BucketState> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| {
            warn!(provider = %self.provider, "rate limiter mutex was poisoned, recovering");
            poisoned.into_inner()
        });
        state.refill(self.rate(), Instant::now());
        if state.roll_daily(Local::now()) {
            debug!(provider = %self.provider, "daily quota reset");
        }
        state
    }

    fn admits(&self, state: &BucketState) -> bool {
        state.tokens >= 1.0 && state.daily_usage < self.config.max_requests_per_day
    }

    /// Whether a request would be admitted right now. Consumes nothing.
    pub fn can_make_request(&self) -> bool {
        let state = self.lock();
        self.admits(&state)
    }

    /// Admit one request: take a token and count it against the daily cap.
    ///
    /// Returns `false` (and consumes nothing) when either limit is reached.
    pub fn consume_token(&self) -> bool {
        let mut state = self.lock();
        if !self.admits(&state) {
            return false;
        }
        state.tokens -= 1.0;
        state.daily_usage += 1;
        true
    }

    /// Requests left before the daily cap.
    pub fn remaining_quota(&self) -> u32 {
        let state = self.lock();
        self.config.max_requests_per_day.saturating_sub(state.daily_usage)
    }

    /// Exact wait until the bucket holds a whole token.
    ///
    /// Zero when a token is available. Ignores the daily cap; see
    /// [`retry_after`](Self::retry_after).
    pub fn time_until_next_token(&self) -> Duration {
        let state = self.lock();
        self.token_wait(&state)
    }

    fn token_wait(&self, state: &BucketState) -> Duration {
        if state.tokens >= 1.0 {
            return Duration::ZERO;
        }
        let rate = self.rate();
        if rate <= 0.0 {
            return Duration::MAX;
        }
        Duration::try_from_secs_f64((1.0 - state.tokens) / rate).unwrap_or(Duration::MAX)
    }

    /// [`time_until_next_token`](Self::time_until_next_token) rounded up to whole seconds.
    pub fn seconds_until_next_token(&self) -> u64 {
        ceil_secs(self.time_until_next_token())
    }

    /// How long a refused caller should wait before trying again.
    ///
    /// The token wait, or the time until the daily reset when the daily
    /// quota is what is exhausted.
    pub fn retry_after(&self) -> Duration {
        let state = self.lock();
        if state.daily_usage >= self.config.max_requests_per_day {
            return (state.daily_reset_at - Local::now())
                .to_std()
                .unwrap_or(Duration::ZERO);
        }
        self.token_wait(&state)
    }

    /// Next daily quota reset.
    pub fn reset_at(&self) -> DateTime<Local> {
        self.lock().daily_reset_at
    }

    pub fn status(&self) -> RateLimiterStatus {
        let state = self.lock();
        RateLimiterStatus {
            provider: self.provider.clone(),
            tokens_available: state.tokens.floor() as u32,
            daily_remaining: self
                .config
                .max_requests_per_day
                .saturating_sub(state.daily_usage),
            daily_limit: self.config.max_requests_per_day,
            reset_at: state.daily_reset_at.to_rfc3339(),
        }
    }
}

impl std::fmt::Debug for TokenBucketRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBucketRateLimiter")
            .field("provider", &self.provider)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Whole seconds, rounded up.
pub(crate) fn ceil_secs(d: Duration) -> u64 {
    if d.subsec_nanos() > 0 {
        d.as_secs().saturating_add(1)
    } else {
        d.as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(per_second: u32, per_day: u32) -> TokenBucketRateLimiter {
        TokenBucketRateLimiter::new(
            "Test",
            RateLimiterConfig::default()
                .max_requests_per_second(per_second)
                .max_requests_per_day(per_day),
        )
    }

    #[test]
    fn next_midnight_is_start_of_tomorrow() {
        let now = Local::now();
        let midnight = next_local_midnight(now);
        assert!(midnight > now);
        assert!(midnight - now <= TimeDelta::hours(25));
        assert_eq!(midnight.date_naive(), now.date_naive().succ_opt().unwrap());
    }

    #[test]
    fn daily_usage_resets_once_after_rollover() {
        let limiter = limiter(100, 2);
        assert!(limiter.consume_token());
        assert!(limiter.consume_token());
        assert!(!limiter.consume_token());

        {
            let mut state = limiter.state.lock().unwrap();
            state.daily_reset_at = Local::now() - TimeDelta::seconds(1);
        }

        assert_eq!(limiter.remaining_quota(), 2);
        assert!(limiter.consume_token());
        // Second call in the same window must not reset again.
        assert_eq!(limiter.remaining_quota(), 1);
        assert!(limiter.reset_at() > Local::now());
    }

    #[test]
    fn retry_after_uses_daily_reset_when_quota_exhausted() {
        let limiter = limiter(100, 1);
        assert!(limiter.consume_token());
        let wait = limiter.retry_after();
        assert!(wait > Duration::from_secs(1));
        assert!(wait <= Duration::from_secs(25 * 3600));
    }

    #[test]
    fn ceil_secs_rounds_up() {
        assert_eq!(ceil_secs(Duration::ZERO), 0);
        assert_eq!(ceil_secs(Duration::from_millis(1)), 1);
        assert_eq!(ceil_secs(Duration::from_millis(1000)), 1);
        assert_eq!(ceil_secs(Duration::from_millis(1001)), 2);
    }

    #[test]
    fn zero_rate_never_admits() {
        let limiter = limiter(0, 10);
        assert!(!limiter.can_make_request());
        assert_eq!(limiter.time_until_next_token(), Duration::MAX);
    }
}
