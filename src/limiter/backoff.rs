//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

use super::RateLimiterConfig;

/// Upper bound (exclusive) of the random jitter added to each delay.
const JITTER_MS: u64 = 500;

/// Stateful retry-delay calculator.
///
/// Delay for retry `n` (0-indexed) is `base * 2^n` plus up to 500ms of
/// jitter, capped at `max`. After `max_retries` delays have been handed out
/// [`next_delay`](Self::next_delay) returns `None`; call
/// [`reset`](Self::reset) before reusing the instance for a new operation.
///
/// Delays are advisory: nothing here sleeps.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    max: Duration,
    max_retries: u32,
    retry_count: u32,
    jitter: bool,
}

impl ExponentialBackoff {
    /// Backoff using the retry policy of a limiter config. Jitter enabled.
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self::with_params(config.base_backoff, config.max_backoff, config.max_retries)
    }

    pub fn with_params(base: Duration, max: Duration, max_retries: u32) -> Self {
        Self {
            base,
            max,
            max_retries,
            retry_count: 0,
            jitter: true,
        }
    }

    /// Enable or disable jitter.
    pub fn jitter(mut self, enabled: bool) -> Self {
        self.jitter = enabled;
        self
    }

    /// Deterministic variant, for tests and scheduled jobs.
    pub fn without_jitter(self) -> Self {
        self.jitter(false)
    }

    /// Delay for retry `attempt` without jitter: `base * 2^attempt`, capped at `max`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max)
    }

    /// Hand out the next delay and advance the counter.
    ///
    /// `None` once the retry budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if !self.can_retry() {
            return None;
        }

        let mut delay = self
            .base
            .saturating_mul(2u32.saturating_pow(self.retry_count));
        if self.jitter {
            let jitter = rand::thread_rng().gen_range(0..JITTER_MS);
            delay = delay.saturating_add(Duration::from_millis(jitter));
        }

        self.retry_count += 1;
        Some(delay.min(self.max))
    }

    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn reset(&mut self) {
        self.retry_count = 0;
    }
}
