//! The ticker provider capability trait.
//!
//! A provider turns a normalised query into at most one match. Providers
//! self-report availability so the [`ProviderSwitcher`](super::ProviderSwitcher)
//! can skip them without spending a request.
//!
//! # Outcome contract
//!
//! - `Ok(Some(result))`: a match; the switcher stops here.
//! - `Ok(None)`: an explicit not-found. Transport failures other than rate
//!   limiting are also reported this way, after the provider has put itself
//!   into cooldown and logged the cause.
//! - `Err(MuninnError::RateLimited { .. })`: request budget exhausted,
//!   locally or upstream. Always re-raised, never swallowed.
//! - any other `Err`: the switcher logs it and moves to the next provider.

use async_trait::async_trait;

use crate::Result;
use crate::types::{ProviderResult, ProviderStatus};

/// A source of ticker symbol matches.
#[async_trait]
pub trait TickerProvider: Send + Sync {
    /// Provider name for logging, metrics and the `source` of results.
    fn name(&self) -> &str;

    /// Look up the best match for `query`.
    async fn search(&self, query: &str) -> Result<Option<ProviderResult>>;

    /// Whether a search right now would reach the upstream API.
    ///
    /// False while cooling down after a failure or while the rate limiter
    /// would refuse the request.
    fn is_available(&self) -> bool;

    /// Requests left in the current daily window.
    fn remaining_quota(&self) -> u32;

    fn status(&self) -> ProviderStatus;
}
