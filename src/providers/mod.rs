//! Ticker providers and the fallback chain over them.
//!
//! [`TickerProvider`] is the seam; [`YahooProvider`] is the built-in
//! implementation (feature `yahoo`). [`ProviderSwitcher`] walks the
//! registered providers in priority order and turns their outcomes into the
//! user-facing error taxonomy.

mod switcher;
pub mod traits;
#[cfg(feature = "yahoo")]
pub mod yahoo;

pub use switcher::{ProviderFailure, ProviderMatch, ProviderSwitcher};
pub use traits::TickerProvider;
#[cfg(feature = "yahoo")]
pub use yahoo::YahooProvider;
