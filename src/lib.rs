//! Muninn - ticker symbol resolution
//!
//! This crate turns free-text user input (company names, aliases, typos or
//! symbols) into canonical trading symbols. Lookups go through a bounded
//! FIFO cache with TTLs and negative entries, then through a chain of
//! rate-limited, de-duplicated providers. Every call ends in a typed
//! [`ResolutionResult`]: a confirmed ticker, candidates that need
//! confirmation, or an error from a closed taxonomy.
//!
//! # Example
//!
//! ```rust,no_run
//! use muninn::{Muninn, ResolveOptions, ResolutionResult};
//!
//! #[tokio::main]
//! async fn main() -> muninn::Result<()> {
//!     let service = Muninn::builder()
//!         .yahoo()
//!         .file_store("/tmp/muninn")
//!         .build()?;
//!     service.initialize()?;
//!
//!     if let ResolutionResult::Success(ticker) =
//!         service.resolve("novo nordisk", &ResolveOptions::default()).await
//!     {
//!         println!("{} -> {} ({})", ticker.name, ticker.symbol, ticker.source);
//!     }
//!
//!     service.persist()?;
//!     Ok(())
//! }
//! ```
//!
//! # Mock mode
//!
//! ```rust
//! use muninn::{Muninn, ResolutionMode, ResolveOptions};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> muninn::Result<()> {
//! let service = Muninn::builder().mode(ResolutionMode::Mock).build()?;
//! let result = service.resolve("google", &ResolveOptions::default()).await;
//! assert_eq!(result.as_success().unwrap().symbol, "ACME");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod limiter;
pub mod matching;
pub mod providers;
pub mod service;
pub mod telemetry;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use config::Config;
pub use error::{MuninnError, Result};
pub use service::{CacheStatus, Muninn, MuninnBuilder, ServiceStatus, TickerResolutionService};
pub use version::{PKG_VERSION, version_string};

#[cfg(feature = "yahoo")]
pub use providers::YahooProvider;
pub use providers::{ProviderSwitcher, TickerProvider};

pub use types::{
    Candidate, ErrorCode, ProviderResult, ProviderStatus, ResolutionError, ResolutionMode,
    ResolutionResult, ResolveOptions, ResolvedTicker,
};
