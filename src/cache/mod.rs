//! Resolution caching subsystem.
//!
//! Two independent [`TickerCache`] instances back the resolution service:
//!
//! - **name→symbol**: keyed on the normalised user query, holds positive
//!   matches (30 days) and negative "nothing found" markers (24 hours).
//! - **symbol→name**: keyed on the resolved symbol, a reverse index for
//!   display lookups (90 days).
//!
//! Both are bounded FIFO caches: at capacity the oldest *inserted* key is
//! evicted, regardless of how recently it was read. Expiry is lazy: an
//! expired entry is removed the next time it is read, or when a snapshot
//! is loaded.
//!
//! Snapshots go through the [`BlobStore`] seam in [`store`], one JSON blob
//! per cache. The cache layer never raises on corrupt input; it logs and
//! starts empty.

pub mod store;
mod ticker;

pub use store::{BlobStore, FileStore, MemoryStore, NAME_TO_SYMBOL_KEY, SYMBOL_TO_NAME_KEY};
pub use ticker::{CacheConfig, CacheEntry, CacheStats, CacheValue, TickerCache};
