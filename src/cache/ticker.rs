//! Bounded FIFO + TTL cache of ticker resolutions.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::store::BlobStore;
use crate::Result;
use crate::telemetry;
use crate::types::normalize_query;

/// Snapshot format written by [`TickerCache::to_json`].
const SNAPSHOT_VERSION: u32 = 1;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for a [`TickerCache`].
///
/// ```rust
/// # use muninn::cache::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::name_to_symbol()
///     .max_entries(500)
///     .negative_ttl(Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries before FIFO eviction. Default: 1,000.
    pub max_entries: usize,
    /// Lifetime of positive entries.
    pub ttl: Duration,
    /// Lifetime of negative ("not found") entries. Default: 24 hours.
    pub negative_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::name_to_symbol()
    }
}

impl CacheConfig {
    /// Name→symbol defaults: 1,000 entries, 30-day TTL, 24-hour negative TTL.
    pub fn name_to_symbol() -> Self {
        Self {
            max_entries: 1_000,
            ttl: DAY * 30,
            negative_ttl: DAY,
        }
    }

    /// Symbol→name defaults: 1,000 entries, 90-day TTL, 24-hour negative TTL.
    pub fn symbol_to_name() -> Self {
        Self {
            ttl: DAY * 90,
            ..Self::name_to_symbol()
        }
    }

    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn negative_ttl(mut self, ttl: Duration) -> Self {
        self.negative_ttl = ttl;
        self
    }
}

/// The payload written by [`TickerCache::set`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheValue {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub confidence: f64,
    pub source: String,
}

impl CacheValue {
    /// Placeholder stored for a query no provider could resolve.
    pub fn negative(source: impl Into<String>) -> Self {
        Self {
            symbol: String::new(),
            name: String::new(),
            sector: String::new(),
            confidence: 0.0,
            source: source.into(),
        }
    }
}

/// A stored resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Normalised query this entry answers.
    pub key: String,
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub confidence: f64,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// "Nothing found" marker.
    #[serde(default)]
    pub is_negative: bool,
}

impl CacheEntry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Point-in-time counters for a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub max_entries: usize,
    /// Entries past their expiry that have not been read (and purged) yet.
    pub expired_entries: usize,
    pub negative_entries: usize,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// Keys in first-insertion order. Always the same key set as `entries`.
    order: VecDeque<String>,
}

impl CacheState {
    fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_none() {
            return false;
        }
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        true
    }

    fn evict_oldest(&mut self) -> Option<String> {
        let oldest = self.order.pop_front()?;
        self.entries.remove(&oldest);
        Some(oldest)
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.is_expired_at(now));
        let entries = &self.entries;
        self.order.retain(|k| entries.contains_key(k));
        before - self.entries.len()
    }
}

#[derive(Serialize, Deserialize)]
struct CacheSnapshot {
    version: u32,
    entries: HashMap<String, CacheEntry>,
    order: Vec<String>,
}

/// Bounded, TTL'd, FIFO-evicting map from normalised query to [`CacheEntry`].
///
/// Thread-safe; every operation takes a single short-lived lock, so
/// concurrent writers to the same key never produce a mixed entry (last
/// write wins).
pub struct TickerCache {
    name: String,
    storage_key: String,
    config: CacheConfig,
    state: Mutex<CacheState>,
}

impl TickerCache {
    /// Create an empty cache.
    ///
    /// `name` labels metrics and log lines; the snapshot is stored under
    /// `ticker_<name>`.
    pub fn new(name: impl Into<String>, config: CacheConfig) -> Self {
        let name = name.into();
        Self {
            storage_key: format!("ticker_{name}"),
            name,
            config,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// The name→symbol cache with default configuration.
    pub fn name_to_symbol() -> Self {
        Self::new("name_to_symbol", CacheConfig::name_to_symbol())
    }

    /// The symbol→name cache with default configuration.
    pub fn symbol_to_name() -> Self {
        Self::new("symbol_to_name", CacheConfig::symbol_to_name())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key under which [`persist`](Self::persist) stores the snapshot.
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn max_entries(&self) -> usize {
        self.config.max_entries
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!(cache = %self.name, "cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Look up a query.
    ///
    /// Returns `None` on miss. An expired entry is removed and reported as
    /// a miss. Negative entries are returned like any other; check
    /// [`CacheEntry::is_negative`].
    pub fn get(&self, query: &str) -> Option<CacheEntry> {
        self.get_at(query, Utc::now())
    }

    pub(crate) fn get_at(&self, query: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        let key = normalize_query(query);
        let mut state = self.lock();

        let hit = match state.entries.get(&key).map(|e| e.is_expired_at(now)) {
            None => None,
            Some(true) => {
                state.remove(&key);
                debug!(cache = %self.name, key = %key, "expired entry removed on read");
                None
            }
            Some(false) => state.entries.get(&key).cloned(),
        };
        drop(state);

        let counter = if hit.is_some() {
            telemetry::CACHE_HITS_TOTAL
        } else {
            telemetry::CACHE_MISSES_TOTAL
        };
        metrics::counter!(counter, "cache" => self.name.clone()).increment(1);
        hit
    }

    /// Insert or overwrite the entry for `query`.
    ///
    /// Overwriting keeps the key's original eviction position. Inserting a
    /// new key into a full cache first evicts the oldest-inserted key.
    pub fn set(&self, query: &str, value: CacheValue, is_negative: bool) {
        self.set_at(query, value, is_negative, Utc::now());
    }

    pub(crate) fn set_at(
        &self,
        query: &str,
        value: CacheValue,
        is_negative: bool,
        now: DateTime<Utc>,
    ) {
        let key = normalize_query(query);
        let ttl = if is_negative {
            self.config.negative_ttl
        } else {
            self.config.ttl
        };
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let entry = CacheEntry {
            key: key.clone(),
            symbol: value.symbol,
            name: value.name,
            sector: value.sector,
            confidence: value.confidence,
            source: value.source,
            created_at: now,
            expires_at,
            is_negative,
        };

        let mut state = self.lock();
        if let Some(existing) = state.entries.get_mut(&key) {
            *existing = entry;
            return;
        }

        if self.config.max_entries == 0 {
            return;
        }
        while state.entries.len() >= self.config.max_entries {
            match state.evict_oldest() {
                Some(evicted) => {
                    debug!(cache = %self.name, key = %evicted, "evicted oldest entry");
                }
                None => break,
            }
        }
        state.order.push_back(key.clone());
        state.entries.insert(key, entry);
    }

    /// Remove a key. Returns whether anything was removed.
    pub fn delete(&self, key: &str) -> bool {
        self.lock().remove(&normalize_query(key))
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.order.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` is present, without expiring it or touching metrics.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains_key(&normalize_query(key))
    }

    /// Snapshot of all entries, oldest-inserted first.
    pub fn entries(&self) -> Vec<CacheEntry> {
        let state = self.lock();
        state
            .order
            .iter()
            .filter_map(|k| state.entries.get(k).cloned())
            .collect()
    }

    pub fn stats(&self) -> CacheStats {
        let now = Utc::now();
        let state = self.lock();
        CacheStats {
            total_entries: state.entries.len(),
            max_entries: self.config.max_entries,
            expired_entries: state
                .entries
                .values()
                .filter(|e| e.is_expired_at(now))
                .count(),
            negative_entries: state.entries.values().filter(|e| e.is_negative).count(),
        }
    }

    /// Serialise entries and eviction order to a JSON blob.
    pub fn to_json(&self) -> Result<String> {
        let state = self.lock();
        let snapshot = CacheSnapshot {
            version: SNAPSHOT_VERSION,
            entries: state.entries.clone(),
            order: state.order.iter().cloned().collect(),
        };
        drop(state);
        Ok(serde_json::to_string(&snapshot)?)
    }

    /// Rebuild a cache from a [`to_json`](Self::to_json) blob.
    ///
    /// Expired entries are dropped immediately. A blob that fails to parse
    /// (or has an unknown version) is logged and yields an empty cache.
    pub fn from_json(name: impl Into<String>, config: CacheConfig, json: &str) -> Self {
        let cache = Self::new(name, config);
        cache.restore(json);
        cache
    }

    /// Replace the current contents with the snapshot in `json`.
    ///
    /// Returns the number of live entries restored.
    fn restore(&self, json: &str) -> usize {
        let snapshot: CacheSnapshot = match serde_json::from_str(json) {
            Ok(s) => s,
            Err(e) => {
                warn!(cache = %self.name, error = %e, "corrupt cache snapshot, starting empty");
                self.clear();
                return 0;
            }
        };
        if snapshot.version != SNAPSHOT_VERSION {
            warn!(
                cache = %self.name,
                version = snapshot.version,
                expected = SNAPSHOT_VERSION,
                "unsupported cache snapshot version, starting empty"
            );
            self.clear();
            return 0;
        }

        let CacheSnapshot {
            mut entries, order, ..
        } = snapshot;

        // Re-key on the normalised key so a hand-edited snapshot cannot
        // smuggle in keys that `get` could never reach.
        entries = entries
            .into_values()
            .map(|mut e| {
                e.key = normalize_query(&e.key);
                (e.key.clone(), e)
            })
            .collect();

        let mut seen = HashSet::new();
        let mut rebuilt: VecDeque<String> = order
            .into_iter()
            .map(|k| normalize_query(&k))
            .filter(|k| entries.contains_key(k) && seen.insert(k.clone()))
            .collect();

        // Entries missing from the order list go last, oldest first.
        let mut orphans: Vec<&CacheEntry> =
            entries.values().filter(|e| !seen.contains(&e.key)).collect();
        orphans.sort_by_key(|e| e.created_at);
        rebuilt.extend(orphans.into_iter().map(|e| e.key.clone()));

        let mut state = self.lock();
        *state = CacheState {
            entries,
            order: rebuilt,
        };
        let purged = state.purge_expired(Utc::now());
        while state.entries.len() > self.config.max_entries {
            if state.evict_oldest().is_none() {
                break;
            }
        }
        let restored = state.entries.len();
        drop(state);

        debug!(cache = %self.name, restored, purged, "cache snapshot restored");
        restored
    }

    /// Warm-start from `store`. A missing blob leaves the cache empty.
    ///
    /// Returns the number of live entries loaded. Corrupt blobs are
    /// logged and ignored; only a failing store is an error.
    pub fn load(&self, store: &dyn BlobStore) -> Result<usize> {
        match store.read(&self.storage_key)? {
            Some(json) => Ok(self.restore(&json)),
            None => {
                self.clear();
                Ok(0)
            }
        }
    }

    /// Write the current snapshot to `store`.
    pub fn persist(&self, store: &dyn BlobStore) -> Result<()> {
        let json = self.to_json()?;
        store.write(&self.storage_key, &json)
    }
}

impl std::fmt::Debug for TickerCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickerCache")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("len", &self.len())
            .finish()
    }
}
