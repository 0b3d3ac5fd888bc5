//! In-flight request de-duplication.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

use crate::telemetry;
use crate::types::normalize_query;

/// Registration id plus the shared outcome.
type Pending<T> = HashMap<String, (u64, Shared<BoxFuture<'static, T>>)>;

fn lock<T>(pending: &Mutex<Pending<T>>) -> MutexGuard<'_, Pending<T>> {
    pending.lock().unwrap_or_else(|poisoned| {
        warn!("deduplicator mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

/// Collapses concurrent operations with the same key into one.
///
/// While an operation for a key is pending, later callers for that key
/// await the same outcome instead of starting their own. The registration
/// is dropped as soon as the operation finishes, success or failure, so the
/// next call after completion starts fresh. Outcomes are never cached here.
///
/// Keys are normalised (trimmed, uppercased) before lookup.
pub struct InFlightDeduplicator<T> {
    pending: Arc<Mutex<Pending<T>>>,
    next_id: AtomicU64,
}

impl<T> InFlightDeduplicator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Run `operation` unless one is already pending for `key`, and return
    /// its outcome.
    ///
    /// `operation` is only invoked when no call for `key` is in flight. It
    /// must not call back into this deduplicator synchronously.
    pub async fn dedupe<F, Fut>(&self, key: &str, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let key = normalize_query(key);

        let shared = {
            let mut pending = lock(&self.pending);
            match pending.get(&key) {
                Some((_, existing)) => {
                    debug!(key = %key, "joining in-flight request");
                    metrics::counter!(telemetry::DEDUP_JOINS_TOTAL).increment(1);
                    existing.clone()
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let registry = Arc::clone(&self.pending);
                    let cleanup_key = key.clone();
                    let fut = operation();
                    let shared = async move {
                        let outcome = fut.await;
                        // Only drop our own registration; `clear` may have
                        // let a newer call take the key.
                        let mut pending = lock(&registry);
                        if pending.get(&cleanup_key).is_some_and(|(owner, _)| *owner == id) {
                            pending.remove(&cleanup_key);
                        }
                        drop(pending);
                        outcome
                    }
                    .boxed()
                    .shared();
                    pending.insert(key, (id, shared.clone()));
                    shared
                }
            }
        };

        shared.await
    }

    /// Whether an operation for `key` is in flight.
    pub fn has_pending(&self, key: &str) -> bool {
        lock(&self.pending).contains_key(&normalize_query(key))
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Forget all registrations. Callers already awaiting keep their
    /// outcome; new callers start fresh operations.
    pub fn clear(&self) {
        lock(&self.pending).clear();
    }
}

impl<T> Default for InFlightDeduplicator<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
