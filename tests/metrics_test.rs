//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use muninn::limiter::{InFlightDeduplicator, RateLimitedRequestHandler, RateLimiterConfig};
use muninn::providers::TickerProvider;
use muninn::telemetry;
use muninn::{
    Muninn, MuninnError, ProviderResult, ProviderStatus, ResolutionMode, ResolveOptions, Result,
};

// ============================================================================
// Mock providers
// ============================================================================

struct AppleProvider;

#[async_trait]
impl TickerProvider for AppleProvider {
    fn name(&self) -> &str {
        "apple-only"
    }

    async fn search(&self, _query: &str) -> Result<Option<ProviderResult>> {
        Ok(Some(ProviderResult::new("AAPL", "Apple Inc.", "Technology", 1.0)))
    }

    fn is_available(&self) -> bool {
        true
    }

    fn remaining_quota(&self) -> u32 {
        1
    }

    fn status(&self) -> ProviderStatus {
        ProviderStatus::new("apple-only", true, 1)
    }
}

struct FailingProvider;

#[async_trait]
impl TickerProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn search(&self, _query: &str) -> Result<Option<ProviderResult>> {
        Err(MuninnError::Http("connection reset".into()))
    }

    fn is_available(&self) -> bool {
        true
    }

    fn remaining_quota(&self) -> u32 {
        0
    }

    fn status(&self) -> ProviderStatus {
        ProviderStatus::new("failing", true, 0)
    }
}

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Sum counter values for `name` whose labels include `label=value`.
fn counter_with_label(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label && l.value() == value)
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Check if any histogram entries exist for a given metric name.
fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn live_resolution_records_provider_cache_and_outcome_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let service = Muninn::builder()
                    .provider(Arc::new(AppleProvider))
                    .build()
                    .unwrap();
                let first = service.resolve("apple", &ResolveOptions::default()).await;
                let second = service.resolve("apple", &ResolveOptions::default()).await;
                assert!(first.is_success());
                assert!(second.is_success());
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(counter_total(&snapshot, telemetry::PROVIDER_REQUESTS_TOTAL), 1);
    assert_eq!(
        counter_with_label(
            &snapshot,
            telemetry::PROVIDER_REQUESTS_TOTAL,
            "status",
            "found"
        ),
        1
    );
    assert!(has_histogram(
        &snapshot,
        telemetry::PROVIDER_REQUEST_DURATION_SECONDS
    ));

    assert_eq!(
        counter_with_label(
            &snapshot,
            telemetry::CACHE_MISSES_TOTAL,
            "cache",
            "name_to_symbol"
        ),
        1
    );
    assert_eq!(
        counter_with_label(
            &snapshot,
            telemetry::CACHE_HITS_TOTAL,
            "cache",
            "name_to_symbol"
        ),
        1
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::RESOLUTIONS_TOTAL, "outcome", "success"),
        2
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn failed_provider_records_error_status() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let service = Muninn::builder()
                    .provider(Arc::new(FailingProvider))
                    .build()
                    .unwrap();
                service.resolve("apple", &ResolveOptions::default()).await
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_with_label(
            &snapshot,
            telemetry::PROVIDER_REQUESTS_TOTAL,
            "status",
            "error"
        ),
        1
    );
    assert_eq!(
        counter_with_label(
            &snapshot,
            telemetry::RESOLUTIONS_TOTAL,
            "outcome",
            "PROVIDER_DOWN"
        ),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn mock_resolution_records_mode_label() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let service = Muninn::builder()
                    .mode(ResolutionMode::Mock)
                    .build()
                    .unwrap();
                service.resolve("GOOGLE", &ResolveOptions::default()).await
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_with_label(&snapshot, telemetry::RESOLUTIONS_TOTAL, "mode", "mock"),
        1
    );
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 0);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn limiter_refusal_records_rate_limited() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let handler: RateLimitedRequestHandler<u32> = RateLimitedRequestHandler::new(
                    "Test",
                    RateLimiterConfig::default()
                        .max_requests_per_second(1)
                        .max_requests_per_day(10),
                );
                handler.execute("A", || async { Ok(1) }).await.unwrap();
                assert!(handler.execute("B", || async { Ok(2) }).await.is_err());
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_with_label(&snapshot, telemetry::RATE_LIMITED_TOTAL, "provider", "Test"),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn joined_request_records_dedup_join() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let dedup: InFlightDeduplicator<u32> = InFlightDeduplicator::new();
                let slow = || async {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    5
                };
                let (a, b) = tokio::join!(dedup.dedupe("K", slow), dedup.dedupe("K", slow));
                assert_eq!((a, b), (5, 5));
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::DEDUP_JOINS_TOTAL), 1);
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let service = Muninn::builder()
        .provider(Arc::new(AppleProvider))
        .build()
        .unwrap();
    assert!(
        service
            .resolve("apple", &ResolveOptions::default())
            .await
            .is_success()
    );
}
