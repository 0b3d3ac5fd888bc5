//! Tests for the FIFO/TTL ticker cache and its blob stores.

use std::time::Duration;

use muninn::cache::{
    BlobStore, CacheConfig, CacheValue, FileStore, MemoryStore, NAME_TO_SYMBOL_KEY,
    SYMBOL_TO_NAME_KEY, TickerCache,
};

fn value(symbol: &str, name: &str) -> CacheValue {
    CacheValue {
        symbol: symbol.into(),
        name: name.into(),
        sector: "Technology".into(),
        confidence: 0.95,
        source: "Yahoo".into(),
    }
}

fn small_cache(max_entries: usize) -> TickerCache {
    TickerCache::new(
        "name_to_symbol",
        CacheConfig::name_to_symbol().max_entries(max_entries),
    )
}

// ============================================================================
// Lookup
// ============================================================================

#[test]
fn get_normalises_the_key() {
    let cache = TickerCache::name_to_symbol();
    cache.set("  apple ", value("AAPL", "Apple Inc."), false);

    let entry = cache.get("APPLE").expect("hit");
    assert_eq!(entry.key, "APPLE");
    assert_eq!(entry.symbol, "AAPL");
    assert!(!entry.is_negative);
    assert!(cache.get("apple").is_some());
}

#[test]
fn miss_returns_none() {
    let cache = TickerCache::name_to_symbol();
    assert!(cache.get("NOTHING").is_none());
}

#[test]
fn negative_entries_are_returned_as_hits() {
    let cache = TickerCache::name_to_symbol();
    cache.set("XYZNOTREAL", CacheValue::negative("Yahoo"), true);

    let entry = cache.get("xyznotreal").expect("negative hit");
    assert!(entry.is_negative);
    assert_eq!(entry.source, "Yahoo");
    assert!(entry.symbol.is_empty());
}

#[test]
fn negative_entries_use_negative_ttl() {
    let cache = TickerCache::new(
        "name_to_symbol",
        CacheConfig::name_to_symbol().negative_ttl(Duration::from_secs(3600)),
    );
    cache.set("MISSING", CacheValue::negative("Yahoo"), true);
    cache.set("APPLE", value("AAPL", "Apple Inc."), false);

    let negative = cache.get("MISSING").unwrap();
    let positive = cache.get("APPLE").unwrap();
    assert_eq!(
        (negative.expires_at - negative.created_at).num_seconds(),
        3600
    );
    assert_eq!((positive.expires_at - positive.created_at).num_days(), 30);
}

#[test]
fn zero_ttl_entry_expires_on_read() {
    let cache = TickerCache::new(
        "name_to_symbol",
        CacheConfig::name_to_symbol().ttl(Duration::ZERO),
    );
    cache.set("APPLE", value("AAPL", "Apple Inc."), false);
    std::thread::sleep(Duration::from_millis(5));

    assert!(cache.get("APPLE").is_none());
    assert!(!cache.contains("APPLE"), "expired entry is removed on read");
}

// ============================================================================
// FIFO eviction
// ============================================================================

#[test]
fn full_cache_evicts_oldest_inserted() {
    let cache = small_cache(3);
    cache.set("A", value("A", "A Corp"), false);
    cache.set("B", value("B", "B Corp"), false);
    cache.set("C", value("C", "C Corp"), false);

    // Reads do not refresh position.
    assert!(cache.get("A").is_some());

    cache.set("D", value("D", "D Corp"), false);
    assert_eq!(cache.len(), 3);
    assert!(!cache.contains("A"));
    assert!(cache.contains("B"));
    assert!(cache.contains("D"));
}

#[test]
fn overwrite_keeps_original_position() {
    let cache = small_cache(3);
    cache.set("A", value("A", "A Corp"), false);
    cache.set("B", value("B", "B Corp"), false);
    cache.set("C", value("C", "C Corp"), false);

    cache.set("A", value("A2", "A Corp Renamed"), false);
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.get("A").unwrap().symbol, "A2");

    cache.set("D", value("D", "D Corp"), false);
    assert!(!cache.contains("A"), "overwritten key is still the oldest");
    let keys: Vec<String> = cache.entries().into_iter().map(|e| e.key).collect();
    assert_eq!(keys, vec!["B", "C", "D"]);
}

#[test]
fn delete_and_clear() {
    let cache = small_cache(10);
    cache.set("A", value("A", "A Corp"), false);
    cache.set("B", value("B", "B Corp"), false);

    assert!(cache.delete("a"));
    assert!(!cache.delete("a"));
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn stats_counts_negative_entries() {
    let cache = small_cache(10);
    cache.set("A", value("A", "A Corp"), false);
    cache.set("NOPE", CacheValue::negative("Yahoo"), true);

    let stats = cache.stats();
    assert_eq!(stats.total_entries, 2);
    assert_eq!(stats.max_entries, 10);
    assert_eq!(stats.negative_entries, 1);
    assert_eq!(stats.expired_entries, 0);
}

// ============================================================================
// Snapshots
// ============================================================================

#[test]
fn json_round_trip_preserves_entries_and_order() {
    let cache = small_cache(3);
    cache.set("A", value("A", "A Corp"), false);
    cache.set("B", value("B", "B Corp"), false);
    cache.set("MISSING", CacheValue::negative("Yahoo"), true);

    let json = cache.to_json().unwrap();
    let restored = TickerCache::from_json(
        "name_to_symbol",
        CacheConfig::name_to_symbol().max_entries(3),
        &json,
    );

    assert_eq!(restored.entries(), cache.entries());
    assert!(restored.get("MISSING").unwrap().is_negative);

    // Eviction order survived the round trip.
    restored.set("C", value("C", "C Corp"), false);
    assert!(!restored.contains("A"));
}

#[test]
fn corrupt_snapshot_starts_empty() {
    let cache = TickerCache::from_json("name_to_symbol", CacheConfig::default(), "{not json");
    assert!(cache.is_empty());
}

#[test]
fn unknown_snapshot_version_starts_empty() {
    let json = r#"{"version":99,"entries":{},"order":[]}"#;
    let cache = TickerCache::from_json("name_to_symbol", CacheConfig::default(), json);
    assert!(cache.is_empty());
}

#[test]
fn expired_entries_are_dropped_on_restore() {
    let json = serde_json::json!({
        "version": 1,
        "entries": {
            "OLD": {
                "key": "OLD",
                "symbol": "OLD",
                "name": "Old Corp",
                "sector": "Industrials",
                "confidence": 1.0,
                "source": "Yahoo",
                "created_at": "2020-01-01T00:00:00Z",
                "expires_at": "2020-01-31T00:00:00Z",
                "is_negative": false
            },
            "NEW": {
                "key": "NEW",
                "symbol": "NEW",
                "name": "New Corp",
                "sector": "Industrials",
                "confidence": 1.0,
                "source": "Yahoo",
                "created_at": "2020-01-01T00:00:00Z",
                "expires_at": "9999-01-01T00:00:00Z",
                "is_negative": false
            }
        },
        "order": ["OLD", "NEW"]
    })
    .to_string();

    let cache = TickerCache::from_json("name_to_symbol", CacheConfig::default(), &json);
    assert_eq!(cache.len(), 1);
    assert!(cache.contains("NEW"));
    assert!(!cache.contains("OLD"));
}

#[test]
fn oversized_snapshot_is_trimmed_to_capacity() {
    let big = small_cache(10);
    for key in ["A", "B", "C", "D"] {
        big.set(key, value(key, "Corp"), false);
    }
    let json = big.to_json().unwrap();

    let restored = TickerCache::from_json(
        "name_to_symbol",
        CacheConfig::default().max_entries(2),
        &json,
    );
    let keys: Vec<String> = restored.entries().into_iter().map(|e| e.key).collect();
    assert_eq!(keys, vec!["C", "D"]);
}

// ============================================================================
// Stores
// ============================================================================

#[test]
fn persist_and_load_through_memory_store() {
    let store = MemoryStore::new();
    let cache = TickerCache::name_to_symbol();
    cache.set("APPLE", value("AAPL", "Apple Inc."), false);
    cache.persist(&store).unwrap();

    assert!(store.read(NAME_TO_SYMBOL_KEY).unwrap().is_some());
    assert!(store.read(SYMBOL_TO_NAME_KEY).unwrap().is_none());

    let warm = TickerCache::name_to_symbol();
    assert_eq!(warm.load(&store).unwrap(), 1);
    assert_eq!(warm.get("APPLE").unwrap().symbol, "AAPL");
}

#[test]
fn load_with_missing_blob_is_empty() {
    let store = MemoryStore::new();
    let cache = TickerCache::symbol_to_name();
    assert_eq!(cache.load(&store).unwrap(), 0);
    assert!(cache.is_empty());
}

#[test]
fn load_ignores_corrupt_blob() {
    let store = MemoryStore::new();
    store.write(NAME_TO_SYMBOL_KEY, "garbage").unwrap();

    let cache = TickerCache::name_to_symbol();
    assert_eq!(cache.load(&store).unwrap(), 0);
}

#[test]
fn file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("nested"));

    assert!(store.read(NAME_TO_SYMBOL_KEY).unwrap().is_none());

    store.write(NAME_TO_SYMBOL_KEY, "{\"a\":1}").unwrap();
    assert_eq!(
        store.read(NAME_TO_SYMBOL_KEY).unwrap().as_deref(),
        Some("{\"a\":1}")
    );
    assert!(dir.path().join("nested/ticker_name_to_symbol.json").exists());

    store.write(NAME_TO_SYMBOL_KEY, "{\"a\":2}").unwrap();
    assert_eq!(
        store.read(NAME_TO_SYMBOL_KEY).unwrap().as_deref(),
        Some("{\"a\":2}")
    );
}

#[test]
fn file_store_rejects_path_like_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());

    assert!(store.write("../escape", "x").is_err());
    assert!(store.write("", "x").is_err());
    assert!(store.read(".hidden").is_err());
}

#[test]
fn cache_survives_file_store_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = FileStore::new(dir.path());
        let cache = TickerCache::symbol_to_name();
        cache.set("AAPL", value("AAPL", "Apple Inc."), false);
        cache.persist(&store).unwrap();
    }

    let store = FileStore::new(dir.path());
    let cache = TickerCache::symbol_to_name();
    assert_eq!(cache.load(&store).unwrap(), 1);
    assert_eq!(cache.get("aapl").unwrap().name, "Apple Inc.");
}
