//! Mock-mode resolution against the static alias table.

use crate::matching::{self, MAX_TYPO_DISTANCE, MOCK_TICKERS, MockTicker};
use crate::types::{ResolutionError, ResolutionResult, ResolvedTicker};

/// `source` reported by mock resolutions.
pub const MOCK_SOURCE: &str = "Mock";

/// Confidence of an exact table hit.
const EXACT_CONFIDENCE: f64 = 1.0;

/// Confidence of a typo-tolerant hit.
const FUZZY_CONFIDENCE: f64 = 0.8;

/// How many table keys a mock `NOT_FOUND` suggests.
const SUGGESTED_KEYS: usize = 5;

/// Resolve an already-normalised, non-empty query without any I/O.
pub(crate) fn resolve(normalized: &str) -> ResolutionResult {
    if let Some(hit) = MOCK_TICKERS.iter().find(|t| t.key == normalized) {
        return success(hit, EXACT_CONFIDENCE);
    }

    let fuzzy = matching::fuzzy_find(
        normalized,
        MOCK_TICKERS.iter().map(|t| t.key),
        MAX_TYPO_DISTANCE,
    )
    .and_then(|key| MOCK_TICKERS.iter().find(|t| t.key == key));
    if let Some(hit) = fuzzy {
        return success(hit, FUZZY_CONFIDENCE);
    }

    let keys: Vec<String> = MOCK_TICKERS
        .iter()
        .take(SUGGESTED_KEYS)
        .map(|t| t.key.to_owned())
        .collect();
    ResolutionError::not_found(format!(
        "Symbol \"{normalized}\" not found in mock mode. Try: {}",
        keys.join(", ")
    ))
    .with_suggestions(keys)
    .into()
}

fn success(ticker: &MockTicker, confidence: f64) -> ResolutionResult {
    ResolutionResult::Success(ResolvedTicker {
        symbol: ticker.symbol.to_owned(),
        name: ticker.name.to_owned(),
        sector: ticker.sector.to_owned(),
        confidence,
        source: MOCK_SOURCE.to_owned(),
        from_cache: false,
    })
}
