//! Static alias data: the mock ticker table and known company aliases.

/// One row of the mock resolution table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockTicker {
    /// Normalised lookup key (alias or symbol).
    pub key: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
    pub sector: &'static str,
}

const fn row(
    key: &'static str,
    symbol: &'static str,
    name: &'static str,
    sector: &'static str,
) -> MockTicker {
    MockTicker {
        key,
        symbol,
        name,
        sector,
    }
}

const ACME: (&str, &str, &str) = ("ACME", "ACME Corp", "Industrials");
const ABSI: (&str, &str, &str) = ("ABSI", "Absci Corp", "Healthcare");
const NVO: (&str, &str, &str) = ("NVO", "Novo Nordisk A/S", "Healthcare");
const LLY: (&str, &str, &str) = ("LLY", "Eli Lilly and Company", "Healthcare");
const ROG: (&str, &str, &str) = ("ROG", "Roche Holding AG", "Healthcare");
const MBG: (&str, &str, &str) = ("MBG", "Mercedes-Benz Group AG", "Automotive");
const BMW: (&str, &str, &str) = ("BMW", "Bayerische Motoren Werke AG", "Automotive");
const SIE: (&str, &str, &str) = ("SIE", "Siemens AG", "Industrials");
const AAPL: (&str, &str, &str) = ("AAPL", "Apple Inc.", "Technology");
const MSFT: (&str, &str, &str) = ("MSFT", "Microsoft Corporation", "Technology");
const AMZN: (&str, &str, &str) = ("AMZN", "Amazon.com Inc.", "Consumer Cyclical");
const NVDA: (&str, &str, &str) = ("NVDA", "NVIDIA Corporation", "Technology");
const META: (&str, &str, &str) = ("META", "Meta Platforms Inc.", "Technology");
const TSLA: (&str, &str, &str) = ("TSLA", "Tesla Inc.", "Consumer Cyclical");
const AZN: (&str, &str, &str) = ("AZN", "AstraZeneca PLC", "Healthcare");
const PFE: (&str, &str, &str) = ("PFE", "Pfizer Inc.", "Healthcare");
const MRK: (&str, &str, &str) = ("MRK", "Merck & Co. Inc.", "Healthcare");

const fn alias(key: &'static str, t: (&'static str, &'static str, &'static str)) -> MockTicker {
    row(key, t.0, t.1, t.2)
}

/// Mock resolution table, in lookup order.
///
/// The Alphabet aliases point at the fictional `ACME` so mock output is
/// never mistaken for a live quote. Common typos are deliberately absent:
/// they resolve through the edit-distance path instead.
pub const MOCK_TICKERS: &[MockTicker] = &[
    alias("ACME", ACME),
    alias("GOOGLE", ACME),
    alias("GOOG", ACME),
    alias("GOOGL", ACME),
    alias("ALPHABET", ACME),
    alias("ABSI", ABSI),
    alias("ABSCI", ABSI),
    alias("ABSI CORP", ABSI),
    alias("NVO", NVO),
    alias("NOVO", NVO),
    alias("NOVO-B", NVO),
    alias("NOVO NORDISK", NVO),
    alias("LLY", LLY),
    alias("LILLY", LLY),
    alias("ELI LILLY", LLY),
    alias("ROG", ROG),
    alias("ROCHE", ROG),
    alias("MBG", MBG),
    alias("MERCEDES", MBG),
    alias("DAIMLER", MBG),
    alias("BMW", BMW),
    alias("BAYERISCHE", BMW),
    alias("SIE", SIE),
    alias("SIEMENS", SIE),
    alias("SIEMENS AG", SIE),
    alias("AAPL", AAPL),
    alias("APPLE", AAPL),
    alias("MSFT", MSFT),
    alias("MICROSOFT", MSFT),
    alias("AMZN", AMZN),
    alias("AMAZON", AMZN),
    alias("NVDA", NVDA),
    alias("NVIDIA", NVDA),
    alias("META", META),
    alias("FACEBOOK", META),
    alias("TSLA", TSLA),
    alias("TESLA", TSLA),
    alias("AZN", AZN),
    alias("ASTRA", AZN),
    alias("PFE", PFE),
    alias("PFIZER", PFE),
    alias("MRK", MRK),
    alias("MERCK", MRK),
    row("NFLX", "NFLX", "Netflix Inc.", "Communication Services"),
    row("JNJ", "JNJ", "Johnson & Johnson", "Healthcare"),
    row("JPM", "JPM", "JPMorgan Chase & Co.", "Financial Services"),
    row("CAT", "CAT", "Caterpillar Inc.", "Industrials"),
    row("DIS", "DIS", "Walt Disney Company", "Communication Services"),
];

/// Well-known company names and the symbols users most likely meant.
pub const KNOWN_ALIASES: &[(&str, &[&str])] = &[
    ("GOOGLE", &["GOOGL", "GOOG", "Alphabet Inc."]),
    ("ALPHABET", &["GOOGL", "GOOG"]),
    ("APPLE", &["AAPL"]),
    ("MICROSOFT", &["MSFT"]),
    ("AMAZON", &["AMZN"]),
    ("FACEBOOK", &["META"]),
    ("TESLA", &["TSLA"]),
    ("NVIDIA", &["NVDA"]),
];

/// Upper bound on suggestions attached to a `NOT_FOUND` error.
pub const MAX_SUGGESTIONS: usize = 3;

/// Alias suggestions for an unresolved query.
///
/// A known name matches when either string contains the other
/// (case-insensitive). Symbols are collected in table order and truncated
/// to [`MAX_SUGGESTIONS`].
pub fn suggestions(query: &str) -> Vec<String> {
    let q = query.trim().to_uppercase();
    if q.is_empty() {
        return Vec::new();
    }

    KNOWN_ALIASES
        .iter()
        .filter(|(name, _)| q.contains(name) || name.contains(q.as_str()))
        .flat_map(|(_, symbols)| symbols.iter())
        .take(MAX_SUGGESTIONS)
        .map(|s| (*s).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::matching::levenshtein;

    #[test]
    fn mock_keys_are_unique_and_normalised() {
        let mut seen = HashSet::new();
        for t in MOCK_TICKERS {
            assert!(seen.insert(t.key), "duplicate mock key {}", t.key);
            assert_eq!(t.key, t.key.trim().to_uppercase());
        }
    }

    #[test]
    fn typo_keys_are_not_in_the_table() {
        for typo in ["GOGLE", "ALFABET", "NOWO", "LILY", "ROCH"] {
            assert!(MOCK_TICKERS.iter().all(|t| t.key != typo));
            assert!(
                MOCK_TICKERS
                    .iter()
                    .any(|t| levenshtein(typo, t.key) <= 2),
                "{typo} should still be reachable by edit distance"
            );
        }
    }

    #[test]
    fn suggestions_match_both_directions() {
        assert_eq!(suggestions("GOOGLE INC"), vec!["GOOGL", "GOOG", "Alphabet Inc."]);
        assert_eq!(suggestions("tesla"), vec!["TSLA"]);
        assert_eq!(suggestions("AMAZ"), vec!["AMZN"]);
    }

    #[test]
    fn suggestions_are_capped() {
        // "A" is contained in several known names.
        assert_eq!(suggestions("A").len(), MAX_SUGGESTIONS);
    }

    #[test]
    fn suggestions_empty_for_unknown() {
        assert!(suggestions("XYZZY").is_empty());
        assert!(suggestions("   ").is_empty());
    }
}
