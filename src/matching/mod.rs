//! Fuzzy matching primitives.
//!
//! Edit distance backs the mock resolver's typo tolerance; the alias table
//! backs the "did you mean" suggestions attached to `NOT_FOUND` errors.

mod aliases;

pub use aliases::{KNOWN_ALIASES, MAX_SUGGESTIONS, MOCK_TICKERS, MockTicker, suggestions};

/// Maximum edit distance accepted by the mock resolver's typo path.
pub const MAX_TYPO_DISTANCE: usize = 2;

/// Levenshtein edit distance between two strings, counted in `char`s.
///
/// Insertions, deletions and substitutions all cost one.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// First key (in iteration order) within `max_distance` edits of `query`.
///
/// Order matters: when several keys are close enough, the earliest wins,
/// not the closest.
pub fn fuzzy_find<'a, I>(query: &str, keys: I, max_distance: usize) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    keys.into_iter()
        .find(|key| levenshtein(query, key) <= max_distance)
}
