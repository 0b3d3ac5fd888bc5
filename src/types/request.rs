//! Request-side types: operating mode, per-call options, query normalisation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::MuninnError;

/// Where resolutions come from.
///
/// The mode is decided outside the resolver (config file, `MUNINN_MODE`);
/// the service only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// Static alias table with typo tolerance. No network, no cache.
    Mock,
    /// Cache, then the provider chain.
    #[default]
    Live,
}

impl ResolutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Live => "live",
        }
    }
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionMode {
    type Err = MuninnError;

    /// Accepts `mock`/`dev` and `live`/`real`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" | "dev" => Ok(Self::Mock),
            "live" | "real" => Ok(Self::Live),
            other => Err(MuninnError::Configuration(format!(
                "unknown resolution mode '{other}' (expected 'mock' or 'live')"
            ))),
        }
    }
}

/// Per-call options for `resolve`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveOptions {
    /// Bypass the name→symbol cache lookup. Results are still written back.
    #[serde(default)]
    pub skip_cache: bool,
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_cache(mut self, skip: bool) -> Self {
        self.skip_cache = skip;
        self
    }
}

/// Canonical form of a query or cache key: trimmed and uppercased.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_uppercase()
}
