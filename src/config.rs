//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. explicit path (e.g. the CLI's `--config <path>`)
//! 2. `~/.muninn/config.toml` (user)
//! 3. `/etc/muninn/config.toml` (system)
//! 4. built-in defaults
//!
//! `MUNINN_MODE=mock|live` overrides the file's `mode`.
//!
//! ```toml
//! mode = "live"
//!
//! [cache]
//! dir = "/var/cache/muninn"
//! max_entries = 1000
//! name_ttl_days = 30
//! symbol_ttl_days = 90
//! negative_ttl_hours = 24
//!
//! [resolution]
//! confidence_threshold = 0.85
//! not_found_fallthrough = false
//!
//! [providers.yahoo]
//! enabled = true
//! max_requests_per_second = 5
//! max_requests_per_day = 500
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::CacheConfig;
use crate::limiter::RateLimiterConfig;
use crate::types::ResolutionMode;
use crate::{MuninnError, Result};

/// Environment variable overriding [`Config::mode`].
pub const MODE_ENV_VAR: &str = "MUNINN_MODE";

const HOUR_SECS: u64 = 60 * 60;
const DAY_SECS: u64 = 24 * HOUR_SECS;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mode: ResolutionMode,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub resolution: ResolutionSettings,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Snapshot directory. Unset keeps the builder's store (in-memory by
    /// default); the CLI falls back to the platform cache dir.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_name_ttl_days")]
    pub name_ttl_days: u64,
    #[serde(default = "default_symbol_ttl_days")]
    pub symbol_ttl_days: u64,
    #[serde(default = "default_negative_ttl_hours")]
    pub negative_ttl_hours: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: None,
            max_entries: default_max_entries(),
            name_ttl_days: default_name_ttl_days(),
            symbol_ttl_days: default_symbol_ttl_days(),
            negative_ttl_hours: default_negative_ttl_hours(),
        }
    }
}

fn default_max_entries() -> usize {
    1_000
}

fn default_name_ttl_days() -> u64 {
    30
}

fn default_symbol_ttl_days() -> u64 {
    90
}

fn default_negative_ttl_hours() -> u64 {
    24
}

impl CacheSettings {
    pub fn name_to_symbol(&self) -> CacheConfig {
        CacheConfig::name_to_symbol()
            .max_entries(self.max_entries)
            .ttl(Duration::from_secs(self.name_ttl_days.saturating_mul(DAY_SECS)))
            .negative_ttl(self.negative_ttl())
    }

    pub fn symbol_to_name(&self) -> CacheConfig {
        CacheConfig::symbol_to_name()
            .max_entries(self.max_entries)
            .ttl(Duration::from_secs(self.symbol_ttl_days.saturating_mul(DAY_SECS)))
            .negative_ttl(self.negative_ttl())
    }

    fn negative_ttl(&self) -> Duration {
        Duration::from_secs(self.negative_ttl_hours.saturating_mul(HOUR_SECS))
    }
}

/// `[resolution]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionSettings {
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default)]
    pub not_found_fallthrough: bool,
}

impl Default for ResolutionSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            not_found_fallthrough: false,
        }
    }
}

fn default_confidence_threshold() -> f64 {
    crate::service::DEFAULT_CONFIDENCE_THRESHOLD
}

/// `[providers]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub yahoo: YahooConfig,
}

/// `[providers.yahoo]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YahooConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Override the API base URL (proxies, tests).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_yahoo_per_second")]
    pub max_requests_per_second: u32,
    #[serde(default = "default_yahoo_per_day")]
    pub max_requests_per_day: u32,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            max_requests_per_second: default_yahoo_per_second(),
            max_requests_per_day: default_yahoo_per_day(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_yahoo_per_second() -> u32 {
    RateLimiterConfig::yahoo().max_requests_per_second
}

fn default_yahoo_per_day() -> u32 {
    RateLimiterConfig::yahoo().max_requests_per_day
}

impl YahooConfig {
    /// Yahoo preset with this section's limits applied.
    pub fn rate_limit(&self) -> RateLimiterConfig {
        RateLimiterConfig::yahoo()
            .max_requests_per_second(self.max_requests_per_second)
            .max_requests_per_day(self.max_requests_per_day)
    }
}

impl Config {
    /// Load configuration from the standard locations, then apply
    /// `MUNINN_MODE`.
    ///
    /// An explicit path that does not exist is an error; with no explicit
    /// path and no file in the standard locations, defaults are used.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path)?,
            None => {
                debug!("no config file found, using defaults");
                Self::default()
            }
        };
        config.apply_mode_override(std::env::var(MODE_ENV_VAR).ok().as_deref())?;
        Ok(config)
    }

    /// Parse a single file, without environment overrides.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MuninnError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        let config = Self::from_toml_str(&content).map_err(|e| {
            MuninnError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| MuninnError::Configuration(e.to_string()))
    }

    /// Apply a mode override such as the value of `MUNINN_MODE`.
    ///
    /// `None` or an empty value leaves the mode unchanged.
    pub fn apply_mode_override(&mut self, value: Option<&str>) -> Result<()> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => {
                self.mode = v.parse()?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Resolve the config file path, if any.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(MuninnError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".muninn").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/muninn/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.mode, ResolutionMode::Live);
        assert_eq!(config.cache.max_entries, 1_000);
        assert_eq!(config.cache.name_ttl_days, 30);
        assert_eq!(config.cache.symbol_ttl_days, 90);
        assert_eq!(config.cache.negative_ttl_hours, 24);
        assert_eq!(config.resolution.confidence_threshold, 0.85);
        assert!(!config.resolution.not_found_fallthrough);
        assert!(config.providers.yahoo.enabled);
        assert_eq!(config.providers.yahoo.rate_limit(), RateLimiterConfig::yahoo());
    }

    #[test]
    fn parse_minimal_config() {
        let config = Config::from_toml_str(r#"mode = "mock""#).unwrap();
        assert_eq!(config.mode, ResolutionMode::Mock);
        // Defaults preserved
        assert_eq!(config.cache, CacheSettings::default());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            mode = "live"

            [cache]
            dir = "/tmp/muninn-cache"
            max_entries = 50
            name_ttl_days = 7
            symbol_ttl_days = 14
            negative_ttl_hours = 2

            [resolution]
            confidence_threshold = 0.9
            not_found_fallthrough = true

            [providers.yahoo]
            enabled = false
            base_url = "http://localhost:8080"
            max_requests_per_second = 1
            max_requests_per_day = 10
        "#;
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.cache.dir, Some(PathBuf::from("/tmp/muninn-cache")));

        let names = config.cache.name_to_symbol();
        assert_eq!(names.max_entries, 50);
        assert_eq!(names.ttl, Duration::from_secs(7 * DAY_SECS));
        assert_eq!(names.negative_ttl, Duration::from_secs(2 * HOUR_SECS));
        assert_eq!(
            config.cache.symbol_to_name().ttl,
            Duration::from_secs(14 * DAY_SECS)
        );

        assert_eq!(config.resolution.confidence_threshold, 0.9);
        assert!(config.resolution.not_found_fallthrough);

        let yahoo = &config.providers.yahoo;
        assert!(!yahoo.enabled);
        assert_eq!(yahoo.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(yahoo.rate_limit().max_requests_per_second, 1);
        assert_eq!(yahoo.rate_limit().max_requests_per_day, 10);
        // Retry policy still comes from the preset.
        assert_eq!(yahoo.rate_limit().max_retries, 5);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Config::from_toml_str(r#"mode = "staging""#).is_err());
    }

    #[test]
    fn mode_override() {
        let mut config = Config::default();
        config.apply_mode_override(Some("dev")).unwrap();
        assert_eq!(config.mode, ResolutionMode::Mock);

        config.apply_mode_override(Some("  ")).unwrap();
        assert_eq!(config.mode, ResolutionMode::Mock);

        config.apply_mode_override(None).unwrap();
        assert_eq!(config.mode, ResolutionMode::Mock);

        assert!(config.apply_mode_override(Some("bogus")).is_err());
    }

    #[test]
    fn explicit_missing_path_is_error() {
        let err = Config::load(Some(Path::new("/nonexistent/muninn.toml"))).unwrap_err();
        assert!(matches!(err, MuninnError::Configuration(_)));
    }

    #[test]
    fn load_from_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\nmax_entries = 7").unwrap();
        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.cache.max_entries, 7);
    }

    #[test]
    fn malformed_file_is_configuration_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache\nmax_entries = ").unwrap();
        let err = Config::load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
