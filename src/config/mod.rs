//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables (`INGUARD_*`)
//! - CLI arguments (for the `inguard` binary)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GuardError, Result};

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Rewriter configuration
    #[serde(default)]
    pub sanitize: SanitizeConfig,

    /// Event and risk aggregator configuration
    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| GuardError::Configuration(format!("Failed to read config file: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| GuardError::Configuration(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Default config file location (`<config_dir>/inguard/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("inguard").join("config.toml"))
    }

    /// Load from an explicit file, else the default path if it exists, else
    /// defaults; environment variables are applied on top.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let base = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(path)?,
                _ => Self::default(),
            },
        };

        Ok(base.with_env_overrides())
    }

    /// Apply `INGUARD_*` environment overrides; unparseable values are ignored
    pub fn with_env_overrides(mut self) -> Self {
        // Sanitize settings
        if let Some(val) = env_parse("INGUARD_MAX_LENGTH") {
            self.sanitize.max_length = val;
        }
        if let Some(val) = env_parse("INGUARD_ALLOW_HTML") {
            self.sanitize.allow_html = val;
        }
        if let Some(val) = env_parse("INGUARD_MAX_PASSES") {
            self.sanitize.max_passes = val;
        }

        // Monitor settings
        if let Some(val) = env_parse("INGUARD_MAX_EVENTS") {
            self.monitor.max_events = val;
        }
        if let Some(val) = env_parse("INGUARD_RATE_LIMIT") {
            self.monitor.rate_limit_threshold = val;
        }
        if let Some(val) = env_parse("INGUARD_RATE_WINDOW_SECS") {
            self.monitor.rate_limit_window_secs = val;
        }
        if let Some(val) = env_parse("INGUARD_MAX_SCAN_SIZE") {
            self.monitor.max_scan_size = val;
        }

        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Per-call rewriter settings.
///
/// A plain value type: callers may build one per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeConfig {
    /// Maximum output length in chars. Input is truncated to this before any pass.
    pub max_length: usize,

    /// Keep HTML markup (skip entity encoding)
    pub allow_html: bool,

    /// Upper bound on rewrite passes
    pub max_passes: usize,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            max_length: 1000,
            allow_html: false,
            max_passes: 10,
        }
    }
}

impl SanitizeConfig {
    /// Set the maximum length
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Allow HTML markup through
    pub fn allow_html(mut self, allow: bool) -> Self {
        self.allow_html = allow;
        self
    }

    /// Set the pass budget
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }
}

/// Event and risk aggregator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Event log capacity; oldest events are dropped beyond this
    pub max_events: usize,

    /// Number of most recent events included in a report
    pub report_events: usize,

    /// Accesses allowed per actor within the window
    pub rate_limit_threshold: usize,

    /// Sliding window length in seconds
    pub rate_limit_window_secs: u64,

    /// Maximum input size accepted by checks (bytes)
    pub max_scan_size: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_events: 1000,
            report_events: 20,
            rate_limit_threshold: 50,
            rate_limit_window_secs: 60,
            max_scan_size: 1024 * 1024, // 1MB
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sanitize.max_length, 1000);
        assert_eq!(config.sanitize.max_passes, 10);
        assert!(!config.sanitize.allow_html);
        assert_eq!(config.monitor.rate_limit_threshold, 50);
        assert_eq!(config.monitor.max_events, 1000);
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            [sanitize]
            max_length = 254
            allow_html = true

            [monitor]
            rate_limit_threshold = 5
            report_events = 3
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.sanitize.max_length, 254);
        assert!(config.sanitize.allow_html);
        // Missing keys fall back to defaults
        assert_eq!(config.sanitize.max_passes, 10);
        assert_eq!(config.monitor.rate_limit_threshold, 5);
        assert_eq!(config.monitor.report_events, 3);
        assert_eq!(config.monitor.rate_limit_window_secs, 60);
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[monitor]\nmax_events = 10\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.monitor.max_events, 10);

        let loaded = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(loaded.monitor.max_events, 10);
    }

    #[test]
    fn test_config_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, GuardError::Configuration(_)));
    }

    #[test]
    fn test_sanitize_config_builder() {
        let config = SanitizeConfig::default()
            .with_max_length(20)
            .with_max_passes(3)
            .allow_html(true);
        assert_eq!(config.max_length, 20);
        assert_eq!(config.max_passes, 3);
        assert!(config.allow_html);
    }
}
