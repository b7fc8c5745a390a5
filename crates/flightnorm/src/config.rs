//! Configuration management for flightnorm.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::normalizer::identifier::DEFAULT_NOISE_TOKENS;
use crate::normalizer::vehicle::DEFAULT_VEHICLE_KEYWORDS;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory name under the platform config dir.
const CONFIG_DIR_NAME: &str = "flightnorm";

/// Prefix for environment overrides. Nested keys use a double underscore,
/// e.g. `FLIGHTNORM_METRICS__CACHE_TTL_SECS=60`.
const ENV_PREFIX: &str = "FLIGHTNORM_";

/// Upper bound for the metrics cache TTL, in seconds.
pub const MAX_CACHE_TTL_SECS: u64 = 3600;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FLIGHTNORM_`)
/// 2. TOML config file at `~/.config/flightnorm/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extraction rule configuration.
    pub normalizer: NormalizerConfig,
    /// Bulk run configuration.
    pub batch: BatchConfig,
    /// Region metrics configuration.
    pub metrics: MetricsConfig,
}

/// Extraction rule configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Category keywords that identify the vehicle type, checked in order.
    pub vehicle_keywords: Vec<String>,
    /// Tokens that look like identifiers but never are one.
    pub noise_identifiers: Vec<String>,
}

/// Bulk run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of worker threads. 0 uses one per CPU.
    pub workers: usize,
    /// Drop records whose fingerprint was already emitted.
    pub dedupe: bool,
}

/// Region metrics configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// How long a computed result stays cached, in seconds.
    pub cache_ttl_secs: u64,
    /// Maximum number of cached results.
    pub cache_max_entries: usize,
    /// Default number of regions to report.
    pub top: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            vehicle_keywords: to_strings(DEFAULT_VEHICLE_KEYWORDS),
            noise_identifiers: to_strings(DEFAULT_NOISE_TOKENS),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            dedupe: true,
        }
    }
}

impl MetricsConfig {
    /// The cache TTL as a Duration.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 30,
            cache_max_entries: 256,
            top: 10,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `FLIGHTNORM_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        for keyword in &self.normalizer.vehicle_keywords {
            if keyword.is_empty() || !keyword.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(Error::config_validation(format!(
                    "vehicle keyword must be non-empty ASCII letters or digits: {keyword:?}"
                )));
            }
        }

        if self.normalizer.noise_identifiers.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::config_validation(
                "noise_identifiers must not contain blank entries",
            ));
        }

        if !(1..=MAX_CACHE_TTL_SECS).contains(&self.metrics.cache_ttl_secs) {
            return Err(Error::config_validation(format!(
                "cache_ttl_secs ({}) must be between 1 and {MAX_CACHE_TTL_SECS}",
                self.metrics.cache_ttl_secs
            )));
        }

        if self.metrics.cache_max_entries == 0 {
            return Err(Error::config_validation(
                "cache_max_entries must be greater than 0",
            ));
        }

        if self.metrics.top == 0 {
            return Err(Error::config_validation("top must be greater than 0"));
        }

        Ok(())
    }
}
