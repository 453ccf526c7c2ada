use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CATALOG_URL: &str = "https://rageo.minv.sk/opendata/katalog.json";
pub const DEFAULT_DEST_DIR: &str = "data/egov/";

/// Upper bound for a request timeout and for any single backoff sleep.
pub const MAX_WAIT_SECS: f64 = 86_400.0;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0}: tries must be at least 1")]
    NoTries(&'static str),
    #[error(
        "{0}: timeout must be positive and at most {max} seconds, got {1}",
        max = MAX_WAIT_SECS
    )]
    Timeout(&'static str, f64),
    #[error("{0}: backoff must be a finite number greater than 1.0, got {1}")]
    Backoff(&'static str, f64),
    #[error(
        "{0}: longest backoff sleep would be {1} seconds, at most {max} allowed",
        max = MAX_WAIT_SECS
    )]
    DelayTooLong(&'static str, f64),
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub fetch: FetchConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourceConfig {
    pub catalog_url: String,
}

/// Keys missing from a partially written `[fetch.*]` table fall back to
/// `RetryPolicy::default()`, not to the patient dataset policy.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FetchConfig {
    pub catalog: RetryPolicy,
    pub dataset: RetryPolicy,
}

/// How many times to try a GET and how long to wait in between.
///
/// Attempt `i` (counting from zero) that fails is followed by a sleep of
/// `backoff^i` delay units, except after the last attempt.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RetryPolicy {
    pub tries: u32,
    pub timeout_secs: f64,
    pub backoff: f64,
    pub delay_unit_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub dest_dir: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            catalog: RetryPolicy::default(),
            dataset: RetryPolicy::patient(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            tries: 5,
            timeout_secs: 30.0,
            backoff: 1.5,
            delay_unit_ms: 1000,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dest_dir: PathBuf::from(DEFAULT_DEST_DIR),
        }
    }
}

impl RetryPolicy {
    /// Policy for dataset endpoints: more tries, slower growth.
    pub fn patient() -> Self {
        Self {
            tries: 6,
            backoff: 1.7,
            ..Self::default()
        }
    }

    /// Out-of-range values saturate at `MAX_WAIT_SECS`.
    pub fn timeout(&self) -> Duration {
        bounded_duration(self.timeout_secs)
    }

    /// Sleep after the failed attempt with zero-based index `attempt`.
    /// Out-of-range values saturate at `MAX_WAIT_SECS`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        bounded_duration(self.delay_secs(attempt))
    }

    fn delay_secs(&self, attempt: u32) -> f64 {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        self.backoff.powi(exponent) * self.delay_unit_ms as f64 / 1000.0
    }

    pub fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.tries < 1 {
            return Err(ConfigError::NoTries(name));
        }
        // NaN fails every comparison below
        if !(self.timeout_secs > 0.0 && self.timeout_secs <= MAX_WAIT_SECS) {
            return Err(ConfigError::Timeout(name, self.timeout_secs));
        }
        if !(self.backoff > 1.0 && self.backoff.is_finite()) {
            return Err(ConfigError::Backoff(name, self.backoff));
        }
        // the last attempt is never followed by a sleep
        if self.tries >= 2 {
            let longest = self.delay_secs(self.tries - 2);
            if !(longest <= MAX_WAIT_SECS) {
                return Err(ConfigError::DelayTooLong(name, longest));
            }
        }
        Ok(())
    }
}

fn bounded_duration(secs: f64) -> Duration {
    let secs = if secs.is_nan() {
        MAX_WAIT_SECS
    } else {
        secs.clamp(0.0, MAX_WAIT_SECS)
    };
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::from_secs(MAX_WAIT_SECS as u64))
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fetch.catalog.validate("fetch.catalog")?;
        self.fetch.dataset.validate("fetch.dataset")?;
        Ok(())
    }
}
