//! Configuration management for session-registry.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::Path;
use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Args;
use crate::eviction::{EvictionConfig, DEFAULT_FULL_FLUSH, DEFAULT_INACTIVITY_SWEEP};

const TIME_FORMAT: &str = "%H:%M";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Eviction schedules.
    pub eviction: EvictionSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Eviction configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvictionSection {
    /// Inactivity sweep schedule.
    pub inactivity_sweep: PeriodicSection,
    /// Full flush schedule.
    pub full_flush: PeriodicSection,
    /// Daily flush schedule.
    pub daily_flush: DailySection,
}

/// A policy that runs on a fixed period.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodicSection {
    /// Run this policy.
    pub enabled: bool,
    /// Period in seconds; unset means the policy's own default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
}

impl Default for PeriodicSection {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: None,
        }
    }
}

/// A policy that runs once a day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DailySection {
    /// Run this policy.
    pub enabled: bool,
    /// Local time of day, `HH:MM`.
    pub at: String,
}

impl Default for DailySection {
    fn default() -> Self {
        Self {
            enabled: true,
            at: "05:00".to_string(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    fn apply_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secs) =
            var("SESSION_REGISTRY_INACTIVITY_SWEEP_SECS").and_then(|v| v.parse().ok())
        {
            self.eviction.inactivity_sweep.interval_secs = Some(secs);
        }

        if let Some(secs) = var("SESSION_REGISTRY_FULL_FLUSH_SECS").and_then(|v| v.parse().ok()) {
            self.eviction.full_flush.interval_secs = Some(secs);
        }

        if let Some(at) = var("SESSION_REGISTRY_DAILY_FLUSH_AT") {
            self.eviction.daily_flush.at = at;
        }

        if let Some(level) = var("SESSION_REGISTRY_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(secs) = args.inactivity_sweep_secs {
            self.eviction.inactivity_sweep.enabled = true;
            self.eviction.inactivity_sweep.interval_secs = Some(secs);
        }

        if let Some(secs) = args.full_flush_secs {
            self.eviction.full_flush.enabled = true;
            self.eviction.full_flush.interval_secs = Some(secs);
        }

        if args.no_full_flush {
            self.eviction.full_flush.enabled = false;
        }

        if let Some(ref at) = args.daily_flush_at {
            self.eviction.daily_flush.enabled = true;
            self.eviction.daily_flush.at = at.clone();
        }

        if args.no_daily_flush {
            self.eviction.daily_flush.enabled = false;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env();
        config.apply_args(args);

        Ok(config)
    }

    /// Convert to the scheduler configuration, validating it on the way.
    pub fn to_eviction_config(&self) -> Result<EvictionConfig, ConfigError> {
        let section = &self.eviction;
        let mut config = EvictionConfig::disabled();

        if section.inactivity_sweep.enabled {
            config = config.with_inactivity_sweep(period(
                "inactivity_sweep",
                section.inactivity_sweep.interval_secs,
                DEFAULT_INACTIVITY_SWEEP,
            )?);
        }

        if section.full_flush.enabled {
            config = config.with_full_flush(period(
                "full_flush",
                section.full_flush.interval_secs,
                DEFAULT_FULL_FLUSH,
            )?);
        }

        if section.daily_flush.enabled {
            let at = NaiveTime::parse_from_str(&section.daily_flush.at, TIME_FORMAT)
                .map_err(|_| ConfigError::InvalidTime(section.daily_flush.at.clone()))?;
            config = config.with_daily_flush(at);
        }

        Ok(config)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

fn period(
    name: &'static str,
    secs: Option<u64>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match secs {
        None => Ok(default),
        Some(0) => Err(ConfigError::InvalidInterval(name)),
        Some(secs) => Ok(Duration::from_secs(secs)),
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing error.
    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),
    /// Zero or missing interval.
    #[error("interval for {0} must be greater than zero")]
    InvalidInterval(&'static str),
    /// Daily flush time is not `HH:MM`.
    #[error("invalid daily flush time (expected HH:MM): {0}")]
    InvalidTime(String),
}
