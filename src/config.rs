//! Configuration management for procplot
//!
//! This module defines the main `Config` struct, responsible for holding all
//! application settings. It uses the `figment` crate to layer built-in
//! defaults, an optional TOML file, `PROCPLOT_` environment variables and
//! finally the command-line flags.

use crate::cli::Cli;
use crate::provider::ProviderKind;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors for settings that parse but are not usable.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("a target pid is required (use --pid)")]
    MissingPid,
    #[error("pid must be a positive integer, got {0}")]
    InvalidPid(i64),
    #[error("tick must be positive")]
    ZeroTick,
}

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// The process to monitor. Zero means "not set".
    pub pid: i64,
    /// Where to write the HTML report on interrupt. Empty disables export.
    pub html: Option<PathBuf>,
    /// The sampling interval, written like `--tick` (`"250ms"`, `"1m30s"`).
    #[serde(with = "tick_text")]
    pub tick: Duration,
    /// Which metrics provider to query each tick.
    pub provider: ProviderKind,
    /// Open the report with the default viewer after writing it.
    pub open_report: bool,
    /// The logging level used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Configuration for internal metrics.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Configuration for internal metrics.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MetricsConfig {
    /// Log internal metrics periodically.
    pub log_metrics: bool,
    /// The logging interval in seconds.
    pub log_interval_seconds: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            log_metrics: false,
            log_interval_seconds: 10,
        }
    }
}

impl Config {
    /// Loads and validates the configuration for the given command line.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(path) = &cli.config {
            if !path.exists() {
                anyhow::bail!("configuration file not found: {}", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }
        let config: Config = figment
            // e.g., PROCPLOT_TICK=250ms or PROCPLOT_METRICS__LOG_METRICS=true
            .merge(Env::prefixed("PROCPLOT_").split("__"))
            .merge(cli.clone())
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings that `serde` cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.target_pid()?;
        if self.tick.is_zero() {
            return Err(ConfigError::ZeroTick);
        }
        Ok(())
    }

    /// The target pid as the operating system sees it.
    pub fn target_pid(&self) -> Result<u32, ConfigError> {
        match self.pid {
            0 => Err(ConfigError::MissingPid),
            pid => u32::try_from(pid).map_err(|_| ConfigError::InvalidPid(pid)),
        }
    }

    /// The report destination, if export is enabled.
    pub fn export_destination(&self) -> Option<&Path> {
        self.html
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }
}

/// (De)serializes the tick as duration text.
///
/// A bare integer is read the same way the command line reads it, so `0` is
/// accepted (and later rejected by `validate`) while `250` lacks a unit.
mod tick_text {
    use crate::cli::{format_duration, parse_duration};
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Count(u64),
    }

    pub fn serialize<S: Serializer>(tick: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*tick))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text,
            Raw::Count(count) => count.to_string(),
        };
        parse_duration(&text).map_err(de::Error::custom)
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            pid: 0,
            html: None,
            tick: Duration::from_secs(1),
            provider: ProviderKind::Ps,
            open_report: true,
            log_level: "warn".to_string(),
            metrics: MetricsConfig::default(),
        }
    }
}
