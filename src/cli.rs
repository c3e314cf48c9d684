//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged over
//! the configuration file and environment variables.

use crate::provider::ProviderKind;
use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;
use std::time::Duration;

/// Samples the CPU and memory usage of a process and charts it on Ctrl-C.
#[derive(Parser, Debug, Default, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// The process to monitor.
    #[arg(short, long, value_name = "PID", allow_negative_numbers = true)]
    pub pid: Option<i64>,

    /// Write an HTML chart of the samples to this file on Ctrl-C.
    #[arg(long, value_name = "FILE")]
    pub html: Option<PathBuf>,

    /// Sampling interval, e.g. `1s`, `250ms`, `1m30s`.
    #[arg(short, long, value_name = "DURATION", value_parser = parse_duration)]
    pub tick: Option<Duration>,

    /// Where to read process metrics from.
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    /// Do not open the report after writing it.
    #[arg(long)]
    pub no_open: bool,

    /// Logging level (overridden by `RUST_LOG`).
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Periodically log internal metrics.
    #[arg(long)]
    pub log_metrics: bool,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(pid) = self.pid {
            dict.insert("pid".into(), Value::from(pid));
        }

        if let Some(html) = &self.html {
            dict.insert("html".into(), Value::from(html.to_string_lossy().into_owned()));
        }

        if let Some(tick) = self.tick {
            dict.insert("tick".into(), Value::from(format_duration(tick)));
        }

        if let Some(provider) = self.provider {
            dict.insert("provider".into(), Value::from(provider.as_str()));
        }

        // Flags only ever switch a setting away from its default.
        if self.no_open {
            dict.insert("open_report".into(), Value::from(false));
        }

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        if self.log_metrics {
            let mut metrics = Dict::new();
            metrics.insert("log_metrics".into(), Value::from(true));
            dict.insert("metrics".into(), Value::from(metrics));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}

/// Parses a duration such as `300ms`, `1.5s` or `1h2m3s`.
///
/// Accepted units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. A bare
/// `0` is accepted; any other number needs a unit.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input == "0" {
        return Ok(Duration::ZERO);
    }
    if input.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration `{}`", input))?;
        if number_len == 0 {
            return Err(format!("invalid duration `{}`", input));
        }
        let (number, tail) = rest.split_at(number_len);

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let unit_nanos: u64 = match unit {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3600 * 1_000_000_000,
            _ => return Err(format!("unknown unit `{}` in duration `{}`", unit, input)),
        };

        let out_of_range = || format!("duration `{}` out of range", input);
        let invalid = || format!("invalid number `{}` in duration `{}`", number, input);
        let part = if number.contains('.') {
            let value: f64 = number.parse().map_err(|_| invalid())?;
            let nanos = (value * unit_nanos as f64).round();
            if !nanos.is_finite() || nanos > u64::MAX as f64 {
                return Err(out_of_range());
            }
            Duration::from_nanos(nanos as u64)
        } else {
            let value: u64 = number.parse().map_err(|_| invalid())?;
            value
                .checked_mul(unit_nanos)
                .map(Duration::from_nanos)
                .ok_or_else(out_of_range)?
        };
        total = total.checked_add(part).ok_or_else(out_of_range)?;
        rest = tail;
    }
    Ok(total)
}

/// Renders a duration in the largest unit that represents it exactly, so
/// that `parse_duration(&format_duration(d)) == d`.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0".to_string();
    }
    let units: [(u128, &str); 4] = [
        (1_000_000_000, "s"),
        (1_000_000, "ms"),
        (1_000, "us"),
        (1, "ns"),
    ];
    units
        .iter()
        .find(|(unit, _)| nanos % unit == 0)
        .map(|(unit, suffix)| format!("{}{}", nanos / unit, suffix))
        .unwrap_or_else(|| format!("{}ns", nanos))
}
