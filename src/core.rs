//! Core domain types and service traits for procplot
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern component interactions throughout the application.

use crate::provider::ProviderError;
use crate::report::ExportError;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::path::Path;
use tokio::time::Instant;

/// One timestamped sample of a target process's resource usage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    /// The instant the tick fired, projected onto the wall clock
    pub timestamp: DateTime<Utc>,
    /// CPU usage as reported by the provider
    pub cpu_percent: f64,
    /// Share of physical memory in use
    pub mem_percent: f64,
    /// Resident set size in KiB, as reported by the provider
    pub rss_kib: u64,
    /// Virtual size in KiB, as reported by the provider
    pub vsz_kib: u64,
}

impl Record {
    /// Builds a record from a parsed sample taken at `timestamp`.
    pub fn new(timestamp: DateTime<Utc>, sample: Sample) -> Self {
        Self {
            timestamp,
            cpu_percent: sample.cpu_percent,
            mem_percent: sample.mem_percent,
            rss_kib: sample.rss_kib,
            vsz_kib: sample.vsz_kib,
        }
    }

    /// Fractional seconds since the Unix epoch, used on the console.
    pub fn display_seconds(&self) -> f64 {
        self.timestamp.timestamp_micros() as f64 / 1_000_000.0
    }

    /// Milliseconds since the Unix epoch, used to build dates in the report.
    pub fn epoch_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Resident set size in whole MiB (truncated).
    pub fn rss_mib(&self) -> u64 {
        self.rss_kib / 1024
    }

    /// Virtual size in whole MiB (truncated).
    pub fn vsz_mib(&self) -> u64 {
        self.vsz_kib / 1024
    }

    /// The fixed-arity row embedded in the exported report.
    pub fn export_row(&self) -> ExportRow {
        ExportRow(
            self.epoch_millis(),
            self.cpu_percent,
            self.mem_percent,
            self.rss_kib,
            self.vsz_kib,
        )
    }
}

/// `(epoch_ms, cpu_percent, mem_percent, rss_kib, vsz_kib)`, serialized as a
/// JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExportRow(pub i64, pub f64, pub f64, pub u64, pub u64);

/// The four numeric fields parsed out of one provider payload.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    pub cpu_percent: f64,
    pub mem_percent: f64,
    pub rss_kib: u64,
    pub vsz_kib: u64,
}

/// Maps monotonic tick instants onto wall-clock timestamps.
///
/// The wall clock is read once, when the clock is created. Every later
/// timestamp is that anchor plus the monotonic time elapsed since, so
/// timestamps taken from increasing instants are strictly increasing even if
/// the system clock is stepped while sampling.
#[derive(Debug, Clone, Copy)]
pub struct SampleClock {
    wall_anchor: DateTime<Utc>,
    mono_anchor: Instant,
}

impl SampleClock {
    /// Anchors a new clock at the current instant.
    pub fn start() -> Self {
        Self::anchored(Utc::now(), Instant::now())
    }

    /// Anchors a clock at an explicit pair of instants.
    pub fn anchored(wall_anchor: DateTime<Utc>, mono_anchor: Instant) -> Self {
        Self {
            wall_anchor,
            mono_anchor,
        }
    }

    /// Projects `instant` onto the wall clock.
    pub fn timestamp_at(&self, instant: Instant) -> DateTime<Utc> {
        let elapsed = instant.saturating_duration_since(self.mono_anchor);
        TimeDelta::from_std(elapsed)
            .ok()
            .and_then(|delta| self.wall_anchor.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Queries the current resource usage of a process.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// A short, descriptive name for the provider (e.g., "ps", "sysinfo").
    fn name(&self) -> &str;

    /// Returns the metrics table for `pid`.
    ///
    /// # Returns
    /// * `Ok("")` if the process does not exist (or no longer exists)
    /// * `Ok(table)` with a header line followed by `%cpu %mem rss vsz`
    /// * `Err` if the provider itself could not be invoked
    async fn query(&self, pid: u32) -> Result<String, ProviderError>;
}

/// Renders a record sequence into a report document.
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Writes a report for `records` to `destination`.
    ///
    /// Any error returned here is fatal to the run.
    async fn export(&self, destination: &Path, records: &[Record]) -> Result<(), ExportError>;
}

/// The operator-facing sink for per-tick status lines.
pub trait Console: Send + Sync {
    fn status(&self, line: &str);
}
