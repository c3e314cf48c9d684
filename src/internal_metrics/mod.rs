//! # Internal Metrics Module
//!
//! Self-telemetry for the sampler, recorded through the `metrics` facade.
//!
//! ## Components:
//!
//! - **`Metrics`**: A lightweight, cloneable struct holding the handles the
//!   rest of the application updates.
//!
//! - **`LoggingRecorder`**: (Defined in `logging_recorder.rs`) A recorder
//!   that periodically writes every counter and gauge to the log. It is only
//!   installed when `metrics.log_metrics` is enabled; otherwise the handles
//!   are no-ops.

pub mod logging_recorder;

pub use logging_recorder::LoggingRecorder;

use metrics::{Counter, Gauge, Histogram, Unit};

/// The public API for the metrics system.
#[derive(Clone)]
pub struct Metrics {
    pub samples_recorded_total: Counter,
    pub field_parse_failures_total: Counter,
    pub provider_failures_total: Counter,
    pub records_buffered: Gauge,
    pub provider_query_duration_seconds: Histogram,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// Creates a new `Metrics` instance and registers descriptions for all
    /// supported metrics with the global recorder.
    pub fn new() -> Self {
        metrics::describe_counter!("samples_recorded_total", Unit::Count, "Total number of ticks that produced a record.");
        metrics::describe_counter!("field_parse_failures_total", Unit::Count, "Total number of provider fields that failed to parse and were recorded as zero.");
        metrics::describe_counter!("provider_failures_total", Unit::Count, "Total number of provider invocations that failed outright.");
        metrics::describe_gauge!("records_buffered", Unit::Count, "The number of records held in memory.");
        metrics::describe_histogram!("provider_query_duration_seconds", Unit::Seconds, "The time taken by one provider query.");

        Self {
            samples_recorded_total: metrics::counter!("samples_recorded_total"),
            field_parse_failures_total: metrics::counter!("field_parse_failures_total"),
            provider_failures_total: metrics::counter!("provider_failures_total"),
            records_buffered: metrics::gauge!("records_buffered"),
            provider_query_duration_seconds: metrics::histogram!("provider_query_duration_seconds"),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
