//! The tick-driven sampling loop.
//!
//! Every tick the sampler queries its provider for the target pid, parses the
//! table, appends one record and prints one status line. It stops on its own
//! once the provider reports that the process is gone, or when the shutdown
//! signal is observed between ticks. A provider query already in flight is
//! always allowed to finish.

use crate::{
    core::{Console, MetricsProvider, Record, SampleClock},
    formatting::format_status_line,
    internal_metrics::Metrics,
    parsing::parse_table,
    records::RecordBuffer,
};
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

/// Why the sampling loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerExit {
    /// The provider returned no data: the process has exited, or the provider
    /// could not be invoked. The two are not told apart.
    ProcessExited,
    /// The shutdown signal was observed between ticks.
    Shutdown,
}

/// The outcome of a single tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Recorded(Record),
    ProcessGone,
}

pub struct Sampler {
    pid: u32,
    tick: Duration,
    provider: Arc<dyn MetricsProvider>,
    records: RecordBuffer,
    console: Arc<dyn Console>,
    metrics: Arc<Metrics>,
    clock: SampleClock,
}

impl Sampler {
    pub fn new(
        pid: u32,
        tick: Duration,
        provider: Arc<dyn MetricsProvider>,
        records: RecordBuffer,
        console: Arc<dyn Console>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            pid,
            tick,
            provider,
            records,
            console,
            metrics,
            clock: SampleClock::start(),
        }
    }

    /// Replaces the clock used to timestamp records.
    pub fn with_clock(mut self, clock: SampleClock) -> Self {
        self.clock = clock;
        self
    }

    /// Runs the sampling loop until the process exits or shutdown is signalled.
    ///
    /// The first tick fires one interval after the loop starts. Ticks missed
    /// while a query was running are skipped rather than replayed.
    #[instrument(skip_all, fields(pid = self.pid, provider = self.provider.name()))]
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> SamplerExit {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.tick, self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(tick = ?self.tick, "Sampler started.");

        loop {
            let fired_at = tokio::select! {
                biased;
                res = shutdown_rx.changed() => {
                    if res.is_err() || *shutdown_rx.borrow() {
                        info!(records = self.records.len(), "Sampler received shutdown signal.");
                        return SamplerExit::Shutdown;
                    }
                    continue;
                }
                fired_at = ticker.tick() => fired_at,
            };

            match self.sample_once(fired_at).await {
                TickOutcome::Recorded(_) => {}
                TickOutcome::ProcessGone => {
                    info!(records = self.records.len(), "Monitored process has exited. Sampler finished.");
                    return SamplerExit::ProcessExited;
                }
            }
        }
    }

    /// Performs one tick: query, parse, append, report.
    pub async fn sample_once(&self, fired_at: Instant) -> TickOutcome {
        let started = std::time::Instant::now();
        let result = self.provider.query(self.pid).await;
        self.metrics
            .provider_query_duration_seconds
            .record(started.elapsed().as_secs_f64());

        let payload = match result {
            Ok(payload) => payload,
            Err(e) => {
                self.metrics.provider_failures_total.increment(1);
                warn!(error = %e, "Metrics provider failed; treating the process as exited.");
                return TickOutcome::ProcessGone;
            }
        };

        let Some(parsed) = parse_table(&payload) else {
            debug!("Metrics provider returned no data line.");
            return TickOutcome::ProcessGone;
        };

        if !parsed.is_clean() {
            self.metrics
                .field_parse_failures_total
                .increment(parsed.degraded.len() as u64);
            warn!(
                columns = ?parsed.degraded,
                "Unparseable metrics recorded as zero."
            );
        }

        let record = Record::new(self.clock.timestamp_at(fired_at), parsed.sample);
        let len = self.records.append(record);
        self.metrics.samples_recorded_total.increment(1);
        self.metrics.records_buffered.set(len as f64);

        self.console.status(&format_status_line(&record));
        TickOutcome::Recorded(record)
    }
}
