//! A metrics recorder that periodically logs all captured metrics.

use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use metrics_util::registry::{AtomicStorage, Registry};
use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// A metrics recorder that logs every counter, gauge and histogram to
/// `tracing::info!` at a fixed interval, and once more at shutdown.
#[derive(Clone)]
pub struct LoggingRecorder {
    registry: Arc<Registry<Key, AtomicStorage>>,
}

impl LoggingRecorder {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::new(AtomicStorage)),
        }
    }

    /// Returns the reporting loop. It should be spawned as a background task
    /// after the recorder has been installed.
    pub fn reporter(
        &self,
        interval: Duration,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> impl Future<Output = ()> + Send + 'static {
        let registry = self.registry.clone();
        async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        log_snapshot(&registry, "final");
                        break;
                    }
                    _ = ticker.tick() => {
                        log_snapshot(&registry, "periodic");
                    }
                }
            }
        }
    }

    /// Renders one line per registered metric, sorted by name.
    pub fn snapshot_lines(&self) -> Vec<String> {
        snapshot_lines(&self.registry)
    }
}

impl Default for LoggingRecorder {
    fn default() -> Self {
        Self::new()
    }
}

fn log_snapshot(registry: &Registry<Key, AtomicStorage>, kind: &str) {
    info!("--- Metrics Snapshot ({}) ---", kind);
    for line in snapshot_lines(registry) {
        info!("{}", line);
    }
}

fn snapshot_lines(registry: &Registry<Key, AtomicStorage>) -> Vec<String> {
    let mut lines = Vec::new();

    for (key, counter) in registry.get_counter_handles() {
        lines.push(format!("[Counter] {}: {}", key.name(), counter.load(Ordering::Relaxed)));
    }
    for (key, gauge) in registry.get_gauge_handles() {
        let value = f64::from_bits(gauge.load(Ordering::Relaxed));
        lines.push(format!("[Gauge] {}: {}", key.name(), value));
    }
    for (key, histogram) in registry.get_histogram_handles() {
        let values = histogram.data();
        if values.is_empty() {
            continue;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        lines.push(format!(
            "[Histogram] {}: count={} mean={:.6}",
            key.name(),
            values.len(),
            mean
        ));
    }

    lines.sort();
    lines
}

impl Recorder for LoggingRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        self.registry.get_or_create_counter(key, |c| c.clone()).into()
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        self.registry.get_or_create_gauge(key, |g| g.clone()).into()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        self.registry.get_or_create_histogram(key, |h| h.clone()).into()
    }
}
