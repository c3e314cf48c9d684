//! # In-process metrics provider
//!
//! `SysinfoProvider` reads the target's CPU and memory usage through the
//! `sysinfo` crate instead of spawning `ps` on every tick. It renders its
//! answer as the same two-line table `ps` prints, so the sampler parses both
//! providers the same way.
//!
//! CPU usage is computed from the difference between two refreshes, so the
//! first query for a pid always reports `0.0`.

use super::{ProviderError, TABLE_HEADER};
use crate::core::MetricsProvider;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use sysinfo::{Pid, System};
use tracing::trace;

/// A provider that queries the process table directly.
///
/// Refreshing reads `/proc` (or the platform equivalent) synchronously, so
/// each query runs on the blocking pool.
pub struct SysinfoProvider {
    system: Arc<Mutex<System>>,
}

impl SysinfoProvider {
    /// Creates a new `SysinfoProvider`.
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        Self {
            system: Arc::new(Mutex::new(system)),
        }
    }
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricsProvider for SysinfoProvider {
    fn name(&self) -> &str {
        "sysinfo"
    }

    async fn query(&self, pid: u32) -> Result<String, ProviderError> {
        let system = self.system.clone();
        let table = tokio::task::spawn_blocking(move || render_table(&mut system.lock(), pid)).await?;
        Ok(table)
    }
}

/// Refreshes `pid` and renders it as a `ps`-style table, or `""` if the
/// process is not in the process table.
fn render_table(system: &mut System, pid: u32) -> String {
    let pid = Pid::from_u32(pid);

    system.refresh_cpu();
    // `refresh_process` returns false if the process is not found.
    if !system.refresh_process(pid) {
        trace!(%pid, "process not found in the process table");
        return String::new();
    }
    let Some(process) = system.process(pid) else {
        return String::new();
    };

    let total_memory = system.total_memory();
    let mem_percent = if total_memory > 0 {
        process.memory() as f64 / total_memory as f64 * 100.0
    } else {
        0.0
    };

    format!(
        "{}\n{:5.1} {:4.1} {:5} {:6}\n",
        TABLE_HEADER,
        process.cpu_usage(),
        mem_percent,
        process.memory() / 1024,
        process.virtual_memory() / 1024,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse_table;

    #[tokio::test]
    async fn test_queries_own_process() {
        let provider = SysinfoProvider::new();
        let payload = provider.query(std::process::id()).await.unwrap();
        let parsed = parse_table(&payload).expect("our own process is running");

        assert!(parsed.is_clean(), "degraded columns: {:?}", parsed.degraded);
        assert!(parsed.sample.rss_kib > 0);
        assert!(parsed.sample.vsz_kib >= parsed.sample.rss_kib);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_query_does_not_block_the_runtime() {
        let provider = Arc::new(SysinfoProvider::new());
        let ticker = tokio::spawn(async {
            tokio::task::yield_now().await;
        });

        let pid = std::process::id();
        let (payload, ticked) = tokio::join!(provider.query(pid), ticker);
        assert!(ticked.is_ok());
        assert!(parse_table(&payload.unwrap()).is_some());
    }

    #[test]
    fn test_render_table_matches_ps_layout() {
        let mut system = System::new();
        system.refresh_memory();
        let table = render_table(&mut system, std::process::id());
        let mut lines = table.lines();
        assert_eq!(lines.next(), Some(TABLE_HEADER));
        assert_eq!(lines.next().map(|l| l.split_whitespace().count()), Some(4));
        assert_eq!(lines.next(), None);
    }

    #[tokio::test]
    async fn test_unknown_pid_yields_empty_output() {
        let provider = SysinfoProvider::new();
        // Above any kernel's pid_max.
        assert_eq!(provider.query(u32::MAX - 1).await.unwrap(), "");
    }
}
