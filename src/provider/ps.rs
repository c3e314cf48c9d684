//! A provider backed by the system `ps` command.

use super::ProviderError;
use crate::core::MetricsProvider;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::trace;

const FORMAT: &str = "%cpu,%mem,rss,vsz";

/// Runs `ps -p <pid> -o %cpu,%mem,rss,vsz` once per query.
#[derive(Debug, Clone)]
pub struct PsProvider {
    program: String,
}

impl PsProvider {
    pub fn new() -> Self {
        Self::with_program("ps")
    }

    /// Uses `program` in place of `ps`. It must accept the same arguments.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricsProvider for PsProvider {
    fn name(&self) -> &str {
        "ps"
    }

    async fn query(&self, pid: u32) -> Result<String, ProviderError> {
        let output = Command::new(&self.program)
            .arg("-p")
            .arg(pid.to_string())
            .arg("-o")
            .arg(FORMAT)
            .output()
            .await
            .map_err(|source| ProviderError::Spawn {
                command: self.program.clone(),
                source,
            })?;

        // `ps` exits non-zero when no process matched the selection.
        if !output.status.success() {
            trace!(pid, status = ?output.status, "ps reported no matching process");
            return Ok(String::new());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
