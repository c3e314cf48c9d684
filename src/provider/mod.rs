//! Process metrics providers.
//!
//! A provider answers one question per tick: what does the metrics table for
//! this pid look like right now? Two implementations exist:
//!
//! - **`PsProvider`**: runs the system `ps` command.
//! - **`SysinfoProvider`**: queries the process table in-process through the
//!   `sysinfo` crate and renders the same table `ps` would.

pub mod ps;
pub mod system;

pub use ps::PsProvider;
pub use system::SysinfoProvider;

use crate::core::MetricsProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised when a provider cannot be invoked at all.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("process table query did not complete: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}

/// The provider selected in the configuration.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ps,
    Sysinfo,
}

impl ProviderKind {
    /// Instantiates the provider.
    pub fn build(self) -> Arc<dyn MetricsProvider> {
        match self {
            ProviderKind::Ps => Arc::new(PsProvider::new()),
            ProviderKind::Sysinfo => Arc::new(SysinfoProvider::new()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ps => "ps",
            ProviderKind::Sysinfo => "sysinfo",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The header line both providers emit.
pub(crate) const TABLE_HEADER: &str = " %CPU %MEM   RSS    VSZ";
