//! The termination protocol.
//!
//! A run is `Running` until either the sampler stops on its own or a
//! termination signal arrives. Both paths end in exactly one `Terminating`
//! value that carries the reason and, when a report is due, the snapshot to
//! export. `ExportCoordinator::finish` performs the export; the process exit
//! itself is left to `main`.

use crate::core::{Exporter, Record};
use crate::records::RecordBuffer;
use crate::report::ExportError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Why the run is ending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The monitored process went away (or could no longer be queried).
    ProcessExited,
    /// The operator interrupted the run.
    Signal,
}

/// The state entered once the run stops sampling.
#[derive(Debug)]
pub struct Terminating {
    pub reason: TerminationReason,
    pub records: usize,
    /// Present only when a report must be written.
    pub snapshot: Option<Vec<Record>>,
}

/// The outcome of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Termination {
    pub reason: TerminationReason,
    /// How many records were collected.
    pub records: usize,
    /// The report that was written, if any.
    pub report: Option<PathBuf>,
}

/// Decides how a run ends and writes the report when one is due.
pub struct ExportCoordinator {
    destination: Option<PathBuf>,
    exporter: Arc<dyn Exporter>,
}

impl ExportCoordinator {
    pub fn new(destination: Option<PathBuf>, exporter: Arc<dyn Exporter>) -> Self {
        Self {
            destination,
            exporter,
        }
    }

    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    /// Whether a signal should wait for the sampler before terminating.
    pub fn exports_on_signal(&self) -> bool {
        self.destination.is_some()
    }

    /// Enters the terminating state, snapshotting the records if a report is
    /// due. Only an interrupt with a configured destination exports.
    pub fn begin(&self, reason: TerminationReason, records: &RecordBuffer) -> Terminating {
        let snapshot = match (reason, &self.destination) {
            (TerminationReason::Signal, Some(_)) => Some(records.snapshot()),
            _ => None,
        };
        Terminating {
            reason,
            records: snapshot.as_ref().map_or_else(|| records.len(), Vec::len),
            snapshot,
        }
    }

    /// Completes termination. Export errors are fatal and returned as-is.
    pub async fn finish(&self, terminating: Terminating) -> Result<Termination, ExportError> {
        let Terminating {
            reason,
            records,
            snapshot,
        } = terminating;

        let report = match (snapshot, &self.destination) {
            (Some(snapshot), Some(destination)) => {
                info!(path = %destination.display(), records, "Exporting report...");
                self.exporter.export(destination, &snapshot).await?;
                Some(destination.clone())
            }
            _ => None,
        };

        Ok(Termination {
            reason,
            records,
            report,
        })
    }
}
