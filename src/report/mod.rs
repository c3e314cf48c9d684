//! HTML report rendering.
//!
//! The report is a single self-contained page: the samples are embedded as a
//! JSON array of `[epoch_ms, cpu, mem, rss, vsz]` rows and drawn by Google
//! Charts as four line charts over a shared time axis.

pub mod viewer;

pub use viewer::{SystemViewer, Viewer};

use crate::core::{ExportRow, Exporter, Record};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

const TEMPLATE: &str = include_str!("template.html");

/// Errors that abort an export. All of them are fatal to the run.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to create report file {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),
    #[error("failed to write report file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Renders the report document for `records`.
pub fn render_report(title: &str, records: &[Record]) -> Result<String, serde_json::Error> {
    let rows: Vec<ExportRow> = records.iter().map(Record::export_row).collect();
    let rows = serde_json::to_string(&rows)?;
    Ok(TEMPLATE
        .replace("{{ROWS}}", &rows)
        .replace("{{TITLE}}", &escape_html(title)))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Writes the report as an HTML file and then, optionally, opens it.
pub struct HtmlExporter {
    title: String,
    viewer: Option<Arc<dyn Viewer>>,
}

impl HtmlExporter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            viewer: None,
        }
    }

    /// Opens every written report with `viewer`.
    pub fn with_viewer(mut self, viewer: Arc<dyn Viewer>) -> Self {
        self.viewer = Some(viewer);
        self
    }
}

#[async_trait]
impl Exporter for HtmlExporter {
    async fn export(&self, destination: &Path, records: &[Record]) -> Result<(), ExportError> {
        let write_error = |source| ExportError::Write {
            path: destination.to_path_buf(),
            source,
        };

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|source| ExportError::Create {
                path: destination.to_path_buf(),
                source,
            })?;
        let document = render_report(&self.title, records)?;
        file.write_all(document.as_bytes()).await.map_err(write_error)?;
        file.flush().await.map_err(write_error)?;
        info!(path = %destination.display(), rows = records.len(), "Report written.");

        if let Some(viewer) = &self.viewer {
            // Opening the report is a convenience; failing to do so is ignored.
            if let Err(e) = viewer.open(destination).await {
                debug!(path = %destination.display(), error = %e, "Could not open report.");
            }
        }
        Ok(())
    }
}
