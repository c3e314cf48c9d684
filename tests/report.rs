//! Writing and opening HTML reports.

mod helpers;

use async_trait::async_trait;
use chrono::{TimeDelta, TimeZone, Utc};
use helpers::report_rows;
use parking_lot::Mutex;
use procplot::core::{Exporter, Record, Sample};
use procplot::report::{HtmlExporter, Viewer};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Default)]
struct RecordingViewer {
    opened: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl Viewer for RecordingViewer {
    async fn open(&self, path: &Path) -> io::Result<()> {
        self.opened.lock().push(path.to_path_buf());
        Ok(())
    }
}

struct FailingViewer;

#[async_trait]
impl Viewer for FailingViewer {
    async fn open(&self, _path: &Path) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::NotFound, "no viewer installed"))
    }
}

fn records(n: i64) -> Vec<Record> {
    let base = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
    (0..n)
        .map(|i| {
            Record::new(
                base + TimeDelta::seconds(i),
                Sample {
                    cpu_percent: i as f64 * 0.5,
                    mem_percent: 1.25,
                    rss_kib: 1000 + i as u64,
                    vsz_kib: 9000 + i as u64,
                },
            )
        })
        .collect()
}

#[tokio::test]
async fn test_report_embeds_every_record() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("report.html");
    let viewer = Arc::new(RecordingViewer::default());
    let records = records(25);

    HtmlExporter::new("procplot: pid 1")
        .with_viewer(viewer.clone())
        .export(&destination, &records)
        .await
        .unwrap();

    let document = std::fs::read_to_string(&destination).unwrap();
    assert!(document.contains("<title>procplot: pid 1</title>"));
    for id in ["cpu_chart", "mem_chart", "rss_chart", "vsz_chart"] {
        assert!(document.contains(&format!("id=\"{}\"", id)), "missing {}", id);
    }

    let rows = report_rows(&document);
    assert_eq!(rows.len(), records.len());
    for (row, record) in rows.iter().zip(&records) {
        assert_eq!(
            *row,
            (
                record.epoch_millis(),
                record.cpu_percent,
                record.mem_percent,
                record.rss_kib,
                record.vsz_kib
            )
        );
    }

    assert_eq!(*viewer.opened.lock(), vec![destination]);
}

#[tokio::test]
async fn test_viewer_failure_does_not_fail_export() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("report.html");

    let result = HtmlExporter::new("procplot")
        .with_viewer(Arc::new(FailingViewer))
        .export(&destination, &records(3))
        .await;

    assert!(result.is_ok());
    assert_eq!(report_rows(&std::fs::read_to_string(&destination).unwrap()).len(), 3);
}

#[tokio::test]
async fn test_existing_report_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("report.html");
    std::fs::write(&destination, "x".repeat(100_000)).unwrap();

    HtmlExporter::new("procplot")
        .export(&destination, &records(1))
        .await
        .unwrap();

    let document = std::fs::read_to_string(&destination).unwrap();
    assert!(document.starts_with("<!DOCTYPE html>"));
    assert_eq!(report_rows(&document).len(), 1);
}
