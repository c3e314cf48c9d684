#![allow(dead_code)]
//! Fakes for the collaborators the sampler talks to.

use async_trait::async_trait;
use parking_lot::Mutex;
use procplot::{
    core::{Console, Exporter, MetricsProvider, Record},
    provider::ProviderError,
    report::ExportError,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const HEADER: &str = " %CPU %MEM   RSS    VSZ";

/// Builds a provider payload for one data line.
pub fn table(line: &str) -> String {
    format!("{}\n{}\n", HEADER, line)
}

/// What a `ScriptedProvider` does once its script runs out.
#[derive(Debug, Clone)]
pub enum Exhausted {
    /// Keep returning this payload.
    Repeat(String),
    /// Return empty output, i.e. the process has exited.
    Exit,
    /// Never answer.
    Hang,
}

/// A provider that replays a fixed list of payloads.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<String>>,
    exhausted: Exhausted,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(script: Vec<String>, exhausted: Exhausted) -> Self {
        Self {
            script: Mutex::new(script.into()),
            exhausted,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always returns `payload`.
    pub fn repeating(payload: String) -> Self {
        Self::new(vec![], Exhausted::Repeat(payload))
    }

    /// Makes every query take `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn query(&self, _pid: u32) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().pop_front();
        match next {
            Some(payload) => Ok(payload),
            None => match &self.exhausted {
                Exhausted::Repeat(payload) => Ok(payload.clone()),
                Exhausted::Exit => Ok(String::new()),
                Exhausted::Hang => std::future::pending().await,
            },
        }
    }
}

/// A console that keeps every status line.
#[derive(Default)]
pub struct CapturingConsole {
    lines: Mutex<Vec<String>>,
}

impl CapturingConsole {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl Console for CapturingConsole {
    fn status(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}

/// An exporter that remembers what it was asked to export.
#[derive(Default)]
pub struct RecordingExporter {
    exports: Mutex<Vec<(PathBuf, Vec<Record>)>>,
}

impl RecordingExporter {
    pub fn exports(&self) -> Vec<(PathBuf, Vec<Record>)> {
        self.exports.lock().clone()
    }
}

#[async_trait]
impl Exporter for RecordingExporter {
    async fn export(&self, destination: &Path, records: &[Record]) -> Result<(), ExportError> {
        self.exports
            .lock()
            .push((destination.to_path_buf(), records.to_vec()));
        Ok(())
    }
}

/// Extracts the embedded rows from a rendered report.
pub fn report_rows(document: &str) -> Vec<(i64, f64, f64, u64, u64)> {
    let start = document.find("var rows = ").expect("rows are embedded") + "var rows = ".len();
    let end = start + document[start..].find(";\n").expect("rows are terminated");
    serde_json::from_str(&document[start..end]).expect("rows are valid JSON")
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
