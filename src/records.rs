//! The in-memory record sequence shared between the sampler and the export
//! path.

use crate::core::Record;
use parking_lot::Mutex;
use std::sync::Arc;

/// An append-only, time-ordered sequence of records.
///
/// The sampler is the only writer. Readers take a full snapshot under the
/// same lock, so they never observe a half-appended record or a length that
/// disagrees with the contents.
#[derive(Clone, Debug, Default)]
pub struct RecordBuffer {
    inner: Arc<Mutex<Vec<Record>>>,
}

impl RecordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record and returns the new length.
    pub fn append(&self, record: Record) -> usize {
        let mut records = self.inner.lock();
        debug_assert!(
            records
                .last()
                .map_or(true, |last| last.timestamp < record.timestamp),
            "record timestamps must be strictly increasing"
        );
        records.push(record);
        records.len()
    }

    /// Returns a copy of every record appended so far.
    pub fn snapshot(&self) -> Vec<Record> {
        self.inner.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
