use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::bail;
use crate::error::{ErrorKind, SinkResult};
use crate::merge::{MergeBatches, MergeFlush};
use crate::types::{SinkRecord, TableId};

/// [`MergeFlush`] recording every merge flush request, in order.
///
/// Clones share the recorded requests.
#[derive(Debug, Clone, Default)]
pub struct RecordingMergeFlush {
    requests: Arc<Mutex<Vec<TableId>>>,
}

impl RecordingMergeFlush {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tables for which a merge flush was requested so far.
    pub fn requests(&self) -> Vec<TableId> {
        self.requests.lock().unwrap().clone()
    }
}

impl MergeFlush for RecordingMergeFlush {
    fn merge_flush(&self, table_id: &TableId) {
        self.requests.lock().unwrap().push(table_id.clone());
    }
}

/// [`MergeBatches`] returning a scripted sequence of batch sizes.
///
/// Every registration consumes the next size, whatever the destination. Registering more records
/// than sizes were scripted fails with [`ErrorKind::InvalidState`].
#[derive(Debug, Clone, Default)]
pub struct SequenceMergeBatches {
    sizes: Arc<Mutex<VecDeque<u64>>>,
}

impl SequenceMergeBatches {
    pub fn new(sizes: impl IntoIterator<Item = u64>) -> Self {
        Self {
            sizes: Arc::new(Mutex::new(sizes.into_iter().collect())),
        }
    }
}

impl MergeBatches for SequenceMergeBatches {
    fn add_to_batch(&self, record: &SinkRecord, table_id: &TableId) -> SinkResult<u64> {
        let Some(size) = self.sizes.lock().unwrap().pop_front() else {
            bail!(
                ErrorKind::InvalidState,
                "No scripted batch size left",
                format!("Record {record} for table {table_id} was registered unexpectedly")
            );
        };

        Ok(size)
    }
}
