use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::bail;
use crate::error::{ErrorKind, SinkResult};
use crate::types::{SinkRecord, TableId};

/// Registry of the staged entries awaiting a merge, tracked per destination table.
///
/// Implementations must be safe to call concurrently for the same destination: registrations are
/// counted atomically, and the size returned for a destination strictly increases across
/// registrations until the batch is closed by the merge.
pub trait MergeBatches {
    /// Registers `record` in the current batch of `table_id` and returns the batch size including
    /// the registered record.
    fn add_to_batch(&self, record: &SinkRecord, table_id: &TableId) -> SinkResult<u64>;
}

impl<T> MergeBatches for Arc<T>
where
    T: MergeBatches + ?Sized,
{
    fn add_to_batch(&self, record: &SinkRecord, table_id: &TableId) -> SinkResult<u64> {
        (**self).add_to_batch(record, table_id)
    }
}

/// A topic partition of the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: i32,
}

/// A batch closed by [`MemoryMergeBatches::seal_batch`], ready to be merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBatch {
    /// Number of the batch, starting at 0 for each destination.
    pub batch_number: u64,
    /// Number of entries registered in the batch.
    pub size: u64,
    /// Highest offset registered per topic partition.
    pub offsets: HashMap<TopicPartition, i64>,
}

#[derive(Debug, Default)]
struct TableBatch {
    batch_number: u64,
    size: u64,
    offsets: HashMap<TopicPartition, i64>,
}

#[derive(Debug, Default)]
struct Inner {
    batches: HashMap<TableId, TableBatch>,
}

/// In-memory [`MergeBatches`] registry.
///
/// Clones share the same state, so a single registry can be handed to the record converter and to
/// the merge that seals batches. Registrations for every destination are serialized by one lock,
/// which keeps them in the order they were made.
#[derive(Debug, Clone, Default)]
pub struct MemoryMergeBatches {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryMergeBatches {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the size of the current batch of `table_id`.
    pub fn current_batch_size(&self, table_id: &TableId) -> SinkResult<u64> {
        let inner = self.lock()?;

        Ok(inner
            .batches
            .get(table_id)
            .map(|batch| batch.size)
            .unwrap_or(0))
    }

    /// Returns the number of the current batch of `table_id`.
    pub fn current_batch_number(&self, table_id: &TableId) -> SinkResult<u64> {
        let inner = self.lock()?;

        Ok(inner
            .batches
            .get(table_id)
            .map(|batch| batch.batch_number)
            .unwrap_or(0))
    }

    /// Closes the current batch of `table_id` and starts the next one.
    ///
    /// Returns [`None`] without starting a new batch when the current batch is empty.
    pub fn seal_batch(&self, table_id: &TableId) -> SinkResult<Option<SealedBatch>> {
        let mut inner = self.lock()?;

        let Some(batch) = inner.batches.get_mut(table_id) else {
            return Ok(None);
        };

        if batch.size == 0 {
            return Ok(None);
        }

        let next = TableBatch {
            batch_number: batch.batch_number + 1,
            ..TableBatch::default()
        };
        let sealed = std::mem::replace(batch, next);

        debug!(
            table = %table_id,
            batch_number = sealed.batch_number,
            size = sealed.size,
            "sealed merge batch"
        );

        Ok(Some(SealedBatch {
            batch_number: sealed.batch_number,
            size: sealed.size,
            offsets: sealed.offsets,
        }))
    }

    fn lock(&self) -> SinkResult<MutexGuard<'_, Inner>> {
        match self.inner.lock() {
            Ok(inner) => Ok(inner),
            Err(_) => bail!(
                ErrorKind::InvalidState,
                "Merge batches registry lock is poisoned"
            ),
        }
    }
}

impl MergeBatches for MemoryMergeBatches {
    fn add_to_batch(&self, record: &SinkRecord, table_id: &TableId) -> SinkResult<u64> {
        let mut inner = self.lock()?;

        let batch = inner.batches.entry(table_id.clone()).or_default();
        batch.size += 1;

        let topic_partition = TopicPartition {
            topic: record.topic.clone(),
            partition: record.partition,
        };
        batch
            .offsets
            .entry(topic_partition)
            .and_modify(|offset| *offset = (*offset).max(record.offset))
            .or_insert(record.offset);

        Ok(batch.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimestampType;
    use std::thread;

    fn record(partition: i32, offset: i64) -> SinkRecord {
        SinkRecord {
            topic: "orders".to_string(),
            partition,
            offset,
            key: None,
            value: None,
            timestamp: None,
            timestamp_type: TimestampType::NoTimestampType,
        }
    }

    #[test]
    fn sizes_increase_per_destination() {
        let batches = MemoryMergeBatches::new();
        let orders = TableId::new("stage", "orders");
        let payments = TableId::new("stage", "payments");

        assert_eq!(batches.add_to_batch(&record(0, 1), &orders).unwrap(), 1);
        assert_eq!(batches.add_to_batch(&record(0, 2), &orders).unwrap(), 2);
        assert_eq!(batches.add_to_batch(&record(0, 3), &payments).unwrap(), 1);
        assert_eq!(batches.add_to_batch(&record(0, 4), &orders).unwrap(), 3);

        assert_eq!(batches.current_batch_size(&orders).unwrap(), 3);
        assert_eq!(batches.current_batch_size(&payments).unwrap(), 1);
    }

    #[test]
    fn seal_batch_starts_next_batch() {
        let batches = MemoryMergeBatches::new();
        let orders = TableId::new("stage", "orders");

        batches.add_to_batch(&record(0, 10), &orders).unwrap();
        batches.add_to_batch(&record(1, 4), &orders).unwrap();
        batches.add_to_batch(&record(0, 11), &orders).unwrap();

        let sealed = batches.seal_batch(&orders).unwrap().unwrap();
        assert_eq!(sealed.batch_number, 0);
        assert_eq!(sealed.size, 3);
        assert_eq!(
            sealed.offsets.get(&TopicPartition {
                topic: "orders".to_string(),
                partition: 0
            }),
            Some(&11)
        );

        assert_eq!(batches.current_batch_number(&orders).unwrap(), 1);
        assert_eq!(batches.current_batch_size(&orders).unwrap(), 0);
        assert_eq!(batches.add_to_batch(&record(0, 12), &orders).unwrap(), 1);
    }

    #[test]
    fn sealing_empty_batch_is_a_no_op() {
        let batches = MemoryMergeBatches::new();
        let orders = TableId::new("stage", "orders");

        assert_eq!(batches.seal_batch(&orders).unwrap(), None);

        batches.add_to_batch(&record(0, 1), &orders).unwrap();
        batches.seal_batch(&orders).unwrap();
        assert_eq!(batches.seal_batch(&orders).unwrap(), None);
        assert_eq!(batches.current_batch_number(&orders).unwrap(), 1);
    }

    #[test]
    fn concurrent_registrations_are_counted_once() {
        let batches = MemoryMergeBatches::new();
        let orders = TableId::new("stage", "orders");

        let handles: Vec<_> = (0..8)
            .map(|partition| {
                let batches = batches.clone();
                let orders = orders.clone();
                thread::spawn(move || {
                    (0..100)
                        .map(|offset| batches.add_to_batch(&record(partition, offset), &orders))
                        .collect::<SinkResult<Vec<u64>>>()
                })
            })
            .collect();

        let mut sizes: Vec<u64> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap().unwrap())
            .collect();
        sizes.sort_unstable();

        assert_eq!(sizes, (1..=800).collect::<Vec<u64>>());
    }
}
