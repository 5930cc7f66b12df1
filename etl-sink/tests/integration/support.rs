use std::sync::{Arc, Mutex};

use etl_sink::merge::MergeFlush;
use etl_sink::types::{SinkRecord, TableId, TimestampType};
use serde_json::Value;

/// Creates a record without timestamp.
pub fn record(
    topic: &str,
    partition: i32,
    offset: i64,
    key: Option<Value>,
    value: Option<Value>,
) -> SinkRecord {
    SinkRecord {
        topic: topic.to_string(),
        partition,
        offset,
        key,
        value,
        timestamp: None,
        timestamp_type: TimestampType::NoTimestampType,
    }
}

/// Merge trigger collecting every request.
#[derive(Debug, Clone, Default)]
pub struct CollectingMergeFlush {
    requests: Arc<Mutex<Vec<TableId>>>,
}

impl CollectingMergeFlush {
    pub fn requests(&self) -> Vec<TableId> {
        self.requests.lock().unwrap().clone()
    }
}

impl MergeFlush for CollectingMergeFlush {
    fn merge_flush(&self, table_id: &TableId) {
        self.requests.lock().unwrap().push(table_id.clone());
    }
}
