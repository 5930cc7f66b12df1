use chrono::Utc;
use serde_json::Value;

use crate::types::{Row, SinkRecord};

/// Name of the metadata field holding the source topic.
pub const KAFKA_DATA_TOPIC_FIELD_NAME: &str = "topic";
/// Name of the metadata field holding the source partition.
pub const KAFKA_DATA_PARTITION_FIELD_NAME: &str = "partition";
/// Name of the metadata field holding the record offset.
pub const KAFKA_DATA_OFFSET_FIELD_NAME: &str = "offset";
/// Name of the metadata field holding the time the row was built.
pub const KAFKA_DATA_INSERT_TIME_FIELD_NAME: &str = "insertTime";

/// Builds the provenance map attached to rows under the configured metadata field.
///
/// `insertTime` is the wall-clock time in fractional seconds since the Unix epoch.
pub fn build_kafka_data_record(record: &SinkRecord) -> Row {
    let insert_time = Utc::now().timestamp_millis() as f64 / 1000.0;

    let mut kafka_data = Row::new();
    kafka_data.insert(
        KAFKA_DATA_TOPIC_FIELD_NAME.to_string(),
        Value::String(record.topic.clone()),
    );
    kafka_data.insert(
        KAFKA_DATA_PARTITION_FIELD_NAME.to_string(),
        Value::from(record.partition),
    );
    kafka_data.insert(
        KAFKA_DATA_OFFSET_FIELD_NAME.to_string(),
        Value::from(record.offset),
    );
    kafka_data.insert(
        KAFKA_DATA_INSERT_TIME_FIELD_NAME.to_string(),
        Value::from(insert_time),
    );

    kafka_data
}
