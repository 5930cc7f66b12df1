use chrono::Utc;
use etl_sink::conversions::{JsonRecordConverter, RecordConverter, RecordType};
use etl_sink::error::{ErrorKind, SinkResult};
use etl_sink::merge::{IntermediateField, MemoryMergeBatches};
use etl_sink::sink::{RowMode, SinkRecordConverter};
use etl_sink::types::{Row, SinkRecord, TableId, TimestampType};
use etl_sink_config::shared::SinkConfig;
use etl_sink_telemetry::init_test_tracing;
use serde_json::{Value, json};

use crate::support::{CollectingMergeFlush, record};

fn upsert_config() -> SinkConfig {
    SinkConfig {
        upsert_enabled: true,
        kafka_key_field_name: Some("kafka_key".to_string()),
        ..SinkConfig::default()
    }
}

fn stage() -> TableId {
    TableId::with_project("analytics", "stage", "orders_tmp")
}

/// Converter mapping absent values to null instead of rejecting them.
struct NullOnAbsentConverter;

impl RecordConverter for NullOnAbsentConverter {
    fn convert_record(
        &self,
        record: &SinkRecord,
        record_type: RecordType,
    ) -> SinkResult<Option<Row>> {
        if record_type == RecordType::Value && record.value.is_none() {
            return Ok(None);
        }

        JsonRecordConverter::new().convert_record(record, record_type)
    }
}

#[test]
fn staged_entries_hold_the_reserved_fields_only() {
    init_test_tracing();

    let batches = MemoryMergeBatches::new();
    let converter = SinkRecordConverter::new(
        &SinkConfig {
            delete_enabled: true,
            kafka_data_field_name: Some("kafka_data".to_string()),
            ..upsert_config()
        },
        JsonRecordConverter::new(),
        batches.clone(),
        CollectingMergeFlush::default(),
    );
    assert_eq!(converter.mode(), RowMode::UpsertDelete);

    let upsert = record("orders", 0, 1, Some(json!({ "id": 1 })), Some(json!({ "id": 1 })));
    let delete = record("orders", 0, 2, Some(json!({ "id": 1 })), None);

    let upsert_row = converter.get_record_row(&upsert, &stage()).unwrap();
    let delete_row = converter.get_record_row(&delete, &stage()).unwrap();

    for row in [&upsert_row, &delete_row] {
        let fields: Vec<&str> = row.content().keys().map(String::as_str).collect();
        let reserved: Vec<&str> = IntermediateField::ALL
            .iter()
            .map(IntermediateField::as_str)
            .collect();
        assert_eq!(fields, reserved);
        assert_eq!(row.content()["key"], json!({ "id": 1 }));
    }

    assert_eq!(upsert_row.content()["value"]["id"], json!(1));
    assert!(upsert_row.content()["value"]["kafka_data"].is_object());
    assert_eq!(upsert_row.content()["i"], json!(1));

    assert_eq!(delete_row.content()["value"], Value::Null);
    assert_eq!(delete_row.content()["i"], json!(2));
    assert_eq!(delete_row.id(), "orders-0-2");

    assert_eq!(batches.current_batch_size(&stage()).unwrap(), 2);
}

#[test]
fn absent_value_without_delete_support_follows_converter_policy() {
    init_test_tracing();

    let tombstone = record("orders", 0, 1, Some(json!({ "id": 1 })), None);

    // The JSON converter rejects absent values.
    let batches = MemoryMergeBatches::new();
    let converter = SinkRecordConverter::new(
        &upsert_config(),
        JsonRecordConverter::new(),
        batches.clone(),
        CollectingMergeFlush::default(),
    );
    let err = converter.get_record_row(&tombstone, &stage()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConversionError);
    assert_eq!(batches.current_batch_size(&stage()).unwrap(), 0);

    // A converter mapping absence to null stages an entry with a null value.
    let converter = SinkRecordConverter::new(
        &upsert_config(),
        NullOnAbsentConverter,
        MemoryMergeBatches::new(),
        CollectingMergeFlush::default(),
    );
    let row = converter.get_record_row(&tombstone, &stage()).unwrap();
    assert_eq!(row.content()["value"], Value::Null);
}

#[test]
fn null_key_aborts_the_record() {
    init_test_tracing();

    let batches = MemoryMergeBatches::new();
    let flush = CollectingMergeFlush::default();
    let converter = SinkRecordConverter::new(
        &SinkConfig {
            merge_records_threshold: 1,
            ..upsert_config()
        },
        JsonRecordConverter::new(),
        batches.clone(),
        flush.clone(),
    );

    for key in [None, Some(Value::Null)] {
        let keyless = record("orders", 0, 1, key, Some(json!({ "id": 1 })));
        let err = converter.get_record_row(&keyless, &stage()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NullRecordKey);
        assert!(err.kind().is_fatal_record_error());
    }

    assert_eq!(batches.current_batch_size(&stage()).unwrap(), 0);
    assert!(flush.requests().is_empty());
}

#[test]
fn partition_time_follows_partitioning_configuration() {
    init_test_tracing();

    let mut timestamped = record("orders", 0, 1, Some(json!({ "id": 1 })), Some(json!({})));
    timestamped.timestamp = Some(1_717_171_717_171);
    timestamped.timestamp_type = TimestampType::LogAppendTime;

    let message_time = SinkRecordConverter::new(
        &SinkConfig {
            bigquery_message_time_partitioning: true,
            ..upsert_config()
        },
        JsonRecordConverter::new(),
        MemoryMergeBatches::new(),
        CollectingMergeFlush::default(),
    );
    let row = message_time.get_record_row(&timestamped, &stage()).unwrap();
    assert_eq!(row.content()["partitionTime"], json!(1_717_171_717));

    let undefined = record("orders", 0, 2, Some(json!({ "id": 1 })), Some(json!({})));
    let err = message_time.get_record_row(&undefined, &stage()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UndefinedRecordTimestamp);

    let wall_clock = SinkRecordConverter::new(
        &upsert_config(),
        JsonRecordConverter::new(),
        MemoryMergeBatches::new(),
        CollectingMergeFlush::default(),
    );
    let before = Utc::now().timestamp();
    let row = wall_clock.get_record_row(&timestamped, &stage()).unwrap();
    let after = Utc::now().timestamp();

    let partition_time = row.content()["partitionTime"].as_i64().unwrap();
    assert!(before <= partition_time && partition_time <= after);
}
