use etl_sink::conversions::JsonRecordConverter;
use etl_sink::merge::MemoryMergeBatches;
use etl_sink::sink::{RowMode, SinkRecordConverter};
use etl_sink::types::{TableId, row_id};
use etl_sink_config::shared::SinkConfig;
use etl_sink_telemetry::init_test_tracing;
use serde_json::{Value, json};

use crate::support::{CollectingMergeFlush, record};

fn converter(
    config: &SinkConfig,
) -> SinkRecordConverter<JsonRecordConverter, MemoryMergeBatches, CollectingMergeFlush> {
    SinkRecordConverter::new(
        config,
        JsonRecordConverter::new(),
        MemoryMergeBatches::new(),
        CollectingMergeFlush::default(),
    )
}

#[test]
fn row_id_is_dash_joined_coordinates() {
    init_test_tracing();

    let converter = converter(&SinkConfig::default());
    let record = record("orders", 2, 57, None, Some(json!({ "id": 7 })));
    let table_id = TableId::new("sales", "orders");

    let first = converter.get_record_row(&record, &table_id).unwrap();
    let replayed = converter.get_record_row(&record, &table_id).unwrap();

    assert_eq!(first.id(), "orders-2-57");
    assert_eq!(first.id(), replayed.id());
    assert_ne!(row_id("orders", 2, 57), row_id("orders", 2, 58));
}

#[test]
fn regular_row_holds_value_fields_and_configured_side_fields() {
    init_test_tracing();

    let value = json!({ "id": 7, "amount": 12.5, "tags": ["a", "b"], "note": null });
    let table_id = TableId::new("sales", "orders");

    let bare = converter(&SinkConfig::default());
    let row = bare
        .get_record_row(
            &record("orders", 0, 1, Some(json!({ "id": 7 })), Some(value.clone())),
            &table_id,
        )
        .unwrap();
    assert_eq!(bare.mode(), RowMode::Regular);
    assert_eq!(Value::Object(row.content().clone()), value);

    let with_side_fields = converter(&SinkConfig {
        kafka_data_field_name: Some("kafka_data".to_string()),
        kafka_key_field_name: Some("kafka_key".to_string()),
        ..SinkConfig::default()
    });
    let row = with_side_fields
        .get_record_row(
            &record("orders", 0, 1, Some(json!({ "id": 7 })), Some(value.clone())),
            &table_id,
        )
        .unwrap();

    let content = row.content();
    for (field, expected) in value.as_object().unwrap() {
        assert_eq!(&content[field], expected);
    }
    assert_eq!(content.len(), 6);
    assert_eq!(content["kafka_key"], json!({ "id": 7 }));

    let kafka_data = content["kafka_data"].as_object().unwrap();
    assert_eq!(kafka_data["topic"], json!("orders"));
    assert_eq!(kafka_data["partition"], json!(0));
    assert_eq!(kafka_data["offset"], json!(1));
    assert!(kafka_data["insertTime"].is_f64());
}

#[test]
fn only_listed_map_fields_are_stringified() {
    init_test_tracing();

    let converter = converter(&SinkConfig {
        convert_map_fields_to_string: vec![
            "orders:attributes".to_string(),
            "orders:status".to_string(),
        ],
        ..SinkConfig::default()
    });
    let value = json!({
        "attributes": { "color": "red", "size": { "eu": 42 } },
        "dimensions": { "width": 3 },
        "status": "shipped",
    });

    let row = converter
        .get_record_row(
            &record("orders", 0, 1, None, Some(value)),
            &TableId::new("sales", "orders"),
        )
        .unwrap();

    assert_eq!(
        row.content()["attributes"],
        json!("{\"color\":\"red\",\"size\":{\"eu\":42}}")
    );
    assert_eq!(row.content()["dimensions"], json!({ "width": 3 }));
    assert_eq!(row.content()["status"], json!("shipped"));

    // The same field name on another topic is not listed.
    let row = converter
        .get_record_row(
            &record("payments", 0, 1, None, Some(json!({ "attributes": { "a": 1 } }))),
            &TableId::new("sales", "payments"),
        )
        .unwrap();
    assert_eq!(row.content()["attributes"], json!({ "a": 1 }));
}

#[test]
fn sanitized_rows_serialize_as_insert_rows() {
    init_test_tracing();

    let converter = converter(&SinkConfig {
        sanitize_field_names: true,
        ..SinkConfig::default()
    });

    let row = converter
        .get_record_row(
            &record(
                "orders",
                1,
                9,
                None,
                Some(json!({ "order id": 1, "9lives": { "a.b": true } })),
            ),
            &TableId::new("sales", "orders"),
        )
        .unwrap();

    assert_eq!(
        serde_json::to_value(&row).unwrap(),
        json!({
            "insertId": "orders-1-9",
            "json": { "order_id": 1, "_9lives": { "a_b": true } }
        })
    );
}
