use std::sync::Arc;
use std::thread;

use etl_sink::conversions::JsonRecordConverter;
use etl_sink::merge::{MemoryMergeBatches, MergeBatches, merge_flush_channel};
use etl_sink::sink::SinkRecordConverter;
use etl_sink::types::TableId;
use etl_sink_config::shared::SinkConfig;
use etl_sink_telemetry::init_test_tracing;
use serde_json::json;

use crate::support::{CollectingMergeFlush, record};

fn config(merge_records_threshold: i64) -> SinkConfig {
    SinkConfig {
        upsert_enabled: true,
        delete_enabled: true,
        kafka_key_field_name: Some("kafka_key".to_string()),
        merge_records_threshold,
        ..SinkConfig::default()
    }
}

#[test]
fn reaching_the_threshold_requests_exactly_one_flush() {
    init_test_tracing();

    let orders = TableId::new("stage", "orders");
    let payments = TableId::new("stage", "payments");
    let batches = MemoryMergeBatches::new();
    let flush = CollectingMergeFlush::default();

    for offset in 0..99 {
        batches
            .add_to_batch(&record("orders", 0, offset, None, None), &orders)
            .unwrap();
    }

    let converter = SinkRecordConverter::new(
        &config(100),
        JsonRecordConverter::new(),
        batches.clone(),
        flush.clone(),
    );

    let row = converter
        .get_record_row(
            &record("orders", 0, 99, Some(json!({ "id": 1 })), Some(json!({ "id": 1 }))),
            &orders,
        )
        .unwrap();
    assert_eq!(row.content()["i"], json!(100));
    assert_eq!(flush.requests(), vec![orders.clone()]);

    // Batches are counted per destination.
    converter
        .get_record_row(&record("payments", 0, 0, Some(json!({ "id": 1 })), None), &payments)
        .unwrap();
    assert_eq!(flush.requests(), vec![orders.clone()]);

    // Every further registration above the threshold requests another flush.
    converter
        .get_record_row(&record("orders", 0, 100, Some(json!({ "id": 2 })), None), &orders)
        .unwrap();
    assert_eq!(flush.requests(), vec![orders.clone(), orders.clone()]);

    // Once the merge sealed the batch, sizes start over.
    let sealed = batches.seal_batch(&orders).unwrap().unwrap();
    assert_eq!(sealed.size, 101);
    let row = converter
        .get_record_row(&record("orders", 0, 101, Some(json!({ "id": 3 })), None), &orders)
        .unwrap();
    assert_eq!(row.content()["i"], json!(1));
    assert_eq!(flush.requests().len(), 2);
}

#[test]
fn disabled_threshold_never_requests_flush() {
    init_test_tracing();

    let orders = TableId::new("stage", "orders");
    let flush = CollectingMergeFlush::default();
    let converter = SinkRecordConverter::new(
        &config(-1),
        JsonRecordConverter::new(),
        MemoryMergeBatches::new(),
        flush.clone(),
    );

    for offset in 0..500 {
        converter
            .get_record_row(
                &record("orders", 0, offset, Some(json!({ "id": offset })), None),
                &orders,
            )
            .unwrap();
    }

    assert!(flush.requests().is_empty());
}

#[test]
fn concurrent_conversions_get_distinct_batch_positions() {
    init_test_tracing();

    let orders = TableId::new("stage", "orders");
    let batches = MemoryMergeBatches::new();
    let converter = Arc::new(SinkRecordConverter::new(
        &config(-1),
        JsonRecordConverter::new(),
        batches.clone(),
        CollectingMergeFlush::default(),
    ));

    let handles: Vec<_> = (0..4)
        .map(|partition| {
            let converter = converter.clone();
            let orders = orders.clone();
            thread::spawn(move || {
                (0..50)
                    .map(|offset| {
                        let record = record(
                            "orders",
                            partition,
                            offset,
                            Some(json!({ "id": offset })),
                            Some(json!({ "id": offset })),
                        );
                        let row = converter.get_record_row(&record, &orders).unwrap();
                        row.content()["i"].as_u64().unwrap()
                    })
                    .collect::<Vec<u64>>()
            })
        })
        .collect();

    let mut positions: Vec<u64> = handles
        .into_iter()
        .flat_map(|handle| {
            let positions = handle.join().unwrap();
            // Positions observed by one thread follow its submission order.
            assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
            positions
        })
        .collect();
    positions.sort_unstable();

    assert_eq!(positions, (1..=200).collect::<Vec<u64>>());
    assert_eq!(batches.current_batch_size(&orders).unwrap(), 200);
}

#[tokio::test(flavor = "multi_thread")]
async fn channel_trigger_hands_each_pending_table_to_the_merge_worker_once() {
    init_test_tracing();

    let orders = TableId::new("stage", "orders");
    let (flush, mut receiver) = merge_flush_channel();
    let batches = MemoryMergeBatches::new();
    let converter = SinkRecordConverter::new(
        &config(2),
        JsonRecordConverter::new(),
        batches.clone(),
        flush,
    );

    for offset in 0..5 {
        converter
            .get_record_row(
                &record("orders", 0, offset, Some(json!({ "id": offset })), None),
                &orders,
            )
            .unwrap();
    }

    assert_eq!(receiver.recv().await, Some(orders.clone()));
    let sealed = batches.seal_batch(&orders).unwrap().unwrap();
    assert_eq!(sealed.size, 5);

    drop(converter);
    assert_eq!(receiver.recv().await, None);
}
