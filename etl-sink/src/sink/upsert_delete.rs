use chrono::Utc;
use etl_sink_config::shared::SinkConfig;
use metrics::counter;
use serde_json::Value;
use tracing::debug;

use crate::bail;
use crate::conversions::{RecordConverter, RecordType};
use crate::error::{ErrorKind, SinkResult};
use crate::merge::{IntermediateField, MergeBatches, MergeFlush, MergeThreshold};
use crate::metrics::ETL_SINK_MERGE_FLUSHES_TRIGGERED_TOTAL;
use crate::sink::extensions::{ExtensionPoint, RowExtension, RowExtensions};
use crate::types::{Row, SinkRecord, TableId};

/// Builds the staged entries written to the intermediate table of a destination in upsert/delete
/// mode.
///
/// A staged entry holds exactly the [`IntermediateField`] columns: the converted key, the
/// converted value (null for a delete), the batch position returned by the registry and the
/// partition time in seconds since the Unix epoch.
///
/// Building an entry registers the record with the [`MergeBatches`] registry and may request a
/// merge flush of the destination through [`MergeFlush`]. Records violating the invariants the
/// merge relies on are rejected before they are registered:
///
/// - a key converted to null fails with [`ErrorKind::NullRecordKey`];
/// - a record without a defined timestamp kind, or without a timestamp, fails with
///   [`ErrorKind::UndefinedRecordTimestamp`] when the message time is used as partition time.
#[derive(Debug, Clone)]
pub struct UpsertDeleteRowBuilder {
    delete_enabled: bool,
    use_message_time: bool,
    merge_threshold: MergeThreshold,
    extensions: RowExtensions,
}

impl UpsertDeleteRowBuilder {
    pub fn new(config: &SinkConfig) -> Self {
        Self {
            delete_enabled: config.delete_enabled,
            use_message_time: config.bigquery_partition_decorator
                && config.bigquery_message_time_partitioning,
            merge_threshold: MergeThreshold::from_config_value(config.merge_records_threshold),
            extensions: RowExtensions::new(vec![RowExtension::new(
                ExtensionPoint::KafkaData,
                config.kafka_data_field_name.clone(),
            )]),
        }
    }

    /// Returns the merge threshold used to request merge flushes.
    pub fn merge_threshold(&self) -> MergeThreshold {
        self.merge_threshold
    }

    /// Builds the staged entry of `record` for the destination `table_id`.
    pub fn build_row<C, B, F>(
        &self,
        record: &SinkRecord,
        table_id: &TableId,
        converter: &C,
        batches: &B,
        flush: &F,
    ) -> SinkResult<Row>
    where
        C: RecordConverter + ?Sized,
        B: MergeBatches + ?Sized,
        F: MergeFlush + ?Sized,
    {
        // Without delete support, absent values follow the converter's own policy.
        let value = if self.delete_enabled && record.is_tombstone() {
            None
        } else {
            converter.convert_record(record, RecordType::Value)?
        };

        let value = match value {
            Some(mut value) => {
                self.extensions.apply(record, converter, &mut value)?;
                Value::Object(value)
            }
            None => Value::Null,
        };

        let Some(key) = converter.convert_record(record, RecordType::Key)? else {
            bail!(
                ErrorKind::NullRecordKey,
                "Record keys must be non-null when upsert/delete is enabled",
                format!("Record {record} for table {table_id} has a null key")
            );
        };

        let partition_time = self.partition_time(record, table_id)?;

        let batch_size = batches.add_to_batch(record, table_id)?;
        if self.merge_threshold.is_reached(batch_size) {
            debug!(
                table = %table_id,
                batch_size,
                threshold = ?self.merge_threshold,
                "triggering merge flush since the current batch reached the merge threshold"
            );

            counter!(ETL_SINK_MERGE_FLUSHES_TRIGGERED_TOTAL).increment(1);
            flush.merge_flush(table_id);
        }

        let mut row = Row::new();
        row.insert(IntermediateField::Key.to_string(), Value::Object(key));
        row.insert(IntermediateField::Value.to_string(), value);
        row.insert(IntermediateField::Iteration.to_string(), Value::from(batch_size));
        row.insert(
            IntermediateField::PartitionTime.to_string(),
            Value::from(partition_time),
        );

        Ok(row)
    }

    /// Returns the partition time of `record` in seconds since the Unix epoch.
    ///
    /// The current time is used unless the message time is used for partitioning, so the column
    /// is always populated and can deduplicate rows during merges.
    fn partition_time(&self, record: &SinkRecord, table_id: &TableId) -> SinkResult<i64> {
        if !self.use_message_time {
            return Ok(Utc::now().timestamp());
        }

        if !record.timestamp_type.is_defined() {
            bail!(
                ErrorKind::UndefinedRecordTimestamp,
                "Message has no timestamp type, cannot use message timestamp to partition",
                format!(
                    "Record {record} for table {table_id} has timestamp type {}",
                    record.timestamp_type
                )
            );
        }

        match record.timestamp_secs() {
            Some(timestamp) => Ok(timestamp),
            None => bail!(
                ErrorKind::UndefinedRecordTimestamp,
                "Message has no timestamp, cannot use message timestamp to partition",
                format!(
                    "Record {record} for table {table_id} has timestamp type {} but no timestamp",
                    record.timestamp_type
                )
            ),
        }
    }
}
