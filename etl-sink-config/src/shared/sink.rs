use serde::{Deserialize, Serialize};

use crate::load::Config;
use crate::shared::ValidationError;

/// Separator between the topic and the field name in `convert_map_fields_to_string` entries.
const QUALIFIED_FIELD_SEPARATOR: char = ':';

/// Configuration of the record-to-row conversion of the sink.
///
/// All settings are resolved before records are converted and are read-only afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SinkConfig {
    /// Stages records for a merge that upserts them into the final table.
    #[serde(default)]
    pub upsert_enabled: bool,
    /// Stages records for a merge and turns tombstones into deletes.
    #[serde(default)]
    pub delete_enabled: bool,
    /// Batch size that triggers a merge flush of a destination, or `-1` to disable.
    #[serde(default = "default_merge_records_threshold")]
    pub merge_records_threshold: i64,
    /// Uses the record timestamp as the partition time of staged entries.
    #[serde(default)]
    pub bigquery_message_time_partitioning: bool,
    /// Uses partition decorators when writing to destination tables.
    #[serde(default = "default_bigquery_partition_decorator")]
    pub bigquery_partition_decorator: bool,
    /// Rewrites field names the warehouse rejects into legal names.
    #[serde(default)]
    pub sanitize_field_names: bool,
    /// `topic:field` identifiers of map fields serialized to JSON text.
    #[serde(default)]
    pub convert_map_fields_to_string: Vec<String>,
    /// Name of the field holding record provenance (topic, partition, offset, insert time).
    #[serde(default)]
    pub kafka_data_field_name: Option<String>,
    /// Name of the field holding the converted record key.
    #[serde(default)]
    pub kafka_key_field_name: Option<String>,
}

impl SinkConfig {
    /// Default batch size triggering a merge flush: disabled.
    pub const DEFAULT_MERGE_RECORDS_THRESHOLD: i64 = -1;

    /// Default for partition decorator usage.
    pub const DEFAULT_BIGQUERY_PARTITION_DECORATOR: bool = true;

    /// Returns `true` if records are staged for a merge instead of inserted directly.
    pub fn is_upsert_delete_enabled(&self) -> bool {
        self.upsert_enabled || self.delete_enabled
    }

    /// Validates the sink configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.merge_records_threshold != Self::DEFAULT_MERGE_RECORDS_THRESHOLD
            && self.merge_records_threshold <= 0
        {
            return Err(ValidationError::InvalidFieldValue {
                field: "merge_records_threshold".to_string(),
                constraint: format!(
                    "must be -1 or greater than 0 (received: {})",
                    self.merge_records_threshold
                ),
            });
        }

        for entry in &self.convert_map_fields_to_string {
            let is_qualified = entry
                .split_once(QUALIFIED_FIELD_SEPARATOR)
                .is_some_and(|(topic, field)| !topic.is_empty() && !field.is_empty());

            if !is_qualified {
                return Err(ValidationError::InvalidFieldValue {
                    field: "convert_map_fields_to_string".to_string(),
                    constraint: format!(
                        "entries must have the form `topic:field` (received: `{entry}`)"
                    ),
                });
            }
        }

        for (field, value) in [
            ("kafka_data_field_name", &self.kafka_data_field_name),
            ("kafka_key_field_name", &self.kafka_key_field_name),
        ] {
            if value.as_deref().is_some_and(str::is_empty) {
                return Err(ValidationError::InvalidFieldValue {
                    field: field.to_string(),
                    constraint: "must not be empty when set".to_string(),
                });
            }
        }

        if self.is_upsert_delete_enabled() && self.kafka_key_field_name.is_none() {
            return Err(ValidationError::InvalidFieldValue {
                field: "kafka_key_field_name".to_string(),
                constraint: "must be set when upsert or delete is enabled".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            upsert_enabled: false,
            delete_enabled: false,
            merge_records_threshold: default_merge_records_threshold(),
            bigquery_message_time_partitioning: false,
            bigquery_partition_decorator: default_bigquery_partition_decorator(),
            sanitize_field_names: false,
            convert_map_fields_to_string: Vec::new(),
            kafka_data_field_name: None,
            kafka_key_field_name: None,
        }
    }
}

impl Config for SinkConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &["convert_map_fields_to_string"];
}

fn default_merge_records_threshold() -> i64 {
    SinkConfig::DEFAULT_MERGE_RECORDS_THRESHOLD
}

fn default_bigquery_partition_decorator() -> bool {
    SinkConfig::DEFAULT_BIGQUERY_PARTITION_DECORATOR
}
