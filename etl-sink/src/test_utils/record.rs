use serde_json::Value;

use crate::bail;
use crate::conversions::{JsonRecordConverter, RecordConverter, RecordType};
use crate::error::{ErrorKind, SinkResult};
use crate::types::{Row, SinkRecord, TimestampType};

/// Builder for [`SinkRecord`]s used in tests.
///
/// Records start as tombstones without key and without a defined timestamp.
#[derive(Debug, Clone)]
pub struct SinkRecordBuilder {
    record: SinkRecord,
}

impl SinkRecordBuilder {
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64) -> Self {
        Self {
            record: SinkRecord {
                topic: topic.into(),
                partition,
                offset,
                key: None,
                value: None,
                timestamp: None,
                timestamp_type: TimestampType::NoTimestampType,
            },
        }
    }

    pub fn key(mut self, key: Value) -> Self {
        self.record.key = Some(key);
        self
    }

    pub fn value(mut self, value: Value) -> Self {
        self.record.value = Some(value);
        self
    }

    /// Sets the timestamp in milliseconds since the Unix epoch and its kind.
    pub fn timestamp(mut self, millis: i64, timestamp_type: TimestampType) -> Self {
        self.record.timestamp = Some(millis);
        self.record.timestamp_type = timestamp_type;
        self
    }

    pub fn build(self) -> SinkRecord {
        self.record
    }
}

/// [`RecordConverter`] failing with [`ErrorKind::ConversionError`].
///
/// Fails for every payload by default. When restricted to one [`RecordType`], the other payload is
/// converted with [`JsonRecordConverter`].
#[derive(Debug, Clone, Default)]
pub struct FailingRecordConverter {
    failing_type: Option<RecordType>,
    fallback: JsonRecordConverter,
}

impl FailingRecordConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails only when converting payloads of `record_type`.
    pub fn failing_on(record_type: RecordType) -> Self {
        Self {
            failing_type: Some(record_type),
            fallback: JsonRecordConverter::new(),
        }
    }
}

impl RecordConverter for FailingRecordConverter {
    fn convert_record(
        &self,
        record: &SinkRecord,
        record_type: RecordType,
    ) -> SinkResult<Option<Row>> {
        if self
            .failing_type
            .is_none_or(|failing_type| failing_type == record_type)
        {
            bail!(
                ErrorKind::ConversionError,
                "Scripted conversion failure",
                format!("Conversion of the {record_type} of record {record} is set up to fail")
            );
        }

        self.fallback.convert_record(record, record_type)
    }
}
