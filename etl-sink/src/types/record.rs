use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of timestamp attached to a [`SinkRecord`] by the log-structured source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampType {
    /// The record carries no usable timestamp.
    #[default]
    NoTimestampType,
    /// The timestamp was set by the producer when the record was created.
    CreateTime,
    /// The timestamp was set by the broker when the record was appended to the log.
    LogAppendTime,
}

impl TimestampType {
    /// Returns `true` when the timestamp kind is known.
    pub fn is_defined(&self) -> bool {
        !matches!(self, TimestampType::NoTimestampType)
    }
}

impl fmt::Display for TimestampType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampType::NoTimestampType => write!(f, "NoTimestampType"),
            TimestampType::CreateTime => write!(f, "CreateTime"),
            TimestampType::LogAppendTime => write!(f, "LogAppendTime"),
        }
    }
}

/// An inbound change record read from a topic partition.
///
/// The key and the value are structured payloads already decoded by the source. An absent value
/// is a tombstone, the conventional representation of a deletion of the keyed entity. Records are
/// consumed read-only by the conversion core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkRecord {
    /// Topic the record was read from.
    pub topic: String,
    /// Partition of the topic the record was read from.
    pub partition: i32,
    /// Offset of the record within its partition, monotonically increasing.
    pub offset: i64,
    /// Structured key of the record, if any.
    #[serde(default)]
    pub key: Option<serde_json::Value>,
    /// Structured value of the record. [`None`] marks a tombstone.
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    /// Record timestamp in milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Kind of the record timestamp.
    #[serde(default)]
    pub timestamp_type: TimestampType,
}

impl SinkRecord {
    /// Returns `true` if the record is a tombstone.
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    /// Returns the record timestamp in whole seconds since the Unix epoch.
    ///
    /// Returns [`None`] when the timestamp kind is undefined or no timestamp is attached.
    pub fn timestamp_secs(&self) -> Option<i64> {
        if !self.timestamp_type.is_defined() {
            return None;
        }

        self.timestamp.map(|millis| millis.div_euclid(1000))
    }
}

impl fmt::Display for SinkRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}@{}", self.topic, self.partition, self.offset)
    }
}
