use std::fmt;
use std::sync::Arc;

use crate::bail;
use crate::error::{ErrorKind, SinkResult};
use crate::types::{Row, SinkRecord};

/// Selects which payload of a [`SinkRecord`] is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// The record key.
    Key,
    /// The record value.
    Value,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Key => write!(f, "key"),
            RecordType::Value => write!(f, "value"),
        }
    }
}

/// Converts the structured payloads of a record into rows.
///
/// Returning `Ok(None)` means the converter maps the payload to null. What a converter does with
/// an absent payload is its own policy: the conversion core only treats absence as a deletion
/// when delete support is explicitly enabled.
pub trait RecordConverter {
    /// Converts the payload selected by `record_type` into a [`Row`].
    fn convert_record(&self, record: &SinkRecord, record_type: RecordType)
    -> SinkResult<Option<Row>>;
}

impl<T> RecordConverter for Arc<T>
where
    T: RecordConverter + ?Sized,
{
    fn convert_record(
        &self,
        record: &SinkRecord,
        record_type: RecordType,
    ) -> SinkResult<Option<Row>> {
        (**self).convert_record(record, record_type)
    }
}

/// Converter for records whose payloads are already decoded into JSON.
///
/// - An object payload becomes a [`Row`] with the same fields, in the same order.
/// - An absent key converts to `None`.
/// - An absent value is rejected with [`ErrorKind::ConversionError`]. Tombstones only become
///   deletes through the delete support of the upsert/delete builder, never implicitly.
/// - A primitive or list payload is wrapped into a single-field row when a wrapping field name is
///   configured and rejected otherwise.
#[derive(Debug, Clone, Default)]
pub struct JsonRecordConverter {
    primitive_field_name: Option<String>,
}

impl JsonRecordConverter {
    /// Creates a converter that only accepts object payloads.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps non-object payloads into a row holding a single field named `field_name`.
    pub fn with_primitive_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.primitive_field_name = Some(field_name.into());
        self
    }
}

impl RecordConverter for JsonRecordConverter {
    fn convert_record(
        &self,
        record: &SinkRecord,
        record_type: RecordType,
    ) -> SinkResult<Option<Row>> {
        let payload = match record_type {
            RecordType::Key => &record.key,
            RecordType::Value => &record.value,
        };

        let Some(payload) = payload else {
            return match record_type {
                RecordType::Key => Ok(None),
                RecordType::Value => bail!(
                    ErrorKind::ConversionError,
                    "Record value is absent",
                    format!(
                        "Record {record} is a tombstone, which is only supported when delete is enabled"
                    )
                ),
            };
        };

        match payload {
            serde_json::Value::Object(fields) => Ok(Some(fields.clone())),
            serde_json::Value::Null => Ok(None),
            other => {
                let Some(field_name) = &self.primitive_field_name else {
                    bail!(
                        ErrorKind::ConversionError,
                        "Record payload is not a structured value",
                        format!(
                            "The {record_type} of record {record} must be an object, got `{other}`"
                        )
                    );
                };

                let mut row = Row::new();
                row.insert(field_name.clone(), other.clone());

                Ok(Some(row))
            }
        }
    }
}
