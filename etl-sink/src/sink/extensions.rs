use serde_json::Value;

use crate::conversions::kafka_data::build_kafka_data_record;
use crate::conversions::{RecordConverter, RecordType};
use crate::error::SinkResult;
use crate::types::{Row, SinkRecord};

/// Optional side field that can be attached to a built row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionPoint {
    /// Record provenance: topic, partition, offset and insert time.
    KafkaData,
    /// The converted record key.
    KafkaKey,
}

/// An [`ExtensionPoint`], either unbound or bound to the name of the field it writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowExtension {
    point: ExtensionPoint,
    field_name: Option<String>,
}

impl RowExtension {
    pub fn new(point: ExtensionPoint, field_name: Option<String>) -> Self {
        Self { point, field_name }
    }

    fn apply<C>(&self, record: &SinkRecord, converter: &C, row: &mut Row) -> SinkResult<()>
    where
        C: RecordConverter + ?Sized,
    {
        let Some(field_name) = &self.field_name else {
            return Ok(());
        };

        let value = match self.point {
            ExtensionPoint::KafkaData => Value::Object(build_kafka_data_record(record)),
            ExtensionPoint::KafkaKey => converter
                .convert_record(record, RecordType::Key)?
                .map(Value::Object)
                .unwrap_or(Value::Null),
        };
        row.insert(field_name.clone(), value);

        Ok(())
    }
}

/// Ordered list of [`RowExtension`]s applied to rows after they are built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowExtensions {
    extensions: Vec<RowExtension>,
}

impl RowExtensions {
    pub fn new(extensions: Vec<RowExtension>) -> Self {
        Self { extensions }
    }

    /// Applies every bound extension to `row`, in order.
    pub fn apply<C>(&self, record: &SinkRecord, converter: &C, row: &mut Row) -> SinkResult<()>
    where
        C: RecordConverter + ?Sized,
    {
        for extension in &self.extensions {
            extension.apply(record, converter, row)?;
        }

        Ok(())
    }
}
