use etl_sink_config::shared::SinkConfig;

use crate::bail;
use crate::conversions::{RecordConverter, RecordType};
use crate::error::{ErrorKind, SinkResult};
use crate::sink::extensions::{ExtensionPoint, RowExtension, RowExtensions};
use crate::types::{Row, SinkRecord};

/// Builds rows inserted directly into the destination table.
///
/// The row holds the fields of the converted value, followed by the metadata and key-mirror
/// fields when they are configured.
#[derive(Debug, Clone)]
pub struct RegularRowBuilder {
    extensions: RowExtensions,
}

impl RegularRowBuilder {
    pub fn new(config: &SinkConfig) -> Self {
        Self {
            extensions: RowExtensions::new(vec![
                RowExtension::new(
                    ExtensionPoint::KafkaData,
                    config.kafka_data_field_name.clone(),
                ),
                RowExtension::new(
                    ExtensionPoint::KafkaKey,
                    config.kafka_key_field_name.clone(),
                ),
            ]),
        }
    }

    /// Builds the row of `record`.
    ///
    /// Conversion errors are returned as they are. A value converted to null has no row to insert
    /// and is rejected with [`ErrorKind::ConversionError`].
    pub fn build_row<C>(&self, record: &SinkRecord, converter: &C) -> SinkResult<Row>
    where
        C: RecordConverter + ?Sized,
    {
        let Some(mut row) = converter.convert_record(record, RecordType::Value)? else {
            bail!(
                ErrorKind::ConversionError,
                "Record value converted to null",
                format!("Record {record} has no value to insert into the destination table")
            );
        };

        self.extensions.apply(record, converter, &mut row)?;

        Ok(row)
    }
}
