use etl_sink_config::shared::SinkConfig;

use crate::conversions::{InvalidCharSanitizer, MapFieldStringifier, NameSanitizer};
use crate::error::SinkResult;
use crate::types::Row;

/// Transforms finished rows before they are handed to the insert client.
///
/// Field names are sanitized first, over the whole row including nested maps, when sanitization
/// is configured. The selected map fields are then serialized to JSON text. Both steps run in
/// every row mode.
#[derive(Debug, Clone)]
pub struct FieldPostProcessor<S = InvalidCharSanitizer> {
    sanitizer: Option<S>,
    stringifier: MapFieldStringifier,
}

impl FieldPostProcessor<InvalidCharSanitizer> {
    pub fn new(config: &SinkConfig) -> Self {
        Self::with_sanitizer(config, InvalidCharSanitizer)
    }
}

impl<S> FieldPostProcessor<S>
where
    S: NameSanitizer,
{
    /// Creates a post-processor using `sanitizer` when field name sanitization is enabled.
    pub fn with_sanitizer(config: &SinkConfig, sanitizer: S) -> Self {
        Self {
            sanitizer: config.sanitize_field_names.then_some(sanitizer),
            stringifier: MapFieldStringifier::new(config.convert_map_fields_to_string.iter().cloned()),
        }
    }

    /// Applies sanitization and stringification to `row`, a row built for a record of `topic`.
    pub fn process(&self, topic: &str, row: Row) -> SinkResult<Row> {
        let row = match &self.sanitizer {
            Some(sanitizer) => sanitizer.sanitize(row)?,
            None => row,
        };

        self.stringifier.apply(topic, row)
    }
}
