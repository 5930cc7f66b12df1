use std::collections::HashSet;

use serde_json::Value;

use crate::error::{ErrorKind, SinkResult};
use crate::sink_error;
use crate::types::Row;

/// Separator between the topic and the field name of a qualified field.
pub const QUALIFIED_FIELD_SEPARATOR: char = ':';

/// Serializes selected map-valued fields of a row to JSON text.
///
/// Fields are selected by their qualified name, `topic:field`. Only top-level fields whose value
/// is a map are converted; every other field passes through unchanged, including listed fields
/// holding a non-map value.
#[derive(Debug, Clone, Default)]
pub struct MapFieldStringifier {
    qualified_fields: HashSet<String>,
}

impl MapFieldStringifier {
    /// Creates a stringifier for the given `topic:field` identifiers.
    pub fn new<I, S>(qualified_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            qualified_fields: qualified_fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` if no field is selected.
    pub fn is_empty(&self) -> bool {
        self.qualified_fields.is_empty()
    }

    /// Returns `true` if `field` of `topic` is selected.
    pub fn is_selected(&self, topic: &str, field: &str) -> bool {
        self.qualified_fields
            .contains(&format!("{topic}{QUALIFIED_FIELD_SEPARATOR}{field}"))
    }

    /// Replaces every selected map-valued field of `row` with its JSON text.
    pub fn apply(&self, topic: &str, row: Row) -> SinkResult<Row> {
        if self.is_empty() {
            return Ok(row);
        }

        let mut converted = Row::with_capacity(row.len());
        for (name, value) in row {
            let value = match value {
                Value::Object(map) if self.is_selected(topic, &name) => {
                    Value::String(serialize_without_nulls(map).map_err(|err| {
                        sink_error!(
                            ErrorKind::SerializationError,
                            "Failed to serialize map field to string",
                            format!("Field `{name}` of topic `{topic}` could not be serialized"),
                            source: err
                        )
                    })?)
                }
                other => other,
            };

            converted.insert(name, value);
        }

        Ok(converted)
    }
}

/// Serializes a map to JSON text, omitting null-valued entries at every nesting level.
fn serialize_without_nulls(map: Row) -> Result<String, serde_json::Error> {
    serde_json::to_string(&strip_nulls(Value::Object(map)))
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(name, value)| (name, strip_nulls(value)))
                .collect(),
        ),
        Value::Array(values) => Value::Array(values.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}
