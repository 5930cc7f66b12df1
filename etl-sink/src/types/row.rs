use serde::Serialize;

use crate::types::SinkRecord;

/// A row ready to be written to the warehouse.
///
/// Maps field names to values, preserving insertion order. Values are JSON values, which covers
/// every shape a row may hold: primitive scalars, nested maps, lists and null.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Returns the row identifier for the record at `topic`/`partition`/`offset`.
///
/// The identifier is the dash-joined source coordinates. Offsets are unique within a partition,
/// so the identifier is unique across the lifetime of the partition sequence and is stable on
/// replay, which lets the warehouse use it as a de-duplication token for at-least-once delivery.
pub fn row_id(topic: &str, partition: i32, offset: i64) -> String {
    format!("{topic}-{partition}-{offset}")
}

/// Returns the row identifier for a [`SinkRecord`].
pub fn record_row_id(record: &SinkRecord) -> String {
    row_id(&record.topic, record.partition, record.offset)
}

/// An immutable pair of row identifier and row content, consumed by the insertion client.
///
/// Serializes to the shape of a streaming insert row: `{"insertId": ..., "json": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowToInsert {
    #[serde(rename = "insertId")]
    id: String,
    #[serde(rename = "json")]
    content: Row,
}

impl RowToInsert {
    /// Creates a new [`RowToInsert`].
    pub fn new(id: String, content: Row) -> Self {
        Self { id, content }
    }

    /// Returns the row identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the row content.
    pub fn content(&self) -> &Row {
        &self.content
    }

    /// Consumes the row and returns its identifier and content.
    pub fn into_parts(self) -> (String, Row) {
        (self.id, self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_id_joins_coordinates_with_dashes() {
        assert_eq!(row_id("orders", 2, 57), "orders-2-57");
    }

    #[test]
    fn row_id_is_stable_and_distinct_per_offset() {
        assert_eq!(row_id("orders", 0, 1), row_id("orders", 0, 1));
        assert_ne!(row_id("orders", 0, 1), row_id("orders", 0, 2));
    }

    #[test]
    fn row_to_insert_serializes_as_insert_row() {
        let mut content = Row::new();
        content.insert("id".to_string(), json!(1));
        let row = RowToInsert::new(row_id("orders", 2, 57), content);

        let serialized = serde_json::to_value(&row).unwrap();
        assert_eq!(
            serialized,
            json!({ "insertId": "orders-2-57", "json": { "id": 1 } })
        );
    }
}
