//! Adapter from [`RowToInsert`] to BigQuery streaming insert requests.

use gcp_bigquery_client::model::table_data_insert_all_request::TableDataInsertAllRequest;

use crate::error::{ErrorKind, SinkResult};
use crate::sink_error;
use crate::types::RowToInsert;

impl RowToInsert {
    /// Appends this row to `request`, using the row id as the insert id.
    pub fn add_to_request(self, request: &mut TableDataInsertAllRequest) -> SinkResult<()> {
        let (id, content) = self.into_parts();

        request.add_row(Some(id.clone()), content).map_err(|err| {
            sink_error!(
                ErrorKind::DestinationError,
                "Failed to add row to BigQuery insert request",
                format!("Row `{id}` could not be added"),
                source: err
            )
        })
    }
}

/// Builds a streaming insert request holding `rows`, in order.
pub fn insert_all_request<I>(rows: I) -> SinkResult<TableDataInsertAllRequest>
where
    I: IntoIterator<Item = RowToInsert>,
{
    let mut request = TableDataInsertAllRequest::new();
    for row in rows {
        row.add_to_request(&mut request)?;
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Row, row_id};
    use serde_json::json;

    fn row(offset: i64) -> RowToInsert {
        let mut content = Row::new();
        content.insert("id".to_string(), json!(offset));

        RowToInsert::new(row_id("orders", 0, offset), content)
    }

    #[test]
    fn rows_keep_their_insert_ids() {
        let request = insert_all_request([row(1), row(2)]).unwrap();

        let serialized = serde_json::to_value(&request).unwrap();
        assert_eq!(serialized["rows"][0]["insertId"], json!("orders-0-1"));
        assert_eq!(serialized["rows"][1]["insertId"], json!("orders-0-2"));
        assert_eq!(serialized["rows"][1]["json"], json!({ "id": 2 }));
    }
}
