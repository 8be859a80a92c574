//! BigQuery REST request/response shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A query result row keyed by column name.
///
/// Scalar values arrive as JSON strings (BigQuery encodes `INT64` as a string)
/// or `null`.
pub type QueryRow = Map<String, Value>;

/// Fully-qualified reference to a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

/// One row of a streaming insert, in the raw `{insertId, json}` wire shape.
///
/// `insert_id` is omitted from the wire when `None`, which disables
/// BigQuery's best-effort deduplication for that row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertRow<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_id: Option<String>,
    pub json: T,
}

impl<T> InsertRow<T> {
    /// Wraps `json` without an insert id.
    pub fn raw(json: T) -> Self {
        Self {
            insert_id: None,
            json,
        }
    }
}

/// Call-level switches for `tabledata.insertAll`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertOptions {
    /// Accept the valid rows of a request even when others are invalid.
    pub skip_invalid_rows: bool,
    pub ignore_unknown_values: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertAllRequest<'a, T> {
    pub kind: &'static str,
    pub skip_invalid_rows: bool,
    pub ignore_unknown_values: bool,
    pub rows: &'a [InsertRow<T>],
}

/// Successful `insertAll` response (no `insertErrors`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InsertAllResponse {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default, rename = "insertErrors")]
    pub(crate) insert_errors: Vec<InsertErrorEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct InsertErrorEntry {
    pub index: usize,
    #[serde(default)]
    pub errors: Vec<ErrorProto>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorProto {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryRequest<'a> {
    pub query: &'a str,
    pub use_legacy_sql: bool,
    pub max_results: u32,
    pub timeout_ms: u64,
}

/// Shared shape of `jobs.query` and `jobs.getQueryResults` responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub job_complete: bool,
    #[serde(default)]
    pub job_reference: Option<JobReference>,
    #[serde(default)]
    pub schema: Option<TableSchema>,
    #[serde(default)]
    pub rows: Vec<TableRow>,
    #[serde(default)]
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobReference {
    pub job_id: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TableSchema {
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FieldSchema {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TableRow {
    #[serde(default)]
    pub f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TableCell {
    #[serde(default)]
    pub v: Value,
}

/// Zips a positional row with the schema's column names.
pub(crate) fn row_to_map(schema: &TableSchema, row: TableRow) -> QueryRow {
    schema
        .fields
        .iter()
        .zip(row.f)
        .map(|(field, cell)| (field.name.clone(), cell.v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_to_map_names_cells_by_schema() {
        let schema: TableSchema = serde_json::from_value(json!({
            "fields": [{"name": "screen_name", "type": "STRING"}, {"name": "max_id", "type": "INT64"}]
        }))
        .unwrap();
        let row: TableRow =
            serde_json::from_value(json!({"f": [{"v": "alice"}, {"v": "1234"}]})).unwrap();

        let map = row_to_map(&schema, row);
        assert_eq!(map["screen_name"], "alice");
        assert_eq!(map["max_id"], "1234");
    }

    #[test]
    fn null_cells_stay_null() {
        let schema: TableSchema =
            serde_json::from_value(json!({"fields": [{"name": "max_id"}]})).unwrap();
        let row: TableRow = serde_json::from_value(json!({"f": [{"v": null}]})).unwrap();
        assert!(row_to_map(&schema, row)["max_id"].is_null());
    }

    #[test]
    fn insert_row_uses_wire_field_names() {
        let row = InsertRow {
            insert_id: Some("99".to_owned()),
            json: json!({"id_str": "99"}),
        };
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!({"insertId": "99", "json": {"id_str": "99"}})
        );
    }

    #[test]
    fn raw_insert_row_omits_insert_id() {
        let row = InsertRow::raw(json!({"id_str": "99"}));
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!({"json": {"id_str": "99"}})
        );
    }

    #[test]
    fn table_ref_displays_dotted_path() {
        let table = TableRef {
            project_id: "p".to_owned(),
            dataset_id: "d".to_owned(),
            table_id: "t".to_owned(),
        };
        assert_eq!(table.to_string(), "p.d.t");
    }
}
