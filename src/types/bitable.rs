//! Bitable (multi-dimensional table) types.
//!
//! Field values are kept as raw JSON: Bitable fields are schemaless from
//! the client's point of view, so records carry a `Map<String, Value>`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A data table inside a Bitable app.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppTable {
    /// Table identifier, `tbl`-prefixed.
    pub table_id: String,
    /// Table revision.
    #[serde(default)]
    pub revision: i64,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// A single record in a data table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TableRecord {
    /// Record identifier, `rec`-prefixed. Absent on bodies sent to the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    /// Field values keyed by field name.
    #[serde(default)]
    pub fields: Map<String, Value>,
    /// Creation time, milliseconds since the epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<i64>,
    /// Last modification time, milliseconds since the epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_time: Option<i64>,
}

/// Request body for creating or updating a record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RecordFields {
    /// Field values keyed by field name.
    pub fields: Map<String, Value>,
}

impl RecordFields {
    /// Wrap field values into a request body.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Parameters for listing tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListTablesParams {
    /// Tables per page, clamped to the accepted range.
    pub page_size: Option<u32>,
    /// Opaque continuation token from a previous page.
    pub page_token: Option<String>,
}

/// Parameters for listing records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRecordsParams {
    /// Records per page, clamped to the accepted range.
    pub page_size: Option<u32>,
    /// Opaque continuation token from a previous page.
    pub page_token: Option<String>,
    /// Restrict results to a view.
    pub view_id: Option<String>,
    /// Filter expression; percent-encoded onto the query string.
    pub filter: Option<String>,
}

/// One page of tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListTablesResponse {
    /// Whether another page exists.
    #[serde(default)]
    pub has_more: bool,
    /// Continuation token for the next page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    /// Total number of tables.
    #[serde(default)]
    pub total: u32,
    /// Tables in this page.
    #[serde(default)]
    pub items: Vec<AppTable>,
}

/// One page of records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListRecordsResponse {
    /// Whether another page exists.
    #[serde(default)]
    pub has_more: bool,
    /// Continuation token for the next page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    /// Total number of records matching the query.
    #[serde(default)]
    pub total: u32,
    /// Records in this page.
    #[serde(default)]
    pub items: Vec<TableRecord>,
}

/// Envelope data wrapping a single record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordResponse {
    /// The record.
    pub record: TableRecord,
}

/// Envelope data for a record deletion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeleteRecordResponse {
    /// Whether the record was deleted.
    #[serde(default)]
    pub deleted: bool,
    /// Identifier of the deleted record.
    pub record_id: String,
}
