//! Bitable (multi-dimensional table) service.

mod service;
mod validation;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::LarkResult;
use crate::types::{
    ListRecordsParams, ListRecordsResponse, ListTablesParams, ListTablesResponse, TableRecord,
};

pub use service::BitableServiceImpl;
pub use validation::{MAX_PAGE_SIZE, MIN_PAGE_SIZE};

/// Service for tables and records inside a Bitable app.
#[async_trait]
pub trait BitableService: Send + Sync {
    /// List the data tables of an app, one page at a time.
    async fn list_tables(
        &self,
        app_token: &str,
        params: Option<ListTablesParams>,
    ) -> LarkResult<ListTablesResponse>;

    /// List records in a table, one page at a time.
    async fn list_records(
        &self,
        app_token: &str,
        table_id: &str,
        params: Option<ListRecordsParams>,
    ) -> LarkResult<ListRecordsResponse>;

    /// List every record in a table by following continuation tokens.
    async fn list_all_records(
        &self,
        app_token: &str,
        table_id: &str,
        params: Option<ListRecordsParams>,
    ) -> LarkResult<Vec<TableRecord>>;

    /// Get a single record.
    async fn get_record(
        &self,
        app_token: &str,
        table_id: &str,
        record_id: &str,
    ) -> LarkResult<TableRecord>;

    /// Create a record from field values.
    async fn create_record(
        &self,
        app_token: &str,
        table_id: &str,
        fields: Map<String, Value>,
    ) -> LarkResult<TableRecord>;

    /// Replace the field values of an existing record.
    async fn update_record(
        &self,
        app_token: &str,
        table_id: &str,
        record_id: &str,
        fields: Map<String, Value>,
    ) -> LarkResult<TableRecord>;

    /// Delete a record. Returns whether the server deleted it.
    async fn delete_record(
        &self,
        app_token: &str,
        table_id: &str,
        record_id: &str,
    ) -> LarkResult<bool>;
}
