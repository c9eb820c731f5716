//! Bitable service implementation over the shared client.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::client::LarkClient;
use crate::error::LarkResult;
use crate::types::{
    DeleteRecordResponse, ListRecordsParams, ListRecordsResponse, ListTablesParams,
    ListTablesResponse, RecordFields, RecordResponse, TableRecord,
};

use super::validation::{clamp_page_size, validate_identifier};
use super::BitableService;

/// Page size used when walking a whole table.
const LIST_ALL_PAGE_SIZE: u32 = 500;

/// Bitable service backed by a [`LarkClient`].
pub struct BitableServiceImpl {
    client: Arc<LarkClient>,
}

impl BitableServiceImpl {
    /// Create a new Bitable service.
    pub fn new(client: Arc<LarkClient>) -> Self {
        Self { client }
    }

    // Identifiers and query values are caller-supplied; percent-encode
    // them so reserved characters survive the trip.
    fn tables_path(app_token: &str) -> String {
        format!(
            "/open-apis/bitable/v1/apps/{}/tables",
            urlencoding::encode(app_token)
        )
    }

    fn records_path(app_token: &str, table_id: &str) -> String {
        format!(
            "/open-apis/bitable/v1/apps/{}/tables/{}/records",
            urlencoding::encode(app_token),
            urlencoding::encode(table_id)
        )
    }

    fn record_path(app_token: &str, table_id: &str, record_id: &str) -> String {
        format!(
            "{}/{}",
            Self::records_path(app_token, table_id),
            urlencoding::encode(record_id)
        )
    }

    fn tables_query(params: &ListTablesParams) -> String {
        let mut query = Vec::new();
        if let Some(page_size) = params.page_size {
            query.push(format!("page_size={}", clamp_page_size(page_size)));
        }
        if let Some(ref page_token) = params.page_token {
            query.push(format!("page_token={}", urlencoding::encode(page_token)));
        }
        if query.is_empty() {
            String::new()
        } else {
            format!("?{}", query.join("&"))
        }
    }

    fn records_query(params: &ListRecordsParams) -> String {
        let mut query = Vec::new();
        if let Some(page_size) = params.page_size {
            query.push(format!("page_size={}", clamp_page_size(page_size)));
        }
        if let Some(ref page_token) = params.page_token {
            query.push(format!("page_token={}", urlencoding::encode(page_token)));
        }
        if let Some(ref view_id) = params.view_id {
            query.push(format!("view_id={}", urlencoding::encode(view_id)));
        }
        if let Some(ref filter) = params.filter {
            query.push(format!("filter={}", urlencoding::encode(filter)));
        }
        if query.is_empty() {
            String::new()
        } else {
            format!("?{}", query.join("&"))
        }
    }
}

#[async_trait]
impl BitableService for BitableServiceImpl {
    async fn list_tables(
        &self,
        app_token: &str,
        params: Option<ListTablesParams>,
    ) -> LarkResult<ListTablesResponse> {
        validate_identifier("app_token", app_token)?;

        let mut path = Self::tables_path(app_token);
        if let Some(params) = params {
            path.push_str(&Self::tables_query(&params));
        }
        self.client.get(&path).await
    }

    async fn list_records(
        &self,
        app_token: &str,
        table_id: &str,
        params: Option<ListRecordsParams>,
    ) -> LarkResult<ListRecordsResponse> {
        validate_identifier("app_token", app_token)?;
        validate_identifier("table_id", table_id)?;

        let mut path = Self::records_path(app_token, table_id);
        if let Some(params) = params {
            path.push_str(&Self::records_query(&params));
        }
        self.client.get(&path).await
    }

    async fn list_all_records(
        &self,
        app_token: &str,
        table_id: &str,
        params: Option<ListRecordsParams>,
    ) -> LarkResult<Vec<TableRecord>> {
        let mut params = params.unwrap_or_default();
        if params.page_size.is_none() {
            params.page_size = Some(LIST_ALL_PAGE_SIZE);
        }

        let mut all_records = Vec::new();
        let mut page_token = params.page_token.take();

        loop {
            let page_params = ListRecordsParams {
                page_token: page_token.clone(),
                ..params.clone()
            };
            let page = self
                .list_records(app_token, table_id, Some(page_params))
                .await?;
            all_records.extend(page.items);

            if !page.has_more {
                break;
            }
            match page.page_token {
                Some(token) => page_token = Some(token),
                None => {
                    // More pages claimed but no cursor to follow.
                    warn!(table_id = %table_id, "server reported more pages without a page token");
                    break;
                }
            }
        }

        debug!(
            table_id = %table_id,
            records = all_records.len(),
            "listed all records"
        );
        Ok(all_records)
    }

    async fn get_record(
        &self,
        app_token: &str,
        table_id: &str,
        record_id: &str,
    ) -> LarkResult<TableRecord> {
        validate_identifier("app_token", app_token)?;
        validate_identifier("table_id", table_id)?;
        validate_identifier("record_id", record_id)?;

        let path = Self::record_path(app_token, table_id, record_id);
        let response: RecordResponse = self.client.get(&path).await?;
        Ok(response.record)
    }

    async fn create_record(
        &self,
        app_token: &str,
        table_id: &str,
        fields: Map<String, Value>,
    ) -> LarkResult<TableRecord> {
        validate_identifier("app_token", app_token)?;
        validate_identifier("table_id", table_id)?;

        let path = Self::records_path(app_token, table_id);
        let body = RecordFields::new(fields);
        let response: RecordResponse = self.client.post(&path, &body).await?;
        Ok(response.record)
    }

    async fn update_record(
        &self,
        app_token: &str,
        table_id: &str,
        record_id: &str,
        fields: Map<String, Value>,
    ) -> LarkResult<TableRecord> {
        validate_identifier("app_token", app_token)?;
        validate_identifier("table_id", table_id)?;
        validate_identifier("record_id", record_id)?;

        let path = Self::record_path(app_token, table_id, record_id);
        let body = RecordFields::new(fields);
        let response: RecordResponse = self.client.put(&path, &body).await?;
        Ok(response.record)
    }

    async fn delete_record(
        &self,
        app_token: &str,
        table_id: &str,
        record_id: &str,
    ) -> LarkResult<bool> {
        validate_identifier("app_token", app_token)?;
        validate_identifier("table_id", table_id)?;
        validate_identifier("record_id", record_id)?;

        let path = Self::record_path(app_token, table_id, record_id);
        let response: DeleteRecordResponse = self.client.delete(&path).await?;
        Ok(response.deleted)
    }
}
