//! Shared wire types.

mod api;
mod bitable;
mod token;

pub use api::ApiEnvelope;
pub use bitable::{
    AppTable, DeleteRecordResponse, ListRecordsParams, ListRecordsResponse, ListTablesParams,
    ListTablesResponse, RecordFields, RecordResponse, TableRecord,
};
pub use token::{StoredCredentials, TokenResponse};
