//! # Lark OpenAPI Client
//!
//! Rust client for the Lark (Feishu) OpenAPI, centered on Bitable
//! multi-dimensional tables and user access token lifecycle management.
//!
//! ## Features
//!
//! - Bitable operations: tables, records, full-table pagination
//! - Transparent user access token refresh with single-flight
//!   de-duplication across concurrent callers
//! - Durable credential persistence with atomic file replacement
//! - Retrying of transient failures with exponential backoff
//! - Closed error taxonomy separating terminal authentication failures
//!   from retryable transport and server errors
//! - Structured logging via `tracing` and built-in counters
//! - Secure credential handling with `SecretString`
//! - Mock seams for transport, storage, and token management
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use integrations_lark::{BitableService, LarkClient, LarkConfig};
//! use secrecy::SecretString;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LarkConfig::builder()
//!         .app_id("cli_your_app_id")
//!         .app_secret(SecretString::new("your-app-secret".into()))
//!         .credentials_path("lark-credentials.json")
//!         .build()?;
//!
//!     let client = Arc::new(LarkClient::builder().config(config).build()?);
//!
//!     // Or pick up LARK_* environment variables:
//!     // let client = Arc::new(LarkClient::from_env()?);
//!
//!     let bitable = client.bitable();
//!     let records = bitable
//!         .list_all_records("bascnCMII2ORej2RItqpZZUNMIe", "tblsRc9GRRXKqhvW", None)
//!         .await?;
//!     println!("fetched {} records", records.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - `client` - Main client and builder
//! - `config` - Configuration types and builder
//! - `auth` - Token lifecycle management
//! - `storage` - Credential persistence
//! - `transport` - HTTP transport layer
//! - `resilience` - Retry with exponential backoff
//! - `error` - Error types and taxonomy
//! - `types` - Wire types (envelope, tokens, Bitable records)
//! - `services` - Service implementations (bitable)

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod observability;
pub mod resilience;
pub mod services;
pub mod storage;
pub mod transport;
pub mod types;

// Development/testing modules - always available for integration tests
pub mod mocks;

// Re-exports for convenience
pub use auth::{AccessToken, LarkTokenManager, TokenManager};
pub use client::{LarkClient, LarkClientBuilder};
pub use config::{
    LarkConfig, LarkConfigBuilder, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_TIMEOUT_SECS, DEFAULT_TOKEN_REFRESH_BUFFER_SECS,
};
pub use error::{
    // Main error types
    LarkError,
    LarkResult,
    // Error categories
    ApiError,
    AuthenticationError,
    ConfigurationError,
    NetworkError,
    ResponseError,
    StorageError,
    ValidationError,
    // Error mapping utilities
    map_api_code,
    map_http_status,
    map_token_error,
};
pub use observability::{Metrics, MetricsSnapshot};
pub use resilience::{RetryExecutor, RetryObserver, RetryPolicy};
pub use services::{BitableService, BitableServiceImpl, MAX_PAGE_SIZE, MIN_PAGE_SIZE};
pub use storage::{CredentialStore, FileCredentialStore, InMemoryCredentialStore};
pub use transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError,
};
pub use types::{
    // Envelope and token types
    ApiEnvelope, StoredCredentials, TokenResponse,
    // Bitable types
    AppTable, DeleteRecordResponse, ListRecordsParams, ListRecordsResponse, ListTablesParams,
    ListTablesResponse, RecordFields, RecordResponse, TableRecord,
};
