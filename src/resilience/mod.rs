//! Resilience layer for the Lark OpenAPI client.
//!
//! Provides bounded exponential-backoff retry for transient failures. The
//! token refresh path and every client request run through [`RetryExecutor`].

mod retry;

pub use retry::{RetryExecutor, RetryObserver, RetryPolicy};
