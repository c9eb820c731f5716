//! Transport layer error types.

use std::time::Duration;

/// Transport error.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Request timed out after {duration:?}")]
    Timeout { duration: Duration },
    #[error("Request error: {0}")]
    Request(String),
}
