//! Error category types for granular error handling.

use std::time::Duration;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Error, Debug, Clone)]
pub enum ConfigurationError {
    #[error("Missing app ID")]
    MissingAppId,

    #[error("Missing app secret")]
    MissingAppSecret,

    #[error("Invalid base URL: {url}")]
    InvalidBaseUrl { url: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Authentication-related errors.
///
/// Every variant is terminal for the current credential set: the caller must
/// re-run interactive authentication to obtain a fresh refresh token.
#[derive(Error, Debug, Clone)]
pub enum AuthenticationError {
    #[error("No refresh token is stored; interactive authentication is required")]
    RefreshTokenMissing,

    #[error("Refresh token rejected by the authorization server: {message}")]
    RefreshTokenRejected { message: String },

    #[error("Access token invalid (code {code}): {message}")]
    TokenInvalid { code: i64, message: String },

    #[error("Unauthorized (HTTP {status})")]
    Unauthorized { status: u16 },
}

/// Network-related errors. Always transient and retryable.
#[derive(Error, Debug, Clone)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timed out after {duration:?}")]
    Timeout { duration: Duration },
}

/// Errors reported by the Lark API itself.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("Bad request (code {code}): {message}")]
    BadRequest { code: i64, message: String },

    #[error("Resource not found: {message}")]
    NotFound { message: String },

    #[error("Rate limited")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Endpoint error (code {code}): {message}")]
    Endpoint { code: i64, message: String },
}

impl ApiError {
    /// Returns the server-advertised retry delay, when one is present.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ApiError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Response parsing errors.
#[derive(Error, Debug, Clone)]
pub enum ResponseError {
    #[error("Failed to deserialize response: {message}")]
    Deserialization { message: String },

    #[error("Unexpected response format: {message}")]
    UnexpectedFormat { message: String },
}

/// Durable credential storage errors.
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    #[error("Credential store I/O error: {message}")]
    Io { message: String },

    #[error("Credential store serialization error: {message}")]
    Serialization { message: String },
}

/// Input validation errors.
#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("Invalid parameter `{parameter}`: {message}")]
    InvalidParameter { parameter: String, message: String },
}
