//! Main error type for the Lark OpenAPI client.

use std::time::Duration;
use thiserror::Error;

use super::categories::*;
use crate::transport::TransportError;

/// Result type alias for Lark operations.
pub type LarkResult<T> = Result<T, LarkError>;

/// Top-level error type for the Lark integration.
#[derive(Error, Debug, Clone)]
pub enum LarkError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthenticationError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Response error: {0}")]
    Response(#[from] ResponseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl LarkError {
    /// Normalizes an arbitrary displayable failure into the closed taxonomy.
    pub fn internal(message: impl Into<String>) -> Self {
        LarkError::Internal {
            message: message.into(),
        }
    }

    /// Returns true if retrying the failed operation could succeed.
    ///
    /// Transient network failures, server-side errors, and rate limits are
    /// retryable. Authentication failures never are: an authoritative
    /// rejection cannot be changed by repeating the request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LarkError::Network(_)
                | LarkError::Api(ApiError::RateLimited { .. })
                | LarkError::Api(ApiError::Server { .. })
        )
    }

    /// Returns the server-advertised retry delay, when one is present.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LarkError::Api(e) => e.retry_after(),
            _ => None,
        }
    }

    /// Returns true if the caller must re-run interactive authentication.
    pub fn needs_reauth(&self) -> bool {
        matches!(self, LarkError::Authentication(_))
    }
}

impl From<serde_json::Error> for LarkError {
    fn from(err: serde_json::Error) -> Self {
        LarkError::Response(ResponseError::Deserialization {
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for LarkError {
    fn from(err: std::io::Error) -> Self {
        LarkError::Storage(StorageError::Io {
            message: err.to_string(),
        })
    }
}

impl From<url::ParseError> for LarkError {
    fn from(err: url::ParseError) -> Self {
        LarkError::Configuration(ConfigurationError::InvalidBaseUrl {
            url: err.to_string(),
        })
    }
}

impl From<TransportError> for LarkError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Connection(message) => {
                LarkError::Network(NetworkError::ConnectionFailed { message })
            }
            TransportError::Timeout { duration } => {
                LarkError::Network(NetworkError::Timeout { duration })
            }
            TransportError::Request(message) => LarkError::internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_errors_are_retryable() {
        let err = LarkError::Network(NetworkError::ConnectionFailed {
            message: "connection reset".into(),
        });
        assert!(err.is_retryable());

        let err = LarkError::Network(NetworkError::Timeout {
            duration: Duration::from_secs(30),
        });
        assert!(err.is_retryable());
    }

    #[test]
    fn test_auth_errors_are_terminal() {
        let err = LarkError::Authentication(AuthenticationError::RefreshTokenRejected {
            message: "invalid_grant".into(),
        });
        assert!(!err.is_retryable());
        assert!(err.needs_reauth());
    }

    #[test]
    fn test_retry_after_surfaces_from_rate_limit() {
        let err = LarkError::Api(ApiError::RateLimited {
            retry_after: Some(Duration::from_secs(7)),
        });
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));

        let err = LarkError::Api(ApiError::Server {
            status: 502,
            message: "bad gateway".into(),
        });
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), None);
    }

    #[test]
    fn test_internal_normalizes_foreign_failures() {
        let err = LarkError::internal("task join failure");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("task join failure"));
    }

    #[test]
    fn test_transport_error_conversion() {
        let err: LarkError = TransportError::Timeout {
            duration: Duration::from_secs(10),
        }
        .into();
        assert!(matches!(
            err,
            LarkError::Network(NetworkError::Timeout { .. })
        ));
    }
}
