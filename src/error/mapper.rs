//! Error mapping utilities for HTTP status codes and Lark API responses.

use std::time::Duration;

use serde::Deserialize;

use super::categories::*;
use super::types::LarkError;

/// First code in the Lark token-invalid family (expired, revoked, or
/// malformed access tokens across the OpenAPI surface).
const AUTH_CODE_MIN: i64 = 99_991_661;
/// Last code in the Lark token-invalid family.
const AUTH_CODE_MAX: i64 = 99_991_668;

/// Error payload shapes returned by Lark endpoints. Regular endpoints use
/// `code`/`msg`; the OAuth token endpoint adds RFC 6749 `error` fields.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl ErrorBody {
    fn parse(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or(ErrorBody {
            code: None,
            msg: None,
            error: None,
            error_description: None,
        })
    }

    fn message(&self, body: &[u8]) -> String {
        self.msg
            .clone()
            .or_else(|| self.error_description.clone())
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| String::from_utf8_lossy(body).to_string())
    }
}

/// Returns true for codes in the Lark token-invalid family.
fn is_auth_code(code: i64) -> bool {
    (AUTH_CODE_MIN..=AUTH_CODE_MAX).contains(&code)
}

/// Maps a non-2xx response from a regular Lark endpoint to an error variant.
pub fn map_http_status(status: u16, body: &[u8], retry_after: Option<Duration>) -> LarkError {
    let parsed = ErrorBody::parse(body);
    let message = parsed.message(body);
    let code = parsed.code.unwrap_or(0);

    match status {
        401 | 403 => {
            if is_auth_code(code) {
                LarkError::Authentication(AuthenticationError::TokenInvalid { code, message })
            } else {
                LarkError::Authentication(AuthenticationError::Unauthorized { status })
            }
        }
        404 => LarkError::Api(ApiError::NotFound { message }),
        429 => LarkError::Api(ApiError::RateLimited { retry_after }),
        500..=599 => LarkError::Api(ApiError::Server { status, message }),
        _ => LarkError::Api(ApiError::BadRequest { code, message }),
    }
}

/// Maps a non-zero envelope `code` from a 2xx Lark response to an error
/// variant. Lark reports most application-level failures this way.
pub fn map_api_code(code: i64, msg: &str) -> LarkError {
    if is_auth_code(code) {
        LarkError::Authentication(AuthenticationError::TokenInvalid {
            code,
            message: msg.to_string(),
        })
    } else {
        LarkError::Api(ApiError::Endpoint {
            code,
            message: msg.to_string(),
        })
    }
}

/// Maps a failed response from the OAuth token endpoint to an error variant.
///
/// A 4xx answer is an authoritative rejection of the exchange (`invalid_grant`
/// and friends) and is terminal; only 5xx answers are treated as retryable.
pub fn map_token_error(status: u16, body: &[u8]) -> LarkError {
    let parsed = ErrorBody::parse(body);
    let message = parsed.message(body);

    match status {
        500..=599 => LarkError::Api(ApiError::Server { status, message }),
        _ => LarkError::Authentication(AuthenticationError::RefreshTokenRejected { message }),
    }
}

/// Parses a `Retry-After` header value (delta-seconds form) into a delay.
pub fn retry_after_from_header(value: Option<&str>) -> Option<Duration> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
