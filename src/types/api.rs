//! Response envelope shared by Lark OpenAPI endpoints.

use serde::Deserialize;

/// Standard Lark response envelope: `{ "code": 0, "msg": "success", "data": … }`.
///
/// A zero `code` means success; any other value is an application-level
/// failure described by `msg`, in which case `data` is typically absent.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Application status code; zero on success.
    pub code: i64,
    /// Human-readable status message.
    #[serde(default)]
    pub msg: String,
    /// Payload, present on success.
    pub data: Option<T>,
}
