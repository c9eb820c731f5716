//! Token wire and storage types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response from the Lark OAuth token endpoint.
///
/// Lark wraps the RFC 6749 fields in its envelope `code`; rejection bodies
/// carry `error`/`error_description` instead. `error` is modeled here so a
/// rejection delivered with a 2xx status is still recognized; the full
/// rejection body is parsed by the error mapper.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    /// Envelope code; zero on success.
    #[serde(default)]
    pub code: i64,
    /// RFC 6749 error code, present on rejection bodies.
    #[serde(default)]
    pub error: Option<String>,
    /// Access token. Absent on rejection bodies.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Token type (usually "Bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Access token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Rotated refresh token, when the server issues one.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Credential document persisted to durable storage.
///
/// The whole document is rewritten atomically on each successful refresh:
/// `refresh_token` is the long-lived credential, while `access_token` and
/// `token_expires_at` cache the current bearer so a restarted process can
/// skip the first refresh.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Application identifier.
    pub app_id: String,
    /// Application secret.
    pub app_secret: String,
    /// Long-lived refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Cached access token from the most recent refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Expiry of the cached access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_expires_at: Option<DateTime<Utc>>,
    /// When this document was last written.
    pub stored_at: DateTime<Utc>,
}

impl StoredCredentials {
    /// Create a credential document with no tokens yet.
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            refresh_token: None,
            access_token: None,
            token_expires_at: None,
            stored_at: Utc::now(),
        }
    }

    /// Returns true when a refresh token is stored.
    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }
}

impl std::fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("token_expires_at", &self.token_expires_at)
            .field("stored_at", &self.stored_at)
            .finish()
    }
}
