//! Authentication and token lifecycle management.
//!
//! [`TokenManager`] is the seam callers obtain bearer tokens through;
//! [`LarkTokenManager`] implements it with transparent, single-flight
//! refresh against the Lark OAuth token endpoint.

mod manager;

pub use manager::LarkTokenManager;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

use crate::error::LarkResult;
use crate::types::StoredCredentials;

/// A bearer credential with its absolute expiry.
///
/// Tokens are replaced, never mutated: a refresh installs a new value.
#[derive(Clone)]
pub struct AccessToken {
    value: SecretString,
    /// Absolute expiry of this token.
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Create a new access token.
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: SecretString::new(value.into()),
            expires_at,
        }
    }

    /// Rebuild a token from a persisted credential document, when the
    /// document caches both the value and its expiry.
    pub(crate) fn from_stored(stored: &StoredCredentials) -> Option<Self> {
        match (&stored.access_token, stored.token_expires_at) {
            (Some(value), Some(expires_at)) => Some(Self::new(value.clone(), expires_at)),
            _ => None,
        }
    }

    /// Token value, for an `Authorization: Bearer` header.
    pub fn secret(&self) -> &str {
        self.value.expose_secret()
    }

    /// Returns true when the token expires within the given safety margin.
    pub fn is_expired_within(&self, margin: Duration) -> bool {
        match (self.expires_at - Utc::now()).to_std() {
            Ok(remaining) => remaining <= margin,
            Err(_) => true, // already past expiry
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token manager interface.
#[async_trait]
pub trait TokenManager: Send + Sync {
    /// Get a currently valid access token value, refreshing if necessary.
    async fn get_token(&self) -> LarkResult<String>;

    /// Expiry of the current cached token, or `None` if unauthenticated.
    async fn token_expiry(&self) -> Option<DateTime<Utc>>;

    /// Exchange the given refresh token for a new access token, persist the
    /// result, and return the new access token value.
    async fn refresh_token(&self, refresh_token: &str) -> LarkResult<String>;

    /// Returns true when a cached token exists outside the safety margin.
    async fn has_valid_token(&self) -> bool;
}
