//! Token lifecycle manager backed by the Lark OAuth token endpoint.
//!
//! Responsibilities:
//! - serve cached access tokens while they remain outside the safety margin
//! - refresh transparently, collapsing concurrent callers into one exchange
//! - persist every successful refresh atomically so a process restart can
//!   resume from the most recently issued refresh token

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde_json::json;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::auth::{AccessToken, TokenManager};
use crate::config::LarkConfig;
use crate::error::{
    map_token_error, AuthenticationError, LarkError, LarkResult, ResponseError,
};
use crate::observability::Metrics;
use crate::resilience::RetryExecutor;
use crate::storage::CredentialStore;
use crate::transport::{HttpMethod, HttpRequest, HttpTransport};
use crate::types::{StoredCredentials, TokenResponse};

/// Path of the user access token endpoint, relative to the base URL.
const TOKEN_ENDPOINT_PATH: &str = "open-apis/authen/v2/oauth/token";

/// Token manager for Lark user access tokens.
///
/// Tokens are cached in memory and re-validated against the configured
/// safety margin on every [`get_token`](TokenManager::get_token) call.
/// A stale cache triggers a refresh through the token endpoint; concurrent
/// callers that observe the same stale token wait on a single in-flight
/// exchange instead of issuing their own.
pub struct LarkTokenManager {
    config: Arc<LarkConfig>,
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn CredentialStore>,
    retry: RetryExecutor,
    metrics: Arc<Metrics>,
    current: RwLock<Option<AccessToken>>,
    refresh_gate: Mutex<()>,
}

impl LarkTokenManager {
    /// Create a new token manager.
    pub fn new(
        config: Arc<LarkConfig>,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        let metrics = Arc::new(Metrics::new());
        let retry = RetryExecutor::new(config.retry.clone()).with_metrics(Arc::clone(&metrics));
        Self {
            config,
            transport,
            store,
            retry,
            metrics,
            current: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Share a metrics registry with the rest of the client.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.retry =
            RetryExecutor::new(self.config.retry.clone()).with_metrics(Arc::clone(&metrics));
        self.metrics = metrics;
        self
    }

    /// Metrics recorded by this manager.
    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.as_str().trim_end_matches('/'),
            TOKEN_ENDPOINT_PATH
        )
    }

    fn is_stale(&self, token: &AccessToken) -> bool {
        token.is_expired_within(self.config.token_refresh_buffer)
    }

    async fn cached_if_fresh(&self) -> Option<String> {
        let guard = self.current.read().await;
        match guard.as_ref() {
            Some(token) if !self.is_stale(token) => Some(token.secret().to_string()),
            _ => None,
        }
    }

    /// Exchange a refresh token at the token endpoint, with retries for
    /// transient failures. Rejections (`invalid_grant` and friends) map to
    /// [`AuthenticationError`] and are never retried.
    async fn exchange_refresh_token(&self, refresh_token: &str) -> LarkResult<TokenResponse> {
        let url = self.token_url();

        // Build the request once, outside the retry closure; each attempt
        // clones it.
        let body = Bytes::from(serde_json::to_vec(&json!({
            "grant_type": "refresh_token",
            "client_id": self.config.app_id,
            "client_secret": self.config.app_secret.expose_secret(),
            "refresh_token": refresh_token,
        }))?);
        let template = HttpRequest::new(HttpMethod::Post, url)
            .with_header("accept", "application/json")
            .with_json_body(body);

        let transport = Arc::clone(&self.transport);
        self.retry
            .execute(|| {
                let transport = Arc::clone(&transport);
                let request = template.clone();
                async move {
                    let response = transport.send(request).await?;
                    if !response.is_success() {
                        return Err(map_token_error(response.status, &response.body));
                    }
                    let token_response: TokenResponse = serde_json::from_slice(&response.body)?;
                    if token_response.code != 0 || token_response.error.is_some() {
                        return Err(map_token_error(response.status, &response.body));
                    }
                    Ok(token_response)
                }
            })
            .await
    }

    /// Run a refresh and persist its outcome. Callers must hold the
    /// refresh gate.
    async fn refresh_and_store(
        &self,
        stored: Option<StoredCredentials>,
        refresh_token: &str,
    ) -> LarkResult<String> {
        debug!("refreshing access token");
        let token_response = match self.exchange_refresh_token(refresh_token).await {
            Ok(response) => response,
            Err(e) => {
                self.metrics.record_token_refresh_failure();
                warn!(error = %e, "token refresh failed");
                return Err(e);
            }
        };

        let access_token = token_response
            .access_token
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                self.metrics.record_token_refresh_failure();
                LarkError::from(ResponseError::UnexpectedFormat {
                    message: "token endpoint response missing access_token".to_string(),
                })
            })?;
        let expires_in = token_response.expires_in.ok_or_else(|| {
            self.metrics.record_token_refresh_failure();
            LarkError::from(ResponseError::UnexpectedFormat {
                message: "token endpoint response missing expires_in".to_string(),
            })
        })?;
        let expires_at = Utc::now() + chrono::Duration::seconds(expires_in as i64);

        let mut credentials = stored.unwrap_or_else(|| {
            StoredCredentials::new(&self.config.app_id, self.config.app_secret.expose_secret())
        });
        credentials.access_token = Some(access_token.clone());
        credentials.token_expires_at = Some(expires_at);
        // The endpoint may rotate the refresh token. Persist the rotated
        // value when present, otherwise the one that just succeeded.
        credentials.refresh_token = Some(
            token_response
                .refresh_token
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| refresh_token.to_string()),
        );
        credentials.stored_at = Utc::now();
        self.store.save(&credentials).await?;

        *self.current.write().await = Some(AccessToken::new(access_token.clone(), expires_at));
        self.metrics.record_token_refresh();
        info!(expires_at = %expires_at, "access token refreshed");
        Ok(access_token)
    }
}

#[async_trait]
impl TokenManager for LarkTokenManager {
    async fn get_token(&self) -> LarkResult<String> {
        // Fast path: cached token still outside the safety margin.
        if let Some(value) = self.cached_if_fresh().await {
            self.metrics.record_token_cache_hit();
            return Ok(value);
        }

        let _gate = self.refresh_gate.lock().await;

        // Re-check under the gate: another caller may have finished the
        // refresh while we waited.
        if let Some(value) = self.cached_if_fresh().await {
            self.metrics.record_token_cache_hit();
            return Ok(value);
        }

        // The persisted document is authoritative once the gate is held.
        // A previous process may have left a still-valid access token.
        let stored = self.store.load().await?;
        if let Some(token) = stored.as_ref().and_then(AccessToken::from_stored) {
            if !self.is_stale(&token) {
                let value = token.secret().to_string();
                *self.current.write().await = Some(token);
                debug!("adopted persisted access token");
                return Ok(value);
            }
        }

        let refresh_token = stored
            .as_ref()
            .and_then(|credentials| credentials.refresh_token.clone())
            .filter(|value| !value.trim().is_empty())
            .ok_or(AuthenticationError::RefreshTokenMissing)?;

        self.refresh_and_store(stored, &refresh_token).await
    }

    async fn token_expiry(&self) -> Option<DateTime<Utc>> {
        self.current.read().await.as_ref().map(|t| t.expires_at)
    }

    async fn refresh_token(&self, refresh_token: &str) -> LarkResult<String> {
        if refresh_token.trim().is_empty() {
            return Err(AuthenticationError::RefreshTokenMissing.into());
        }
        let _gate = self.refresh_gate.lock().await;
        let stored = self.store.load().await?;
        self.refresh_and_store(stored, refresh_token).await
    }

    async fn has_valid_token(&self) -> bool {
        self.cached_if_fresh().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LarkConfig;
    use crate::mocks::MockHttpTransport;
    use crate::resilience::RetryPolicy;
    use crate::storage::InMemoryCredentialStore;
    use secrecy::SecretString;
    use std::time::Duration;

    fn test_config() -> Arc<LarkConfig> {
        Arc::new(
            LarkConfig::builder()
                .app_id("cli_a1b2c3")
                .app_secret(SecretString::new("s3cr3t".into()))
                .retry(RetryPolicy::new(
                    2,
                    Duration::from_millis(1),
                    Duration::from_millis(5),
                ))
                .build()
                .unwrap(),
        )
    }

    fn seeded_store(refresh_token: &str) -> Arc<InMemoryCredentialStore> {
        let mut credentials = StoredCredentials::new("cli_a1b2c3", "s3cr3t");
        credentials.refresh_token = Some(refresh_token.to_string());
        Arc::new(InMemoryCredentialStore::with_credentials(credentials))
    }

    fn token_body(token: &str, refresh: Option<&str>) -> serde_json::Value {
        json!({
            "code": 0,
            "access_token": token,
            "token_type": "Bearer",
            "expires_in": 7200,
            "refresh_token": refresh,
        })
    }

    #[tokio::test]
    async fn test_get_token_refreshes_on_first_use() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_json_response(200, &token_body("t-first", Some("r-next")));
        let store = seeded_store("r-seed");
        let manager = LarkTokenManager::new(test_config(), transport.clone(), store.clone());

        let token = manager.get_token().await.unwrap();
        assert_eq!(token, "t-first");
        assert!(manager.token_expiry().await.unwrap() > Utc::now());
        assert_eq!(transport.request_count(), 1);

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert!(request.url.ends_with("/open-apis/authen/v2/oauth/token"));
        let body: serde_json::Value =
            serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
        assert_eq!(body["grant_type"], "refresh_token");
        assert_eq!(body["refresh_token"], "r-seed");

        // Rotated refresh token persisted.
        let stored = store.load().await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("r-next"));
        assert_eq!(stored.access_token.as_deref(), Some("t-first"));
    }

    #[tokio::test]
    async fn test_second_get_token_hits_cache() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_json_response(200, &token_body("t-first", None));
        let manager =
            LarkTokenManager::new(test_config(), transport.clone(), seeded_store("r-seed"));

        let first = manager.get_token().await.unwrap();
        let second = manager.get_token().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(transport.request_count(), 1);
        assert_eq!(manager.metrics().snapshot().token_cache_hits, 1);
    }

    #[tokio::test]
    async fn test_refresh_preserves_token_when_not_rotated() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_json_response(200, &token_body("t-first", None));
        let store = seeded_store("r-seed");
        let manager = LarkTokenManager::new(test_config(), transport, store.clone());

        manager.get_token().await.unwrap();
        let stored = store.load().await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("r-seed"));
    }

    #[tokio::test]
    async fn test_invalid_grant_is_terminal() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_json_response(
            400,
            &json!({
                "code": 20037,
                "error": "invalid_grant",
                "error_description": "refresh token expired",
            }),
        );
        let manager =
            LarkTokenManager::new(test_config(), transport.clone(), seeded_store("r-dead"));

        let err = manager.get_token().await.unwrap_err();
        assert!(matches!(err, LarkError::Authentication(_)));
        assert!(err.needs_reauth());
        // No retries for a rejected grant.
        assert_eq!(transport.request_count(), 1);
        assert_eq!(manager.metrics().snapshot().token_refresh_failures, 1);
    }

    #[tokio::test]
    async fn test_oauth_error_in_ok_body_is_terminal() {
        // Some gateways deliver the rejection with a 200 status.
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_json_response(
            200,
            &json!({
                "error": "invalid_grant",
                "error_description": "refresh token expired",
            }),
        );
        let manager =
            LarkTokenManager::new(test_config(), transport.clone(), seeded_store("r-dead"));

        let err = manager.get_token().await.unwrap_err();
        assert!(matches!(err, LarkError::Authentication(_)));
        assert!(err.needs_reauth());
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_json_response(503, &json!({"error": "unavailable"}));
        transport.enqueue_json_response(200, &token_body("t-after-retry", None));
        let manager =
            LarkTokenManager::new(test_config(), transport.clone(), seeded_store("r-seed"));

        let token = manager.get_token().await.unwrap();
        assert_eq!(token, "t-after-retry");
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_refresh_token() {
        let transport = Arc::new(MockHttpTransport::new());
        let store = Arc::new(InMemoryCredentialStore::new());
        let manager = LarkTokenManager::new(test_config(), transport.clone(), store);

        let err = manager.get_token().await.unwrap_err();
        assert!(matches!(
            err,
            LarkError::Authentication(AuthenticationError::RefreshTokenMissing)
        ));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_adopts_persisted_access_token() {
        let transport = Arc::new(MockHttpTransport::new());
        let mut credentials = StoredCredentials::new("cli_a1b2c3", "s3cr3t");
        credentials.refresh_token = Some("r-seed".to_string());
        credentials.access_token = Some("t-from-disk".to_string());
        credentials.token_expires_at = Some(Utc::now() + chrono::Duration::hours(2));
        let store = Arc::new(InMemoryCredentialStore::with_credentials(credentials));
        let manager = LarkTokenManager::new(test_config(), transport.clone(), store);

        let token = manager.get_token().await.unwrap();
        assert_eq!(token, "t-from-disk");
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_explicit_refresh_persists_provided_token() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_json_response(200, &token_body("t-explicit", None));
        let store = Arc::new(InMemoryCredentialStore::new());
        let manager = LarkTokenManager::new(test_config(), transport, store.clone());

        let token = manager.refresh_token("r-handed-in").await.unwrap();
        assert_eq!(token, "t-explicit");
        let stored = store.load().await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("r-handed-in"));
    }

    #[tokio::test]
    async fn test_explicit_refresh_rejects_blank_token() {
        let transport = Arc::new(MockHttpTransport::new());
        let manager = LarkTokenManager::new(
            test_config(),
            transport.clone(),
            Arc::new(InMemoryCredentialStore::new()),
        );

        let err = manager.refresh_token("  ").await.unwrap_err();
        assert!(matches!(
            err,
            LarkError::Authentication(AuthenticationError::RefreshTokenMissing)
        ));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_response_missing_access_token_is_rejected() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_json_response(200, &json!({"code": 0, "expires_in": 7200}));
        let manager =
            LarkTokenManager::new(test_config(), transport, seeded_store("r-seed"));

        let err = manager.get_token().await.unwrap_err();
        assert!(matches!(err, LarkError::Response(_)));
        assert!(!manager.has_valid_token().await);
    }
}
