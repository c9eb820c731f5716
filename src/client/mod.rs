//! HTTP client for the Lark OpenAPI surface.
//!
//! [`LarkClient`] owns the transport, token manager, and retry executor,
//! and exposes typed verbs that unwrap the standard `{code, msg, data}`
//! response envelope. Services build paths and delegate the HTTP work here.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::{LarkTokenManager, TokenManager};
use crate::config::LarkConfig;
use crate::error::{map_api_code, map_http_status, retry_after_from_header, LarkResult, ResponseError};
use crate::observability::Metrics;
use crate::resilience::RetryExecutor;
use crate::services::bitable::BitableServiceImpl;
use crate::storage::{CredentialStore, FileCredentialStore, InMemoryCredentialStore};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::types::ApiEnvelope;

fn user_agent() -> String {
    format!("integrations-lark/{}", env!("CARGO_PKG_VERSION"))
}

/// Client for the Lark OpenAPI surface.
///
/// Construct it with [`LarkClient::builder`], or [`LarkClient::from_env`]
/// to pick up `LARK_*` environment variables.
pub struct LarkClient {
    config: Arc<LarkConfig>,
    transport: Arc<dyn HttpTransport>,
    token_manager: Arc<dyn TokenManager>,
    retry: RetryExecutor,
    metrics: Arc<Metrics>,
}

impl LarkClient {
    /// Create a new client builder.
    pub fn builder() -> LarkClientBuilder {
        LarkClientBuilder::new()
    }

    /// Create a client configured from the environment.
    pub fn from_env() -> LarkResult<Self> {
        Self::builder().config(LarkConfig::from_env()?).build()
    }

    /// The active configuration.
    pub fn config(&self) -> &LarkConfig {
        &self.config
    }

    /// The token manager backing this client.
    pub fn token_manager(&self) -> Arc<dyn TokenManager> {
        Arc::clone(&self.token_manager)
    }

    /// Metrics shared by the client, token manager, and retry executor.
    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// The Bitable service.
    pub fn bitable(self: &Arc<Self>) -> BitableServiceImpl {
        BitableServiceImpl::new(Arc::clone(self))
    }

    /// Make a GET request. The path may carry a query string.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> LarkResult<T> {
        self.request(HttpMethod::Get, path, None).await
    }

    /// Make a POST request with a JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> LarkResult<T> {
        let body = Bytes::from(serde_json::to_vec(body)?);
        self.request(HttpMethod::Post, path, Some(body)).await
    }

    /// Make a PUT request with a JSON body.
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> LarkResult<T> {
        let body = Bytes::from(serde_json::to_vec(body)?);
        self.request(HttpMethod::Put, path, Some(body)).await
    }

    /// Make a DELETE request.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> LarkResult<T> {
        self.request(HttpMethod::Delete, path, None).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Bytes>,
    ) -> LarkResult<T> {
        let url = self.build_url(path);
        let response = self.execute_request(method, &url, body).await?;

        let envelope: ApiEnvelope<T> = serde_json::from_slice(&response.body)?;
        if envelope.code != 0 {
            return Err(map_api_code(envelope.code, &envelope.msg));
        }
        envelope.data.ok_or_else(|| {
            ResponseError::UnexpectedFormat {
                message: "response envelope missing data".to_string(),
            }
            .into()
        })
    }

    /// Send one logical request through the retry executor. The bearer
    /// token is resolved once up front; the token manager refreshes it
    /// when stale, so every retry reuses a token that was valid at start.
    async fn execute_request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<Bytes>,
    ) -> LarkResult<HttpResponse> {
        let token = self.token_manager.get_token().await?;

        let mut template = HttpRequest::new(method, url)
            .with_header("authorization", format!("Bearer {}", token))
            .with_header("accept", "application/json")
            .with_header("user-agent", user_agent());
        if let Some(body) = body {
            template = template.with_json_body(body);
        }

        self.metrics.record_request();
        let started = Instant::now();

        let transport = Arc::clone(&self.transport);
        let result = self
            .retry
            .execute(|| {
                let transport = Arc::clone(&transport);
                let request = template.clone();
                async move {
                    let response = transport.send(request).await?;
                    if !response.is_success() {
                        let retry_after = retry_after_from_header(response.header("retry-after"));
                        return Err(map_http_status(response.status, &response.body, retry_after));
                    }
                    Ok(response)
                }
            })
            .await;

        self.metrics.record_latency(started.elapsed());
        if result.is_err() {
            self.metrics.record_failure();
        }
        result
    }

    fn build_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl std::fmt::Debug for LarkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LarkClient")
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for [`LarkClient`].
///
/// Every dependency can be swapped, which is how the tests inject mock
/// transports and canned token managers.
#[derive(Default)]
pub struct LarkClientBuilder {
    config: Option<LarkConfig>,
    transport: Option<Arc<dyn HttpTransport>>,
    store: Option<Arc<dyn CredentialStore>>,
    token_manager: Option<Arc<dyn TokenManager>>,
}

impl LarkClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration.
    pub fn config(mut self, config: LarkConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a custom transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom credential store.
    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a custom token manager.
    pub fn token_manager(mut self, token_manager: Arc<dyn TokenManager>) -> Self {
        self.token_manager = Some(token_manager);
        self
    }

    /// Build the client.
    ///
    /// Defaults: a [`ReqwestTransport`], a [`FileCredentialStore`] when the
    /// configuration names a credentials path (in-memory otherwise), and a
    /// [`LarkTokenManager`] over those.
    pub fn build(self) -> LarkResult<LarkClient> {
        let config = match self.config {
            Some(config) => config,
            None => LarkConfig::from_env()?,
        };
        let config = Arc::new(config);
        let metrics = Arc::new(Metrics::new());

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(config.timeout, config.connect_timeout)?),
        };

        let store: Arc<dyn CredentialStore> = match self.store {
            Some(store) => store,
            None => match &config.credentials_path {
                Some(path) => Arc::new(FileCredentialStore::new(path.clone())),
                None => Arc::new(InMemoryCredentialStore::new()),
            },
        };

        let token_manager: Arc<dyn TokenManager> = match self.token_manager {
            Some(token_manager) => token_manager,
            None => Arc::new(
                LarkTokenManager::new(
                    Arc::clone(&config),
                    Arc::clone(&transport),
                    Arc::clone(&store),
                )
                .with_metrics(Arc::clone(&metrics)),
            ),
        };

        let retry = RetryExecutor::new(config.retry.clone()).with_metrics(Arc::clone(&metrics));

        Ok(LarkClient {
            config,
            transport,
            token_manager,
            retry,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AuthenticationError, LarkError};
    use crate::mocks::{MockHttpTransport, MockTokenManager};
    use crate::resilience::RetryPolicy;
    use secrecy::SecretString;
    use serde_json::json;
    use std::time::Duration;

    fn test_client(transport: Arc<MockHttpTransport>) -> LarkClient {
        let config = LarkConfig::builder()
            .app_id("cli_a1b2c3")
            .app_secret(SecretString::new("s3cr3t".into()))
            .retry(RetryPolicy::new(
                2,
                Duration::from_millis(1),
                Duration::from_millis(5),
            ))
            .build()
            .unwrap();
        LarkClient::builder()
            .config(config)
            .transport(transport)
            .token_manager(Arc::new(MockTokenManager::new().with_token("t-test")))
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_url() {
        let client = test_client(Arc::new(MockHttpTransport::new()));
        assert_eq!(
            client.build_url("/open-apis/bitable/v1/apps/a/tables"),
            "https://open.larksuite.com/open-apis/bitable/v1/apps/a/tables"
        );
        assert_eq!(
            client.build_url("open-apis/bitable/v1/apps/a/tables"),
            "https://open.larksuite.com/open-apis/bitable/v1/apps/a/tables"
        );
    }

    #[tokio::test]
    async fn test_get_unwraps_envelope_and_sends_bearer() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_json_response(200, &json!({"code": 0, "msg": "success", "data": {"value": 7}}));
        let client = test_client(transport.clone());

        let data: serde_json::Value = client.get("/ping").await.unwrap();
        assert_eq!(data["value"], 7);

        let request = transport.last_request().unwrap();
        assert_eq!(
            request.headers.get("authorization").map(String::as_str),
            Some("Bearer t-test")
        );
        assert!(request
            .headers
            .get("user-agent")
            .unwrap()
            .starts_with("integrations-lark/"));
    }

    #[tokio::test]
    async fn test_api_code_maps_to_endpoint_error() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_json_response(
            200,
            &json!({"code": 1254004, "msg": "table not found"}),
        );
        let client = test_client(transport);

        let err = client
            .get::<serde_json::Value>("/open-apis/bitable/v1/apps/a/tables/x/records")
            .await
            .unwrap_err();
        assert!(matches!(err, LarkError::Api(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_data_is_rejected() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_json_response(200, &json!({"code": 0, "msg": "success"}));
        let client = test_client(transport);

        let err = client.get::<serde_json::Value>("/ping").await.unwrap_err();
        assert!(matches!(err, LarkError::Response(_)));
    }

    #[tokio::test]
    async fn test_rate_limited_request_is_retried() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_rate_limited(0);
        transport.enqueue_json_response(200, &json!({"code": 0, "data": {"ok": true}}));
        let client = test_client(transport.clone());

        let data: serde_json::Value = client.get("/ping").await.unwrap();
        assert_eq!(data["ok"], true);
        assert_eq!(transport.request_count(), 2);
        assert_eq!(client.metrics().snapshot().retries, 1);
    }

    #[tokio::test]
    async fn test_auth_rejection_is_not_retried() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_json_response(
            401,
            &json!({"code": 99991668, "msg": "access token invalid"}),
        );
        let client = test_client(transport.clone());

        let err = client.get::<serde_json::Value>("/ping").await.unwrap_err();
        assert!(matches!(err, LarkError::Authentication(_)));
        assert_eq!(transport.request_count(), 1);
        assert_eq!(client.metrics().snapshot().requests_failed, 1);
    }

    #[tokio::test]
    async fn test_token_manager_failure_short_circuits() {
        let transport = Arc::new(MockHttpTransport::new());
        let manager = Arc::new(MockTokenManager::new());
        manager.set_next_error(AuthenticationError::RefreshTokenMissing.into());

        let config = LarkConfig::builder()
            .app_id("cli_a1b2c3")
            .app_secret(SecretString::new("s3cr3t".into()))
            .build()
            .unwrap();
        let client = LarkClient::builder()
            .config(config)
            .transport(transport.clone())
            .token_manager(manager)
            .build()
            .unwrap();

        let err = client.get::<serde_json::Value>("/ping").await.unwrap_err();
        assert!(err.needs_reauth());
        assert_eq!(transport.request_count(), 0);
    }
}
