//! Configuration types for the Lark OpenAPI client.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::{ConfigurationError, LarkError};
use crate::resilience::RetryPolicy;

/// Default Lark OpenAPI base URL (international tenancy).
pub const DEFAULT_BASE_URL: &str = "https://open.larksuite.com";

/// Default request timeout (30 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default connect timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default safety margin before token expiry (300 seconds).
///
/// A cached token whose remaining lifetime is inside this window is treated
/// as already expired and refreshed before use.
pub const DEFAULT_TOKEN_REFRESH_BUFFER_SECS: u64 = 300;

/// Configuration for the Lark client.
#[derive(Clone, Debug)]
pub struct LarkConfig {
    /// Application identifier issued by the Lark developer console.
    pub app_id: String,
    /// Application secret (required for token refresh).
    pub app_secret: SecretString,
    /// Base URL for the OpenAPI surface.
    pub base_url: Url,
    /// Default timeout for requests.
    pub timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Safety margin before token expiry.
    pub token_refresh_buffer: Duration,
    /// Retry policy applied to requests and token refreshes.
    pub retry: RetryPolicy,
    /// Path of the durable credentials file, when file storage is used.
    pub credentials_path: Option<PathBuf>,
}

impl LarkConfig {
    /// Create a new configuration builder.
    pub fn builder() -> LarkConfigBuilder {
        LarkConfigBuilder::default()
    }

    /// Create configuration from environment variables.
    ///
    /// Reads:
    /// - `LARK_APP_ID` (required)
    /// - `LARK_APP_SECRET` (required)
    /// - `LARK_BASE_URL` (optional)
    /// - `LARK_TIMEOUT_SECS` (optional)
    /// - `LARK_MAX_RETRIES` (optional)
    /// - `LARK_CREDENTIALS_PATH` (optional)
    pub fn from_env() -> Result<Self, LarkError> {
        let app_id =
            std::env::var("LARK_APP_ID").map_err(|_| ConfigurationError::MissingAppId)?;
        let app_secret =
            std::env::var("LARK_APP_SECRET").map_err(|_| ConfigurationError::MissingAppSecret)?;

        let base_url =
            std::env::var("LARK_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let timeout_secs: u64 = std::env::var("LARK_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let mut retry = RetryPolicy::default();
        if let Some(max_retries) = std::env::var("LARK_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            retry.max_retries = max_retries;
        }

        let mut builder = Self::builder()
            .app_id(app_id)
            .app_secret(SecretString::new(app_secret))
            .base_url(&base_url)?
            .timeout(Duration::from_secs(timeout_secs))
            .retry(retry);

        if let Ok(path) = std::env::var("LARK_CREDENTIALS_PATH") {
            builder = builder.credentials_path(path);
        }

        builder.build()
    }
}

/// Builder for LarkConfig.
#[derive(Default)]
pub struct LarkConfigBuilder {
    app_id: Option<String>,
    app_secret: Option<SecretString>,
    base_url: Option<Url>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    token_refresh_buffer: Option<Duration>,
    retry: Option<RetryPolicy>,
    credentials_path: Option<PathBuf>,
}

impl LarkConfigBuilder {
    /// Set the application identifier.
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    /// Set the application secret.
    pub fn app_secret(mut self, app_secret: SecretString) -> Self {
        self.app_secret = Some(app_secret);
        self
    }

    /// Set the base URL.
    pub fn base_url(mut self, base_url: &str) -> Result<Self, LarkError> {
        self.base_url = Some(Url::parse(base_url)?);
        Ok(self)
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the safety margin before token expiry.
    pub fn token_refresh_buffer(mut self, buffer: Duration) -> Self {
        self.token_refresh_buffer = Some(buffer);
        self
    }

    /// Set the retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Set the durable credentials file path.
    pub fn credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = Some(path.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<LarkConfig, LarkError> {
        let app_id = self.app_id.ok_or(ConfigurationError::MissingAppId)?;
        if app_id.trim().is_empty() {
            return Err(ConfigurationError::MissingAppId.into());
        }

        let app_secret = self.app_secret.ok_or(ConfigurationError::MissingAppSecret)?;
        if app_secret.expose_secret().is_empty() {
            return Err(ConfigurationError::MissingAppSecret.into());
        }

        let base_url = self
            .base_url
            .unwrap_or_else(|| Url::parse(DEFAULT_BASE_URL).unwrap());
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigurationError::InvalidBaseUrl {
                url: base_url.to_string(),
            }
            .into());
        }

        Ok(LarkConfig {
            app_id,
            app_secret,
            base_url,
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            connect_timeout: self
                .connect_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)),
            token_refresh_buffer: self
                .token_refresh_buffer
                .unwrap_or(Duration::from_secs(DEFAULT_TOKEN_REFRESH_BUFFER_SECS)),
            retry: self.retry.unwrap_or_default(),
            credentials_path: self.credentials_path,
        })
    }
}
