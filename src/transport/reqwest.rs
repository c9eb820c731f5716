//! Reqwest-based HTTP transport implementation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::error::TransportError;
use super::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};

/// Reqwest-based HTTP transport.
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a new reqwest transport with the given timeouts.
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| {
                TransportError::Connection(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, timeout })
    }

    /// Map a reqwest failure to a transport error.
    fn convert_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                duration: self.timeout,
            }
        } else if err.is_connect() {
            TransportError::Connection(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

fn convert_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

/// Build a reqwest header map from lowercase name/value pairs. Pairs that
/// do not form valid header names or values are skipped.
fn convert_headers(headers: HashMap<String, String>) -> reqwest::header::HeaderMap {
    let mut header_map = reqwest::header::HeaderMap::new();
    for (key, value) in headers {
        if let (Ok(name), Ok(val)) = (
            reqwest::header::HeaderName::from_bytes(key.as_bytes()),
            reqwest::header::HeaderValue::from_str(&value),
        ) {
            header_map.insert(name, val);
        }
    }
    header_map
}

/// Flatten a reqwest header map into lowercase name/value pairs.
fn extract_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect()
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut req_builder = self
            .client
            .request(convert_method(request.method), &request.url)
            .headers(convert_headers(request.headers));

        if let Some(body) = request.body {
            req_builder = req_builder.body(body.to_vec());
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| self.convert_error(e))?;

        let status = response.status().as_u16();
        let response_headers = extract_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request(format!("Failed to read response body: {}", e)))?;

        Ok(HttpResponse {
            status,
            headers: response_headers,
            body,
        })
    }
}
