//! Mock implementations for testing.
//!
//! Deterministic doubles for the transport, credential store, and token
//! manager seams. Unit tests use them directly; the integration tests in
//! `tests/` drive the real client and services against them.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::auth::TokenManager;
use crate::error::{LarkError, LarkResult, StorageError};
use crate::storage::CredentialStore;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use crate::types::StoredCredentials;

/// Mock HTTP transport with a queue of canned outcomes.
///
/// Each [`send`](HttpTransport::send) call records the request and pops the
/// next queued outcome. An empty queue fails the request, which keeps tests
/// honest about how many calls they expect.
#[derive(Default)]
pub struct MockHttpTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttpTransport {
    /// Create a new mock transport with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response.
    pub fn enqueue_response(&self, response: HttpResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a JSON response with the given status.
    pub fn enqueue_json_response(&self, status: u16, body: &serde_json::Value) {
        let mut headers = HashMap::new();
        headers.insert(
            "content-type".to_string(),
            "application/json; charset=utf-8".to_string(),
        );
        self.enqueue_response(HttpResponse {
            status,
            headers,
            body: Bytes::from(serde_json::to_vec(body).unwrap()),
        });
    }

    /// Queue a 429 response carrying a `retry-after` header.
    pub fn enqueue_rate_limited(&self, retry_after_secs: u64) {
        let mut headers = HashMap::new();
        headers.insert("retry-after".to_string(), retry_after_secs.to_string());
        self.enqueue_response(HttpResponse {
            status: 429,
            headers,
            body: Bytes::from(r#"{"code":99991400,"msg":"request trigger frequency limit"}"#),
        });
    }

    /// Queue a transport-level failure.
    pub fn enqueue_transport_error(&self, error: TransportError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// All recorded requests, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The most recent recorded request.
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    /// Number of requests made.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Request("no mock response enqueued".into())))
    }
}

/// Mock credential store with call recording and failure injection.
#[derive(Default)]
pub struct MockCredentialStore {
    credentials: Mutex<Option<StoredCredentials>>,
    save_history: Mutex<Vec<StoredCredentials>>,
    load_count: AtomicU32,
    should_fail: Mutex<bool>,
}

impl MockCredentialStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock store pre-populated with a credential document.
    pub fn with_credentials(credentials: StoredCredentials) -> Self {
        let store = Self::default();
        *store.credentials.lock().unwrap() = Some(credentials);
        store
    }

    /// Make every subsequent operation fail.
    pub fn set_should_fail(&self, should_fail: bool) -> &Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    /// Every document passed to [`save`](CredentialStore::save), in order.
    pub fn save_history(&self) -> Vec<StoredCredentials> {
        self.save_history.lock().unwrap().clone()
    }

    /// Number of [`load`](CredentialStore::load) calls.
    pub fn load_count(&self) -> u32 {
        self.load_count.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> LarkResult<()> {
        if *self.should_fail.lock().unwrap() {
            Err(StorageError::Io {
                message: "mock storage failure".to_string(),
            }
            .into())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn load(&self) -> LarkResult<Option<StoredCredentials>> {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.credentials.lock().unwrap().clone())
    }

    async fn save(&self, credentials: &StoredCredentials) -> LarkResult<()> {
        self.check_failure()?;
        self.save_history.lock().unwrap().push(credentials.clone());
        *self.credentials.lock().unwrap() = Some(credentials.clone());
        Ok(())
    }

    async fn clear(&self) -> LarkResult<()> {
        self.check_failure()?;
        *self.credentials.lock().unwrap() = None;
        Ok(())
    }
}

/// Mock token manager that hands out a canned bearer token.
pub struct MockTokenManager {
    token: Mutex<String>,
    expiry: Mutex<Option<DateTime<Utc>>>,
    next_error: Mutex<Option<LarkError>>,
    get_count: AtomicU32,
    refresh_history: Mutex<Vec<String>>,
}

impl MockTokenManager {
    /// Create a mock manager holding a valid token.
    pub fn new() -> Self {
        Self {
            token: Mutex::new("mock-user-token".to_string()),
            expiry: Mutex::new(Some(Utc::now() + chrono::Duration::hours(2))),
            next_error: Mutex::new(None),
            get_count: AtomicU32::new(0),
            refresh_history: Mutex::new(Vec::new()),
        }
    }

    /// Replace the canned token value.
    pub fn with_token(self, token: impl Into<String>) -> Self {
        *self.token.lock().unwrap() = token.into();
        self
    }

    /// Fail the next `get_token` call with the given error.
    pub fn set_next_error(&self, error: LarkError) -> &Self {
        *self.next_error.lock().unwrap() = Some(error);
        self
    }

    /// Number of `get_token` calls.
    pub fn get_count(&self) -> u32 {
        self.get_count.load(Ordering::SeqCst)
    }

    /// Refresh token values passed to `refresh_token`, in order.
    pub fn refresh_history(&self) -> Vec<String> {
        self.refresh_history.lock().unwrap().clone()
    }
}

impl Default for MockTokenManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenManager for MockTokenManager {
    async fn get_token(&self) -> LarkResult<String> {
        self.get_count.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self.token.lock().unwrap().clone())
    }

    async fn token_expiry(&self) -> Option<DateTime<Utc>> {
        *self.expiry.lock().unwrap()
    }

    async fn refresh_token(&self, refresh_token: &str) -> LarkResult<String> {
        self.refresh_history
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        Ok(self.token.lock().unwrap().clone())
    }

    async fn has_valid_token(&self) -> bool {
        matches!(*self.expiry.lock().unwrap(), Some(expiry) if expiry > Utc::now())
    }
}
