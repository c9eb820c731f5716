//! Durable credential storage.
//!
//! The token lifecycle manager persists [`StoredCredentials`] through the
//! [`CredentialStore`] seam: a JSON file in production
//! ([`FileCredentialStore`]), memory for tests and short-lived tools
//! ([`InMemoryCredentialStore`]), or [`crate::mocks::MockCredentialStore`].

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::{LarkResult, StorageError};
use crate::types::StoredCredentials;

/// Credential storage interface.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the stored credential document, or `None` if nothing is stored.
    async fn load(&self) -> LarkResult<Option<StoredCredentials>>;

    /// Persist the credential document, replacing any previous version.
    async fn save(&self, credentials: &StoredCredentials) -> LarkResult<()>;

    /// Remove the stored credential document.
    async fn clear(&self) -> LarkResult<()>;
}

/// File-backed credential store.
///
/// `save` rewrites the whole document atomically: the serialized JSON is
/// written to a temporary sibling file which is then renamed over the target,
/// so readers never observe a partially written document. The rename is the
/// single-process guarantee only; concurrent processes sharing one file can
/// still interleave whole rewrites and lose the later rotation.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "credentials".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> LarkResult<Option<StoredCredentials>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let credentials =
            serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization {
                message: e.to_string(),
            })?;
        Ok(Some(credentials))
    }

    async fn save(&self, credentials: &StoredCredentials) -> LarkResult<()> {
        let bytes =
            serde_json::to_vec_pretty(credentials).map_err(|e| StorageError::Serialization {
                message: e.to_string(),
            })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp = self.temp_path();
        fs::write(&temp, &bytes).await?;
        fs::rename(&temp, &self.path).await?;
        debug!(path = %self.path.display(), "credentials persisted");
        Ok(())
    }

    async fn clear(&self) -> LarkResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory credential store.
pub struct InMemoryCredentialStore {
    credentials: Mutex<Option<StoredCredentials>>,
}

impl InMemoryCredentialStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self {
            credentials: Mutex::new(None),
        }
    }

    /// Create a store pre-populated with a credential document.
    pub fn with_credentials(credentials: StoredCredentials) -> Self {
        Self {
            credentials: Mutex::new(Some(credentials)),
        }
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self) -> LarkResult<Option<StoredCredentials>> {
        Ok(self.credentials.lock().unwrap().clone())
    }

    async fn save(&self, credentials: &StoredCredentials) -> LarkResult<()> {
        *self.credentials.lock().unwrap() = Some(credentials.clone());
        Ok(())
    }

    async fn clear(&self) -> LarkResult<()> {
        *self.credentials.lock().unwrap() = None;
        Ok(())
    }
}
