//! Object storage boundary for the record files.
//!
//! Record lists live as whole flat-text objects (`admins.csv`,
//! `scorers.csv`) in a blob store. Reads return the full object text or
//! not-found; writes overwrite the full object. There is no conditional
//! write: two concurrent read-modify-write cycles race and the last write
//! wins — callers needing stronger guarantees must add a version check at
//! this boundary.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::config::{DaemonConfig, StorageBackend};

/// Content type every record object is written with.
const CSV_CONTENT_TYPE: &str = "text/csv";

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The remote backend is selected but no write token is configured.
    /// Surfaced to clients as 503 before any read or write is attempted.
    #[error("storage not configured")]
    NotConfigured,
    #[error("blob request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected blob status {status} for {path}")]
    UnexpectedStatus { path: String, status: u16 },
    #[error("blob io failed: {0}")]
    Io(#[from] std::io::Error),
}

// ─── BlobStore ────────────────────────────────────────────────────────────────

/// Whole-object reader/writer for logical blob paths.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Full text content of the object, or `None` if it does not exist.
    async fn read(&self, path: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the object with `content`. Objects are public-readable with
    /// a fixed `text/csv` content type.
    async fn write(&self, path: &str, content: &str) -> Result<(), StorageError>;
}

/// Build the store selected by the config.
///
/// Remote without a token yields [`UnconfiguredStore`] rather than an error:
/// the daemon still starts, and every record request answers 503 with
/// guidance until the token is configured.
pub fn from_config(config: &DaemonConfig) -> std::sync::Arc<dyn BlobStore> {
    match config.storage.backend {
        StorageBackend::Remote => match config.storage.token.as_deref() {
            Some(token) if !token.is_empty() => std::sync::Arc::new(HttpBlobStore::new(
                config.storage.base_url.clone(),
                token.to_string(),
            )),
            _ => {
                warn!("remote storage selected but BLOB_READ_WRITE_TOKEN is not set");
                std::sync::Arc::new(UnconfiguredStore)
            }
        },
        StorageBackend::Local => std::sync::Arc::new(LocalBlobStore::new(config.data_dir.clone())),
    }
}

// ─── HttpBlobStore ────────────────────────────────────────────────────────────

/// Blob-service-backed store (Vercel-Blob-style HTTP API).
pub struct HttpBlobStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

/// Per-request timeout for blob reads and writes.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

impl HttpBlobStore {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn read(&self, path: &str) -> Result<Option<String>, StorageError> {
        let url = self.object_url(path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.text().await?)),
            status => Err(StorageError::UnexpectedStatus {
                path: path.to_string(),
                status: status.as_u16(),
            }),
        }
    }

    async fn write(&self, path: &str, content: &str) -> Result<(), StorageError> {
        let url = self.object_url(path);
        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .header("x-content-type", CSV_CONTENT_TYPE)
            .header("x-access", "public")
            .timeout(REQUEST_TIMEOUT)
            .body(content.to_string())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::UnexpectedStatus {
                path: path.to_string(),
                status: response.status().as_u16(),
            });
        }
        debug!(path, bytes = content.len(), "blob written");
        Ok(())
    }
}

// ─── LocalBlobStore ───────────────────────────────────────────────────────────

/// File-backed store under the data directory, for development and tests.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn object_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn read(&self, path: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.object_path(path)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, path: &str, content: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.object_path(path), content).await?;
        Ok(())
    }
}

// ─── UnconfiguredStore ────────────────────────────────────────────────────────

/// Placeholder store used when the remote backend has no token. Every
/// operation fails with [`StorageError::NotConfigured`].
pub struct UnconfiguredStore;

#[async_trait]
impl BlobStore for UnconfiguredStore {
    async fn read(&self, _path: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::NotConfigured)
    }

    async fn write(&self, _path: &str, _content: &str) -> Result<(), StorageError> {
        Err(StorageError::NotConfigured)
    }
}
