//! # Artifact Store
//!
//! Durable storage for generated contract documents.
//!
//! ## Integrity Invariant
//!
//! Every stored artifact's path encodes the SHA-256 digest of its content.
//! On retrieval the digest is recomputed and verified against the path, so
//! corruption or tampering is detected at read time.
//!
//! All filesystem I/O runs under a bounded timeout; a timeout surfaces as
//! [`StoreError::Timeout`], which callers treat as transient — storage
//! writes are idempotent by overwrite, so retrying is safe.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Reference to a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    /// Retrieval handle, later passed to [`ArtifactStore::get`].
    pub url: String,
    /// Logical filename of the document.
    pub filename: String,
    /// SHA-256 digest of the stored bytes, hex-encoded.
    pub digest: String,
}

/// Errors from artifact storage operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying I/O failure.
    #[error("artifact store io error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation exceeded the store's bounded timeout.
    #[error("artifact store operation timed out after {0:?}")]
    Timeout(Duration),

    /// The retrieval handle does not belong to this store.
    #[error("invalid artifact handle: {url}")]
    InvalidHandle {
        /// The rejected handle.
        url: String,
    },

    /// Stored bytes no longer match the digest encoded in their path.
    #[error("artifact integrity violation: path digest {expected}, content digest {actual}")]
    Integrity {
        /// Digest encoded in the artifact path.
        expected: String,
        /// Digest recomputed from the retrieved bytes.
        actual: String,
    },
}

impl StoreError {
    /// Whether a retry can reasonably be expected to succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Timeout(_))
    }
}

/// Storage for contract artifacts. Content is opaque bytes.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `bytes` under `filename`, returning the artifact reference.
    async fn put(&self, filename: &str, bytes: &[u8]) -> Result<StoredArtifact, StoreError>;

    /// Retrieve previously stored bytes by their handle, verifying content
    /// integrity.
    async fn get(&self, url: &str) -> Result<Vec<u8>, StoreError>;
}

/// Hex-encoded SHA-256 digest of artifact content.
pub(crate) fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Filesystem-backed artifact store.
///
/// Artifacts live at `{base_dir}/{digest}/{filename}`; the handle is the
/// path itself.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    base_dir: PathBuf,
    timeout: Duration,
}

impl FsArtifactStore {
    /// Default bound on a single storage operation.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a store rooted at `base_dir` with the default timeout.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-operation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extract the digest component from an artifact path.
    fn digest_of_handle(&self, path: &Path, url: &str) -> Result<String, StoreError> {
        path.parent()
            .and_then(Path::file_name)
            .and_then(|s| s.to_str())
            .filter(|s| s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit()))
            .map(str::to_string)
            .ok_or_else(|| StoreError::InvalidHandle {
                url: url.to_string(),
            })
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: std::future::Future<Output = std::io::Result<T>>,
    {
        tokio::time::timeout(self.timeout, op)
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
            .map_err(StoreError::from)
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(&self, filename: &str, bytes: &[u8]) -> Result<StoredArtifact, StoreError> {
        let digest = content_digest(bytes);
        let dir = self.base_dir.join(&digest);
        self.bounded(tokio::fs::create_dir_all(&dir)).await?;

        let path = dir.join(filename);
        self.bounded(tokio::fs::write(&path, bytes)).await?;

        tracing::debug!(path = %path.display(), digest = %digest, "stored contract artifact");

        Ok(StoredArtifact {
            url: path.display().to_string(),
            filename: filename.to_string(),
            digest,
        })
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>, StoreError> {
        let path = PathBuf::from(url);
        if !path.starts_with(&self.base_dir) {
            return Err(StoreError::InvalidHandle {
                url: url.to_string(),
            });
        }
        let expected = self.digest_of_handle(&path, url)?;

        let bytes = self.bounded(tokio::fs::read(&path)).await?;

        let actual = content_digest(&bytes);
        if actual != expected {
            return Err(StoreError::Integrity { expected, actual });
        }
        Ok(bytes)
    }
}
