//! Key-value blob storage.
//!
//! The dispatcher keeps three pieces of persisted state: the service account
//! credentials (read-only), the cached OAuth access token (single slot,
//! overwritten) and the append-only event log. All of them go through
//! [`BlobStore`] so callers can run against files in production and memory in
//! tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::error::{config_error, CallpushError};

/// Storage for named byte blobs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns the blob, or `None` if it does not exist.
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CallpushError>;

    /// Replaces the blob as a whole.
    async fn write(&self, key: &str, data: &[u8]) -> Result<(), CallpushError>;

    async fn exists(&self, key: &str) -> Result<bool, CallpushError>;

    /// Appends to the blob, creating it if needed.
    async fn append(&self, key: &str, data: &[u8]) -> Result<(), CallpushError>;
}

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Blobs as files under a root directory.
///
/// A key is a path relative to the root; an absolute key is used as is.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CallpushError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(config_error(format!("failed to read {key}: {e}"))),
        }
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<(), CallpushError> {
        // Readers either see the old file or the new one, never a partial write.
        let target = self.path_for(key);
        let file_name = target
            .file_name()
            .ok_or_else(|| config_error(format!("invalid blob key: {key}")))?
            .to_string_lossy()
            .into_owned();
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        // Temp file sits beside the target; rename must not cross filesystems.
        let tmp = target.with_file_name(format!(".{file_name}.{}.{seq}.tmp", std::process::id()));

        tokio::fs::write(&tmp, data)
            .await
            .map_err(|e| config_error(format!("failed to write {key}: {e}")))?;
        tokio::fs::rename(&tmp, &target)
            .await
            .map_err(|e| config_error(format!("failed to replace {key}: {e}")))
    }

    async fn exists(&self, key: &str) -> Result<bool, CallpushError> {
        tokio::fs::try_exists(self.path_for(key))
            .await
            .map_err(|e| config_error(format!("failed to stat {key}: {e}")))
    }

    async fn append(&self, key: &str, data: &[u8]) -> Result<(), CallpushError> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(key))
            .await
            .map_err(|e| config_error(format!("failed to open {key}: {e}")))?;

        file.write_all(data)
            .await
            .map_err(|e| config_error(format!("failed to append to {key}: {e}")))
    }
}

/// In-memory blobs.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a blob; handy for setting up fixtures.
    pub async fn insert(&self, key: &str, data: impl Into<Vec<u8>>) {
        self.blobs.write().await.insert(key.to_string(), data.into());
    }

    /// The blob as UTF-8 text, if present.
    pub async fn get_string(&self, key: &str) -> Option<String> {
        self.blobs
            .read()
            .await
            .get(key)
            .map(|data| String::from_utf8_lossy(data).into_owned())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CallpushError> {
        Ok(self.blobs.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<(), CallpushError> {
        self.blobs
            .write()
            .await
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CallpushError> {
        Ok(self.blobs.read().await.contains_key(key))
    }

    async fn append(&self, key: &str, data: &[u8]) -> Result<(), CallpushError> {
        self.blobs
            .write()
            .await
            .entry(key.to_string())
            .or_default()
            .extend_from_slice(data);
        Ok(())
    }
}
