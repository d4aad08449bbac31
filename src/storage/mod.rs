//! Filesystem artifact sink, backed by the Apache Arrow `object_store` crate
//! the way the reference codebase already uses it for its own manifests.
//! The scraper writes two artifacts per job under a shared root: a raw body
//! and a structured JSON record, plus, for missions, a discovered-URL
//! archive.

use futures_util::TryStreamExt;
use object_store::{ObjectStore, local::LocalFileSystem, path::Path as StoragePath};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),

    #[error("root path error: {0}")]
    InvalidRoot(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Wraps an `object_store` backend rooted at a data directory. Keys passed
/// to `write` are relative paths such as `raw/{job_id}.html`.
#[derive(Clone)]
pub struct ArtifactSink {
    store: Arc<dyn ObjectStore>,
}

impl ArtifactSink {
    /// Root the sink at `data_dir` on the local filesystem, creating it if
    /// necessary.
    pub fn local(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)
            .map_err(|e| StorageError::InvalidRoot(e.to_string()))?;
        let store = LocalFileSystem::new_with_prefix(data_dir)
            .map_err(|e| StorageError::InvalidRoot(e.to_string()))?;
        Ok(Self {
            store: Arc::new(store),
        })
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(object_store::memory::InMemory::new()),
        }
    }

    pub async fn write(&self, key: &str, data: Vec<u8>) -> Result<()> {
        let path = StoragePath::from(key);
        self.store.put(&path, data.into()).await?;
        Ok(())
    }

    pub async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = StoragePath::from(key);
        let result = self.store.get(&path).await?;
        Ok(result.bytes().await?.to_vec())
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = StoragePath::from(key);
        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// List keys under `prefix`. Used by operators inspecting the
    /// discovered-URL archive and by tests that can't predict the exact
    /// timestamped filename a write produced.
    pub async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let path = StoragePath::from(prefix);
        let metas: Vec<_> = self.store.list(Some(&path)).try_collect().await?;
        Ok(metas.into_iter().map(|m| m.location.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let sink = ArtifactSink::in_memory();
        sink.write("raw/job1.html", b"<html></html>".to_vec())
            .await
            .unwrap();
        let back = sink.read("raw/job1.html").await.unwrap();
        assert_eq!(back, b"<html></html>");
    }

    #[tokio::test]
    async fn exists_is_false_before_write() {
        let sink = ArtifactSink::in_memory();
        assert!(!sink.exists("raw/missing.html").await.unwrap());
    }

    #[tokio::test]
    async fn list_prefix_finds_written_keys() {
        let sink = ArtifactSink::in_memory();
        sink.write("discovered_urls/urls_20260101_000000.json", b"{}".to_vec())
            .await
            .unwrap();
        let keys = sink.list_prefix("discovered_urls").await.unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].ends_with("urls_20260101_000000.json"));
    }

    #[tokio::test]
    async fn local_sink_creates_its_data_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("nested/data");
        let sink = ArtifactSink::local(&root).unwrap();
        sink.write("raw/job1.html", b"hi".to_vec()).await.unwrap();
        assert!(root.join("raw/job1.html").exists());
    }
}
