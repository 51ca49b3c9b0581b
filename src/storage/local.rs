//! Local filesystem storage implementation.
//!
//! Keeps the domain cache snapshot and the remembered session as JSON
//! files under a root directory. Writes go through a temp file and a
//! rename so a crash never leaves a half-written snapshot behind.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{DomainSnapshot, SavedSession};
use crate::storage::SnapshotStore;

const DOMAINS_KEY: &str = "domains.json";
const SESSION_KEY: &str = "session.json";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SnapshotStore for LocalStorage {
    async fn load_domains(&self) -> Result<Option<DomainSnapshot>> {
        self.read_json(DOMAINS_KEY).await
    }

    async fn save_domains(&self, snapshot: &DomainSnapshot) -> Result<()> {
        log::debug!(
            "Saving {} domains to {}",
            snapshot.domains.len(),
            self.path(DOMAINS_KEY).display()
        );
        self.write_json(DOMAINS_KEY, snapshot).await
    }

    async fn load_session(&self) -> Result<SavedSession> {
        Ok(self.read_json(SESSION_KEY).await?.unwrap_or_default())
    }

    async fn save_session(&self, session: &SavedSession) -> Result<()> {
        let mut session = session.clone();
        session.updated_at = Some(Utc::now());
        self.write_json(SESSION_KEY, &session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Domain;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_bytes("test.txt", b"hello").await.unwrap();
        let data = storage.read_bytes("test.txt").await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
        assert!(!storage.path("test.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_files() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("nested"));

        assert!(storage.load_domains().await.unwrap().is_none());
        let session = storage.load_session().await.unwrap();
        assert!(session.token.is_none());
        assert!(session.last_location.is_none());
    }

    #[tokio::test]
    async fn test_domains_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("nested"));
        let snapshot = DomainSnapshot::new(vec![Domain {
            name: "sandbox".into(),
            url: "hifi://sandbox".into(),
            thumbnail: "asset://thumbnails/domain_placeholder.png".into(),
        }]);

        storage.save_domains(&snapshot).await.unwrap();

        assert_eq!(storage.load_domains().await.unwrap(), Some(snapshot));
    }

    #[tokio::test]
    async fn test_save_session_stamps_time() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage
            .save_session(&SavedSession {
                last_location: Some("hifi://sandbox".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let loaded = storage.load_session().await.unwrap();
        assert!(loaded.updated_at.is_some());
        assert_eq!(loaded.last_location.as_deref(), Some("hifi://sandbox"));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        storage.write_bytes(DOMAINS_KEY, b"{not json").await.unwrap();

        assert!(matches!(storage.load_domains().await, Err(AppError::Json(_))));
    }
}
