use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use directories::ProjectDirs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::mapping::current_epoch;

/// Object store used to persist generated cover images.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `key` and return the stored key.
    async fn upload_file(&self, bytes: Vec<u8>, key: &str, content_type: &str) -> Result<String>;
    /// Time-limited URL for a stored key.
    async fn presigned_url(&self, key: &str, ttl: Duration) -> Result<String>;
}

/// Filesystem-backed object storage rooted at a directory.
pub struct FsObjectStorage {
    root: PathBuf,
}

impl FsObjectStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    /// Root from `dir`, else the user's data directory.
    pub fn from_dir(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(d) => Ok(Self::new(d)),
            None => Ok(Self::new(default_storage_dir()?)),
        }
    }

    pub fn root(&self) -> &Path { &self.root }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let rel = Path::new(key.trim_start_matches('/'));
        if key.trim().is_empty() || rel.components().any(|c| !matches!(c, Component::Normal(_))) {
            bail!("invalid object key: {key}");
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl ObjectStorage for FsObjectStorage {
    async fn upload_file(&self, bytes: Vec<u8>, key: &str, content_type: &str) -> Result<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating storage dir: {}", parent.display()))?;
        }
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("writing object: {}", path.display()))?;
        debug!(key, content_type, size = bytes.len(), "object stored");
        Ok(key.to_string())
    }

    async fn presigned_url(&self, key: &str, ttl: Duration) -> Result<String> {
        let path = self.resolve(key)?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            bail!("object not found: {key}");
        }
        let expires = current_epoch() + ttl.as_secs() as i64;
        Ok(format!("file://{}?expires={expires}", path.display()))
    }
}

fn default_storage_dir() -> Result<PathBuf> {
    let proj = ProjectDirs::from("dev", "mediacrawl", "mediacrawl")
        .context("unable to determine data directory for object storage")?;
    Ok(proj.data_dir().join("objects"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_then_presign() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStorage::new(dir.path());
        let key = store.upload_file(vec![1, 2, 3], "covers/a.png", "image/png").await.unwrap();
        assert_eq!(key, "covers/a.png");
        assert_eq!(std::fs::read(dir.path().join("covers/a.png")).unwrap(), vec![1, 2, 3]);

        let url = store.presigned_url(&key, Duration::from_secs(60)).await.unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.contains("covers/a.png?expires="));
    }

    #[tokio::test]
    async fn rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStorage::new(dir.path());
        assert!(store.upload_file(vec![0], "../evil.png", "image/png").await.is_err());
        assert!(store.upload_file(vec![0], "covers/../../x", "image/png").await.is_err());
        assert!(store.upload_file(vec![0], "", "image/png").await.is_err());
    }

    #[tokio::test]
    async fn presign_missing_object_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStorage::new(dir.path());
        assert!(store.presigned_url("covers/none.png", Duration::from_secs(1)).await.is_err());
    }
}
