//! Filesystem blob store
//!
//! Stores markdown content as plain files under a root directory. Blob
//! paths are relative and must not escape the root.

use crate::error::{ClioError, Result};
use crate::store::BlobStore;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Blob store rooted at a local directory
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a blob store rooted at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            ClioError::Blob(format!(
                "Failed to create blob root {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    /// Resolve a blob path against the root, rejecting traversal components
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let rel = Path::new(path);
        let escapes = rel.components().any(|c| {
            matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
        });
        if escapes || path.is_empty() {
            return Err(ClioError::Blob(format!("Invalid blob path: {}", path)));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let full = self.resolve(path)?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ClioError::Blob(format!(
                "Failed to read blob {}: {}",
                path, e
            ))),
        }
    }

    async fn put(&self, path: &str, bytes: &[u8], _content_type: &str) -> Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ClioError::Blob(format!(
                    "Failed to create blob directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        tokio::fs::write(&full, bytes)
            .await
            .map_err(|e| ClioError::Blob(format!("Failed to write blob {}: {}", path, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip_with_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path()).unwrap();

        store
            .put("api/users-get.md", b"# List Users", "text/markdown")
            .await
            .unwrap();
        let got = store.get("api/users-get.md").await.unwrap().unwrap();
        assert_eq!(got, b"# List Users");
    }

    #[tokio::test]
    async fn test_missing_blob_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path()).unwrap();
        assert!(store.get("nope.md").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path()).unwrap();

        let err = store.get("../outside.md").await.unwrap_err();
        assert!(err.to_string().contains("Invalid blob path"));
        assert!(store
            .put("/etc/passwd", b"x", "text/plain")
            .await
            .is_err());
    }
}
