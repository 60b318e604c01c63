//! Named blob storage backing the durable vocabulary cache tier

use crate::error::StorageError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Minimal durable key/value capability
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read a blob; `None` when it does not exist
    async fn read_blob(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Create or overwrite a blob
    async fn write_blob(&self, name: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Remove a blob; removing a missing blob is not an error
    async fn remove_blob(&self, name: &str) -> Result<(), StorageError>;

    /// Names of all stored blobs, sorted
    async fn list_blobs(&self) -> Result<Vec<String>, StorageError>;
}

/// Blob names are restricted to `[A-Za-z0-9._-]` and may not start with `.`
pub fn validate_blob_name(name: &str) -> Result<(), StorageError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidBlobName(name.to_string()))
    }
}

/// One file per blob inside a directory
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        validate_blob_name(name)?;
        Ok(self.dir.join(name))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn read_blob(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path.display().to_string(), e)),
        }
    }

    async fn write_blob(&self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::io(self.dir.display().to_string(), e))?;

        // Write-then-rename so readers never observe a partial blob
        let staging = self.dir.join(format!(".{}.tmp", name));
        tokio::fs::write(&staging, data)
            .await
            .map_err(|e| StorageError::io(staging.display().to_string(), e))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|e| StorageError::io(path.display().to_string(), e))
    }

    async fn remove_blob(&self, name: &str) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(path.display().to_string(), e)),
        }
    }

    async fn list_blobs(&self) -> Result<Vec<String>, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(self.dir.display().to_string(), e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(self.dir.display().to_string(), e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if validate_blob_name(&name).is_ok() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Blob store held in memory
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read_blob(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_blob_name(name)?;
        Ok(self.blobs.read().get(name).cloned())
    }

    async fn write_blob(&self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        validate_blob_name(name)?;
        self.blobs.write().insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn remove_blob(&self, name: &str) -> Result<(), StorageError> {
        validate_blob_name(name)?;
        self.blobs.write().remove(name);
        Ok(())
    }

    async fn list_blobs(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.blobs.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("abc123.json", true)]
    #[case("a-b_c.d", true)]
    #[case("", false)]
    #[case(".hidden", false)]
    #[case("../x", false)]
    #[case("a/b", false)]
    fn test_blob_names(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(validate_blob_name(name).is_ok(), valid);
    }

    #[tokio::test]
    async fn test_fs_blob_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().join("cache"));

        assert!(store.list_blobs().await.unwrap().is_empty());
        assert_eq!(store.read_blob("k.json").await.unwrap(), None);

        store.write_blob("k.json", b"{\"a\":1}").await.unwrap();
        store.write_blob("j.json", b"{}").await.unwrap();
        assert_eq!(store.read_blob("k.json").await.unwrap(), Some(b"{\"a\":1}".to_vec()));
        assert_eq!(store.list_blobs().await.unwrap(), vec!["j.json", "k.json"]);

        store.remove_blob("k.json").await.unwrap();
        store.remove_blob("k.json").await.unwrap();
        assert_eq!(store.list_blobs().await.unwrap(), vec!["j.json"]);
    }

    #[tokio::test]
    async fn test_memory_blob_store_rejects_bad_names() {
        let store = MemoryBlobStore::new();
        assert!(store.write_blob("a/b", b"x").await.is_err());
        store.write_blob("ok", b"x").await.unwrap();
        assert_eq!(store.list_blobs().await.unwrap(), vec!["ok"]);
    }
}
