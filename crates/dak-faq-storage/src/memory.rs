//! In-memory storage, for fixtures and hosts that already hold a repository snapshot

use crate::error::StorageError;
use crate::pattern::PathMatcher;
use crate::storage::{ListOptions, Storage, is_hidden, normalize_path};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Repository held in memory, keyed by normalized path
#[derive(Clone, Default)]
pub struct MemoryStorage {
    files: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file; invalid paths are rejected
    pub fn insert(
        &self,
        path: &str,
        contents: impl Into<Vec<u8>>,
    ) -> Result<(), StorageError> {
        let path = normalize_path(path)?;
        self.files.write().insert(path, contents.into());
        Ok(())
    }

    /// Builder-style `insert` for fixtures
    pub fn with_file(self, path: &str, contents: impl Into<Vec<u8>>) -> Result<Self, StorageError> {
        self.insert(path, contents)?;
        Ok(self)
    }

    pub fn remove(&self, path: &str) -> bool {
        normalize_path(path)
            .map(|p| self.files.write().remove(&p).is_some())
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let path = normalize_path(path)?;
        self.files
            .read()
            .get(&path)
            .cloned()
            .ok_or(StorageError::NotFound(path))
    }

    async fn file_exists(&self, path: &str) -> bool {
        normalize_path(path)
            .map(|p| self.files.read().contains_key(&p))
            .unwrap_or(false)
    }

    async fn list_files(
        &self,
        pattern: &str,
        options: &ListOptions,
    ) -> Result<Vec<String>, StorageError> {
        let matcher = PathMatcher::new(pattern)?;
        let files = self.files.read();
        let matches = files
            .keys()
            .filter(|path| options.include_hidden || !is_hidden(path))
            .filter(|path| matcher.is_match(path))
            .take(options.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(matches)
    }
}
