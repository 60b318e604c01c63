//! Local checkout storage

use crate::error::StorageError;
use crate::pattern::PathMatcher;
use crate::storage::{ListOptions, Storage, normalize_path};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directories never descended into
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "output", "temp", "fsh-generated"];

/// Repository rooted at a local directory
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<(String, PathBuf), StorageError> {
        let relative = normalize_path(path)?;
        let full = relative
            .split('/')
            .fold(self.root.clone(), |acc, segment| acc.join(segment));
        Ok((relative, full))
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let (relative, full) = self.resolve(path)?;
        tokio::fs::read(&full)
            .await
            .map_err(|e| StorageError::io(relative, e))
    }

    async fn file_exists(&self, path: &str) -> bool {
        match self.resolve(path) {
            Ok((_, full)) => tokio::fs::metadata(&full)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn list_files(
        &self,
        pattern: &str,
        options: &ListOptions,
    ) -> Result<Vec<String>, StorageError> {
        let matcher = PathMatcher::new(pattern)?;
        let limit = options.limit.unwrap_or(usize::MAX);
        let mut matches = Vec::new();
        let mut pending = vec![(self.root.clone(), String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| StorageError::io(dir.display().to_string(), e))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StorageError::io(dir.display().to_string(), e))?
            {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with('.') && !options.include_hidden {
                    continue;
                }
                let relative = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{}/{}", prefix, name)
                };
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| StorageError::io(relative.clone(), e))?;

                if file_type.is_dir() {
                    if !SKIPPED_DIRS.contains(&name.as_str()) {
                        pending.push((entry.path(), relative));
                    }
                } else if file_type.is_file() && matcher.is_match(&relative) {
                    matches.push(relative);
                }
            }
        }

        matches.sort();
        matches.truncate(limit);
        debug!(pattern = matcher.pattern(), count = matches.len(), "listed files");
        Ok(matches)
    }
}
