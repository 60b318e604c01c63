//! Repository storage trait

use crate::error::StorageError;
use async_trait::async_trait;

/// Options for `Storage::list_files`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Stop after this many matches
    pub limit: Option<usize>,
    /// Include paths with a component starting with `.`
    pub include_hidden: bool,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn including_hidden(mut self) -> Self {
        self.include_hidden = true;
        self
    }
}

/// Read access to a DAK repository
///
/// Paths are repository-relative and use `/` as separator. The engine never assumes
/// what sits behind this trait: a local checkout, a hosting provider API, an
/// in-memory fixture.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read a file's bytes
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Check whether a file exists
    async fn file_exists(&self, path: &str) -> bool;

    /// List files matching a glob pattern, sorted
    async fn list_files(
        &self,
        pattern: &str,
        options: &ListOptions,
    ) -> Result<Vec<String>, StorageError>;

    /// Read a file as UTF-8 text
    async fn read_to_string(&self, path: &str) -> Result<String, StorageError> {
        let bytes = self.read_file(path).await?;
        String::from_utf8(bytes)
            .map_err(|e| StorageError::Internal(format!("{} is not valid UTF-8: {}", path, e)))
    }
}

/// Normalize a repository-relative path
///
/// Backslashes become `/`, `.` segments and empty segments are dropped. Absolute
/// paths and `..` segments are rejected.
pub fn normalize_path(path: &str) -> Result<String, StorageError> {
    let unified = path.trim().replace('\\', "/");
    if unified.starts_with('/') || unified.chars().nth(1) == Some(':') {
        return Err(StorageError::InvalidPath(path.to_string()));
    }

    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(StorageError::InvalidPath(path.to_string())),
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(segments.join("/"))
}

/// Whether any component of a relative path is hidden
pub fn is_hidden(path: &str) -> bool {
    path.split('/').any(|segment| segment.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("input/fsh/a.fsh", "input/fsh/a.fsh")]
    #[case("./input//fsh/./a.fsh", "input/fsh/a.fsh")]
    #[case("input\\dmn\\b.dmn", "input/dmn/b.dmn")]
    #[case("  dak.json ", "dak.json")]
    fn test_normalize_path(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_path(input).unwrap(), expected);
    }

    #[rstest]
    #[case("/etc/passwd")]
    #[case("input/../../secret")]
    #[case("C:/windows")]
    #[case("")]
    #[case("./")]
    fn test_normalize_path_rejects(#[case] input: &str) {
        assert!(matches!(normalize_path(input), Err(StorageError::InvalidPath(_))));
    }

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(".github/workflows/ci.yml"));
        assert!(is_hidden("input/.cache/x"));
        assert!(!is_hidden("input/pagecontent/index.md"));
    }
}
