//! Glob matching over repository-relative paths

use crate::error::StorageError;
use globset::{GlobBuilder, GlobMatcher};

/// Compiled glob pattern
///
/// `*` does not cross `/`; `**` does. Brace alternatives (`*.{bpmn,dmn}`) are
/// supported.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    pattern: String,
    matcher: GlobMatcher,
}

impl PathMatcher {
    pub fn new(pattern: &str) -> Result<Self, StorageError> {
        let pattern = pattern.trim().trim_start_matches("./");
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| StorageError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            pattern: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }
}
