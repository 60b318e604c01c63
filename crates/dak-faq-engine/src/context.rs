//! Execution context

use dak_faq_storage::Storage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identity of the repository a question runs against
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            repo: Some(repo.into()),
            branch: None,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.owner, &self.repo) {
            (Some(owner), Some(repo)) => write!(f, "{}/{}", owner, repo)?,
            (None, Some(repo)) => f.write_str(repo)?,
            _ => f.write_str("(local)")?,
        }
        if let Some(branch) = &self.branch {
            write!(f, "@{}", branch)?;
        }
        Ok(())
    }
}

/// What a question runs against: repository storage plus caller-supplied identity
#[derive(Clone)]
pub struct ExecutionContext {
    storage: Arc<dyn Storage>,
    repository: RepositoryRef,
    locale: Option<String>,
}

impl ExecutionContext {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            repository: RepositoryRef::default(),
            locale: None,
        }
    }

    pub fn with_repository(mut self, repository: RepositoryRef) -> Self {
        self.repository = repository;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn repository(&self) -> &RepositoryRef {
        &self.repository
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("repository", &self.repository)
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}
