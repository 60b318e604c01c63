//! Errors of the canonical layer
//!
//! Neither type crosses the execution boundary: the service absorbs them into
//! warnings.

use dak_faq_storage::StorageError;
use std::time::Duration;

/// Failure of a remote fetch
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} returned an invalid document: {message}")]
    InvalidBody { url: String, message: String },

    #[error("offline mode, {url} was not fetched")]
    Offline { url: String },
}

/// Failure of a cache tier
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("corrupt cache entry {name}: {message}")]
    Corrupt { name: String, message: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}
