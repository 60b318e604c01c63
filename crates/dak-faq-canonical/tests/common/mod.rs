//! Shared fakes for canonical integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use dak_faq_canonical::{FetchError, FetchResponse, Fetcher};
use dak_faq_storage::{BlobStore, StorageError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub const COMPONENT_VS: &str = "http://smart.who.int/base/ValueSet/DAKComponentType";
pub const COMPONENT_VS_LOCATION: &str =
    "https://worldhealthorganization.github.io/smart-base/ValueSet-DAKComponentType.schema.json";

/// Fetcher serving canned responses and counting requests
#[derive(Clone, Default)]
pub struct FakeFetcher {
    responses: Arc<RwLock<HashMap<String, FetchResponse>>>,
    requests: Arc<RwLock<Vec<String>>>,
    offline: Arc<AtomicBool>,
    hang: Arc<AtomicBool>,
    count: Arc<AtomicUsize>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, response: FetchResponse) -> &Self {
        self.responses.write().insert(url.to_string(), response);
        self
    }

    pub fn serve_json(&self, url: &str, body: serde_json::Value) -> &Self {
        self.serve(url, FetchResponse::ok(body.to_string()))
    }

    /// Every request fails with a transport error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Every request sleeps well past any reasonable timeout
    pub fn set_hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.read().clone()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<FetchResponse, FetchError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.requests.write().push(url.to_string());

        if self.hang.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Transport {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(self
            .responses
            .read()
            .get(url)
            .cloned()
            .unwrap_or_else(FetchResponse::not_found))
    }
}

/// Blob store whose every operation fails
#[derive(Clone, Copy, Default)]
pub struct FailingBlobStore;

#[async_trait]
impl BlobStore for FailingBlobStore {
    async fn read_blob(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Err(StorageError::Internal(format!("read {} failed", name)))
    }

    async fn write_blob(&self, name: &str, _data: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::Internal(format!("write {} failed", name)))
    }

    async fn remove_blob(&self, name: &str) -> Result<(), StorageError> {
        Err(StorageError::Internal(format!("remove {} failed", name)))
    }

    async fn list_blobs(&self) -> Result<Vec<String>, StorageError> {
        Err(StorageError::Internal("list failed".to_string()))
    }
}

pub fn component_value_set() -> serde_json::Value {
    serde_json::json!({
        "$id": COMPONENT_VS_LOCATION,
        "title": "DAK Component Types",
        "type": "string",
        "enum": ["business-processes", "decision-support"]
    })
}
