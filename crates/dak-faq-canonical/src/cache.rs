//! Two-tier vocabulary cache
//!
//! The memory tier is authoritative for the process lifetime; the durable tier
//! survives restarts. `VocabularyCache` composes the two: reads fall through memory
//! to durable (promoting hits), writes go to both, and a durable failure is only
//! ever logged.

use crate::error::CacheError;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use dak_faq_storage::BlobStore;
use dak_faq_types::{CacheStats, CachedCanonical, CanonicalResource};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Freshness window applied when none is configured
pub const DEFAULT_FRESHNESS_HOURS: i64 = 24;

/// One storage tier of the cache
#[async_trait]
pub trait CacheTier: Send + Sync {
    /// Tier name, for logs
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<CanonicalResource>, CacheError>;

    async fn put(&self, key: &str, resource: &CanonicalResource) -> Result<(), CacheError>;

    async fn clear(&self) -> Result<(), CacheError>;

    /// Every stored `(key, resource)` pair
    async fn entries(&self) -> Result<Vec<(String, CanonicalResource)>, CacheError>;
}

/// Process-local tier
#[derive(Default)]
pub struct MemoryTier {
    entries: RwLock<HashMap<String, CanonicalResource>>,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheTier for MemoryTier {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<CanonicalResource>, CacheError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn put(&self, key: &str, resource: &CanonicalResource) -> Result<(), CacheError> {
        self.entries.write().insert(key.to_string(), resource.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.entries.write().clear();
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(String, CanonicalResource)>, CacheError> {
        Ok(self
            .entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    key: String,
    resource: CanonicalResource,
}

/// Tier persisted through a `BlobStore`, one JSON blob per key
pub struct DurableTier {
    store: Arc<dyn BlobStore>,
}

impl DurableTier {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Blob name for a cache key: hex SHA-256 of the key
    pub fn blob_name(key: &str) -> String {
        format!("{}.json", hex::encode(Sha256::digest(key.as_bytes())))
    }

    async fn read_envelope(&self, name: &str) -> Result<Option<Envelope>, CacheError> {
        let Some(bytes) = self.store.read_blob(name).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| CacheError::Corrupt {
                name: name.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl CacheTier for DurableTier {
    fn name(&self) -> &'static str {
        "durable"
    }

    async fn get(&self, key: &str) -> Result<Option<CanonicalResource>, CacheError> {
        let envelope = self.read_envelope(&Self::blob_name(key)).await?;
        Ok(envelope
            .filter(|e| e.key == key)
            .map(|e| e.resource))
    }

    async fn put(&self, key: &str, resource: &CanonicalResource) -> Result<(), CacheError> {
        let envelope = Envelope {
            key: key.to_string(),
            resource: resource.clone(),
        };
        let bytes =
            serde_json::to_vec(&envelope).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.store.write_blob(&Self::blob_name(key), &bytes).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        for name in self.store.list_blobs().await? {
            if name.ends_with(".json") {
                self.store.remove_blob(&name).await?;
            }
        }
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(String, CanonicalResource)>, CacheError> {
        let mut entries = Vec::new();
        for name in self.store.list_blobs().await? {
            if !name.ends_with(".json") {
                continue;
            }
            match self.read_envelope(&name).await {
                Ok(Some(envelope)) => entries.push((envelope.key, envelope.resource)),
                Ok(None) => {}
                Err(e) => warn!(blob = %name, error = %e, "skipping unreadable cache entry"),
            }
        }
        Ok(entries)
    }
}

/// A cache hit
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup {
    /// The cached resource, with `origin = cache`
    pub resource: CanonicalResource,
    /// `false` once the resource is older than the freshness window
    pub is_fresh: bool,
}

/// Coordinator over a memory tier and an optional durable tier
pub struct VocabularyCache {
    memory: Arc<dyn CacheTier>,
    durable: Option<Arc<dyn CacheTier>>,
    freshness: Duration,
}

impl VocabularyCache {
    pub fn new(memory: Arc<dyn CacheTier>, durable: Option<Arc<dyn CacheTier>>) -> Self {
        Self {
            memory,
            durable,
            freshness: Duration::hours(DEFAULT_FRESHNESS_HOURS),
        }
    }

    /// Memory-only cache
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTier::new()), None)
    }

    /// Memory tier over a durable blob store
    pub fn with_blob_store(store: Arc<dyn BlobStore>) -> Self {
        Self::new(
            Arc::new(MemoryTier::new()),
            Some(Arc::new(DurableTier::new(store))),
        )
    }

    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    pub fn is_fresh(&self, resource: &CanonicalResource) -> bool {
        Utc::now() - resource.last_fetched < self.freshness
    }

    /// Look a key up in memory, then in the durable tier
    pub async fn get(&self, key: &str) -> Option<CacheLookup> {
        let mut found = match self.memory.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key, tier = self.memory.name(), error = %e, "cache read failed");
                None
            }
        };

        if found.is_none() {
            if let Some(durable) = &self.durable {
                match durable.get(key).await {
                    Ok(Some(resource)) => {
                        debug!(key, "promoting durable cache entry");
                        if let Err(e) = self.memory.put(key, &resource).await {
                            warn!(key, tier = self.memory.name(), error = %e, "cache write failed");
                        }
                        found = Some(resource);
                    }
                    Ok(None) => {}
                    Err(e) => warn!(key, tier = durable.name(), error = %e, "cache read failed"),
                }
            }
        }

        found.map(|resource| CacheLookup {
            is_fresh: self.is_fresh(&resource),
            resource: resource.from_cache(),
        })
    }

    /// Store a resource in both tiers; tier failures are logged, never returned
    pub async fn put(&self, key: &str, resource: &CanonicalResource) {
        if let Err(e) = self.memory.put(key, resource).await {
            warn!(key, tier = self.memory.name(), error = %e, "cache write failed");
        }
        if let Some(durable) = &self.durable {
            if let Err(e) = durable.put(key, resource).await {
                warn!(key, tier = durable.name(), error = %e, "durable cache write failed");
            }
        }
    }

    /// Empty both tiers (operator action only)
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.memory.clear().await?;
        if let Some(durable) = &self.durable {
            durable.clear().await?;
        }
        Ok(())
    }

    /// Merged view of both tiers; memory wins on conflicting keys
    async fn merged(&self) -> (BTreeMap<String, CanonicalResource>, usize, usize) {
        let memory = self.memory.entries().await.unwrap_or_else(|e| {
            warn!(tier = self.memory.name(), error = %e, "cache listing failed");
            Vec::new()
        });
        let durable = match &self.durable {
            Some(tier) => tier.entries().await.unwrap_or_else(|e| {
                warn!(tier = tier.name(), error = %e, "cache listing failed");
                Vec::new()
            }),
            None => Vec::new(),
        };

        let (memory_count, durable_count) = (memory.len(), durable.len());
        let mut merged: BTreeMap<String, CanonicalResource> = durable.into_iter().collect();
        merged.extend(memory);
        (merged, memory_count, durable_count)
    }

    pub async fn stats(&self) -> CacheStats {
        let (merged, memory_entries, durable_entries) = self.merged().await;
        let fresh = merged.values().filter(|r| self.is_fresh(r)).count();
        CacheStats {
            total: merged.len(),
            fresh,
            stale: merged.len() - fresh,
            memory_entries,
            durable_entries,
        }
    }

    /// Summaries of every cached resource, sorted by key
    pub async fn resources(&self) -> Vec<CachedCanonical> {
        let (merged, _, _) = self.merged().await;
        merged
            .into_iter()
            .map(|(key, resource)| CachedCanonical {
                is_fresh: self.is_fresh(&resource),
                key,
                url: resource.url,
                resource_type: resource.resource_type,
                version: resource.version,
                last_fetched: resource.last_fetched,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dak_faq_storage::MemoryBlobStore;
    use dak_faq_types::{CanonicalType, ResourceOrigin};
    use serde_json::json;

    fn resource(url: &str, age_hours: i64) -> CanonicalResource {
        CanonicalResource::new(url, CanonicalType::ValueSet, json!({"enum": ["a", "b"]}))
            .with_last_fetched(Utc::now() - Duration::hours(age_hours))
    }

    #[tokio::test]
    async fn test_fresh_and_stale_hits() {
        let cache = VocabularyCache::in_memory();
        cache.put("fresh", &resource("fresh", 1)).await;
        cache.put("stale", &resource("stale", 25)).await;

        let fresh = cache.get("fresh").await.unwrap();
        assert!(fresh.is_fresh);
        assert_eq!(fresh.resource.origin, ResourceOrigin::Cache);

        let stale = cache.get("stale").await.unwrap();
        assert!(!stale.is_fresh);

        assert!(cache.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_durable_hit_is_promoted() {
        let store = Arc::new(MemoryBlobStore::new());
        let durable = Arc::new(DurableTier::new(store.clone()));
        durable.put("k", &resource("k", 0)).await.unwrap();

        let memory = Arc::new(MemoryTier::new());
        let cache = VocabularyCache::new(memory.clone(), Some(durable));

        assert!(memory.get("k").await.unwrap().is_none());
        assert!(cache.get("k").await.is_some());
        assert!(memory.get("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_durable_survives_new_cache_instance() {
        let store = Arc::new(MemoryBlobStore::new());
        VocabularyCache::with_blob_store(store.clone())
            .put("k", &resource("k", 0))
            .await;

        let restarted = VocabularyCache::with_blob_store(store);
        assert!(restarted.get("k").await.is_some());
    }

    #[tokio::test]
    async fn test_stats_and_clear() {
        let cache = VocabularyCache::with_blob_store(Arc::new(MemoryBlobStore::new()));
        cache.put("a", &resource("a", 1)).await;
        cache.put("b", &resource("b", 48)).await;

        let stats = cache.stats().await;
        assert_eq!(stats.total, 2);
        assert_eq!(stats.fresh, 1);
        assert_eq!(stats.stale, 1);
        assert_eq!(stats.memory_entries, 2);
        assert_eq!(stats.durable_entries, 2);

        cache.clear().await.unwrap();
        assert_eq!(cache.stats().await, CacheStats::default());
    }

    #[test]
    fn test_blob_name_is_stable_and_safe() {
        let name = DurableTier::blob_name("http://smart.who.int/base/ValueSet/X|1.0");
        assert_eq!(name, DurableTier::blob_name("http://smart.who.int/base/ValueSet/X|1.0"));
        assert!(dak_faq_storage::validate_blob_name(&name).is_ok());
        assert_eq!(name.len(), 64 + ".json".len());
    }

    #[tokio::test]
    async fn test_corrupt_durable_entry_is_a_miss() {
        let store = Arc::new(MemoryBlobStore::new());
        store
            .write_blob(&DurableTier::blob_name("k"), b"not json")
            .await
            .unwrap();

        let cache = VocabularyCache::with_blob_store(store);
        assert!(cache.get("k").await.is_none());
        assert_eq!(cache.stats().await.total, 0);
    }
}
