//! Canonical Schema Service
//!
//! Resolution per canonical key:
//!
//! 1. fresh cache hit: returned as is
//! 2. stale cache hit: refetched under a timeout; on failure the stale copy is
//!    returned with a warning
//! 3. miss: fetched; on failure nothing is returned
//!
//! A 404 means the resource does not exist. Nothing here returns an error to the
//! caller: each lookup carries its degradation warnings instead.

use crate::cache::VocabularyCache;
use crate::error::{CacheError, FetchError};
use crate::fetch::Fetcher;
use crate::known::known_canonicals;
use crate::locator::{CanonicalLocator, CanonicalRef};
use crate::resource::{detect_type, extract_codes};
use crate::structural::validate_structure;
use chrono::Utc;
use dak_faq_types::{
    CacheStats, CachedCanonical, CanonicalResource, CanonicalType, CanonicalValidationResult,
    KnownCanonical, ValueSetExpansion,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default bound on a single fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A lookup result together with the degradations it went through
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: Option<T>,
    pub warnings: Vec<String>,
}

impl<T> Resolved<T> {
    fn found(value: T, warnings: Vec<String>) -> Self {
        Self {
            value: Some(value),
            warnings,
        }
    }

    fn missing(warnings: Vec<String>) -> Self {
        Self {
            value: None,
            warnings,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        Resolved {
            value: self.value.map(f),
            warnings: self.warnings,
        }
    }
}

/// Three-valued membership of a code in a ValueSet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Member,
    NotMember,
    /// The vocabulary could not be obtained
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeCheck {
    pub membership: Membership,
    pub warnings: Vec<String>,
}

impl CodeCheck {
    /// Permissive reading: only a definite non-member fails
    pub fn is_acceptable(&self) -> bool {
        self.membership != Membership::NotMember
    }
}

enum Fetched {
    Found(CanonicalResource),
    Missing,
}

pub struct CanonicalSchemaService {
    cache: Arc<VocabularyCache>,
    fetcher: Arc<dyn Fetcher>,
    locator: CanonicalLocator,
    fetch_timeout: Duration,
    known: Vec<KnownCanonical>,
}

impl CanonicalSchemaService {
    pub fn new(cache: Arc<VocabularyCache>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            cache,
            fetcher,
            locator: CanonicalLocator::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            known: known_canonicals().to_vec(),
        }
    }

    pub fn with_locator(mut self, locator: CanonicalLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Append entries to the known-canonical directory, skipping duplicates
    pub fn with_known(mut self, extra: impl IntoIterator<Item = KnownCanonical>) -> Self {
        for entry in extra {
            if !self.known.iter().any(|k| k.url == entry.url) {
                self.known.push(entry);
            }
        }
        self
    }

    pub fn cache(&self) -> &VocabularyCache {
        &self.cache
    }

    /// Resolve `url` (optionally `url|version`) through the cache
    pub async fn resolve_resource(&self, url: &str) -> Resolved<CanonicalResource> {
        let canonical = CanonicalRef::parse(url);
        let key = canonical.key();

        let cached = self.cache.get(&key).await;
        if let Some(hit) = &cached {
            if hit.is_fresh {
                debug!(key = %key, "canonical cache hit");
                return Resolved::found(hit.resource.clone(), Vec::new());
            }
        }

        match self.fetch_remote(&canonical).await {
            Ok(Fetched::Found(resource)) => {
                self.cache.put(&key, &resource).await;
                Resolved::found(resource, Vec::new())
            }
            Ok(Fetched::Missing) => {
                let message = format!("canonical resource {} does not exist", canonical);
                warn!(key = %key, "canonical resource not found");
                match cached {
                    Some(hit) => Resolved::found(
                        hit.resource,
                        vec![format!("{}; using cached copy", message)],
                    ),
                    None => Resolved::missing(vec![message]),
                }
            }
            Err(e) => match cached {
                Some(hit) => {
                    warn!(key = %key, error = %e, "refresh failed, serving stale copy");
                    let fetched = hit.resource.last_fetched.to_rfc3339();
                    Resolved::found(
                        hit.resource,
                        vec![format!(
                            "could not refresh {} ({}); using cached copy from {}",
                            canonical, e, fetched
                        )],
                    )
                }
                None => {
                    warn!(key = %key, error = %e, "canonical resource unavailable");
                    Resolved::missing(vec![format!("could not fetch {}: {}", canonical, e)])
                }
            },
        }
    }

    pub async fn fetch_canonical_resource(&self, url: &str) -> Option<CanonicalResource> {
        self.resolve_resource(url).await.value
    }

    /// Expansion derived from the resolved resource
    ///
    /// Only ValueSets expand. A ValueSet that enumerates no codes yields an
    /// empty expansion, not an absent one.
    pub async fn resolve_expansion(&self, url: &str) -> Resolved<ValueSetExpansion> {
        let Resolved { value, mut warnings } = self.resolve_resource(url).await;
        match value {
            Some(resource) if resource.resource_type == CanonicalType::ValueSet => {
                Resolved::found(
                    ValueSetExpansion {
                        codes: extract_codes(&resource.schema),
                        loaded_at: resource.last_fetched,
                        url: resource.url,
                    },
                    warnings,
                )
            }
            Some(resource) => {
                warn!(url, kind = ?resource.resource_type, "canonical resource is not a value set");
                warnings.push(format!(
                    "canonical resource {} is a {}, not a ValueSet",
                    resource.url,
                    resource.resource_type.as_str()
                ));
                Resolved::missing(warnings)
            }
            None => Resolved::missing(warnings),
        }
    }

    pub async fn expand_value_set(&self, url: &str) -> Option<ValueSetExpansion> {
        self.resolve_expansion(url).await.value
    }

    pub async fn check_code(&self, url: &str, code: &str) -> CodeCheck {
        let resolved = self.resolve_expansion(url).await;
        let mut warnings = resolved.warnings;
        let membership = match resolved.value {
            Some(expansion) if expansion.contains(code) => Membership::Member,
            Some(_) => Membership::NotMember,
            None => {
                warn!(url, code, "value set unavailable, accepting code");
                warnings.push(format!(
                    "value set {} unavailable; '{}' accepted without validation",
                    url, code
                ));
                Membership::Unavailable
            }
        };
        CodeCheck {
            membership,
            warnings,
        }
    }

    /// `true` unless the code is definitely not a member
    pub async fn validate_value_set_code(&self, url: &str, code: &str) -> bool {
        self.check_code(url, code).await.is_acceptable()
    }

    pub async fn validate_against_canonical(
        &self,
        url: &str,
        data: &Value,
    ) -> CanonicalValidationResult {
        let resolved = self.resolve_resource(url).await;
        let mut result = match &resolved.value {
            Some(resource) => validate_structure(resource, data),
            None => {
                let mut result = CanonicalValidationResult::new(CanonicalRef::parse(url).url);
                result.warning("canonical resource unavailable; structure not validated");
                result
            }
        };
        result.warnings.splice(0..0, resolved.warnings);
        result
    }

    pub fn get_known_canonical_urls(&self) -> &[KnownCanonical] {
        &self.known
    }

    pub async fn get_cached_resources(&self) -> Vec<CachedCanonical> {
        self.cache.resources().await
    }

    pub async fn get_cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub async fn clear_cache(&self) -> Result<(), CacheError> {
        self.cache.clear().await?;
        info!("canonical cache cleared");
        Ok(())
    }

    async fn fetch_remote(&self, canonical: &CanonicalRef) -> Result<Fetched, FetchError> {
        let location = self.locator.fetch_url(canonical);
        debug!(canonical = %canonical, location = %location, "fetching canonical resource");

        let response = tokio::time::timeout(
            self.fetch_timeout,
            self.fetcher.get(&location, self.fetch_timeout),
        )
        .await
        .map_err(|_| FetchError::Timeout {
            url: location.clone(),
            timeout: self.fetch_timeout,
        })??;

        if response.status == 404 {
            return Ok(Fetched::Missing);
        }
        if !response.is_success() {
            return Err(FetchError::Status {
                url: location,
                status: response.status,
            });
        }

        let payload: Value =
            serde_json::from_slice(&response.body).map_err(|e| FetchError::InvalidBody {
                url: location.clone(),
                message: e.to_string(),
            })?;

        let resource_type = detect_type(&location, &payload);
        let version = canonical.version.clone().or_else(|| {
            payload
                .get("version")
                .and_then(Value::as_str)
                .map(str::to_string)
        });

        let mut resource = CanonicalResource::new(canonical.url.clone(), resource_type, payload)
            .with_last_fetched(Utc::now());
        if let Some(version) = version {
            resource = resource.with_version(version);
        }
        info!(canonical = %canonical, kind = ?resource.resource_type, "fetched canonical resource");
        Ok(Fetched::Found(resource))
    }
}
