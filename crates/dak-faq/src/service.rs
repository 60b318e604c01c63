//! Inbound service API
//!
//! The single entry point transport adapters (HTTP routes, the CLI, protocol
//! bridges) talk to. Every adapter shares one registry, so the catalog is
//! loaded once per process however many surfaces call in.

use crate::config::FaqConfig;
use dak_faq_canonical::{
    CacheError, CanonicalLocator, CanonicalSchemaService, Fetcher, HttpFetcher, OfflineFetcher,
    Resolved, VocabularyCache,
};
use dak_faq_diagnostics::FaqError;
use dak_faq_engine::{
    BuiltinQuestions, CanonicalAudit, CatalogFilter, ExecutionContext, ExecutionEngine,
    QuestionRegistry, QuestionSchemaService, RepositoryRef,
};
use dak_faq_storage::{FsBlobStore, FsStorage};
use dak_faq_types::{
    BatchExecuteResponse, CacheStats, CachedCanonical, CanonicalResource, ExecuteRequest,
    ExecuteResponse, JsonMap, KnownCanonical, QuestionDefinition, QuestionSchemaPair,
    ValidationResult, ValueSetExpansion,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

pub struct FaqService {
    engine: ExecutionEngine,
    schemas: Arc<QuestionSchemaService>,
    canonical: Arc<CanonicalSchemaService>,
}

impl FaqService {
    pub fn new(registry: Arc<QuestionRegistry>, canonical: Arc<CanonicalSchemaService>) -> Self {
        let schemas = Arc::new(QuestionSchemaService::new(registry.clone(), canonical.clone()));
        Self {
            engine: ExecutionEngine::new(registry, schemas.clone()),
            schemas,
            canonical,
        }
    }

    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.engine = self.engine.with_batch_concurrency(concurrency);
        self
    }

    /// Built-in questions over a vocabulary layer assembled from `config`
    pub fn from_config(config: &FaqConfig) -> Result<Self, FaqError> {
        let freshness = config.cache.freshness().ok_or_else(|| {
            FaqError::config(format!(
                "cache.freshness_hours is too large: {}",
                config.cache.freshness_hours
            ))
        })?;
        let cache = match &config.cache.dir {
            Some(dir) => {
                debug!(dir = %dir.display(), "using durable vocabulary cache");
                VocabularyCache::with_blob_store(Arc::new(FsBlobStore::new(dir)))
            }
            None => VocabularyCache::in_memory(),
        }
        .with_freshness(freshness);

        let fetcher: Arc<dyn Fetcher> = if config.fetch.offline {
            info!("offline mode: canonical resources come from the cache only");
            Arc::new(OfflineFetcher)
        } else {
            Arc::new(
                HttpFetcher::new(&config.fetch.user_agent)
                    .map_err(|e| FaqError::config(format!("cannot build HTTP client: {}", e)))?,
            )
        };

        let canonical = CanonicalSchemaService::new(Arc::new(cache), fetcher)
            .with_locator(CanonicalLocator::new(config.canonical.publications.clone()))
            .with_fetch_timeout(config.fetch.timeout())
            .with_known(config.canonical.known.iter().cloned());

        let registry = QuestionRegistry::new().with_source(BuiltinQuestions);
        registry.initialize()?;

        Ok(Self::new(Arc::new(registry), Arc::new(canonical))
            .with_batch_concurrency(config.execution.batch_concurrency))
    }

    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    pub fn canonical(&self) -> &Arc<CanonicalSchemaService> {
        &self.canonical
    }

    pub fn list_questions(&self, filter: &CatalogFilter) -> Result<Vec<QuestionDefinition>, FaqError> {
        self.engine.registry().get_catalog(filter)
    }

    pub async fn execute_one(
        &self,
        question_id: &str,
        parameters: JsonMap,
        context: &ExecutionContext,
    ) -> ExecuteResponse {
        let request = ExecuteRequest::new(question_id).with_parameters(parameters);
        self.execute(&request, context).await
    }

    pub async fn execute(&self, request: &ExecuteRequest, context: &ExecutionContext) -> ExecuteResponse {
        self.engine.execute_single(request, context).await
    }

    pub async fn execute_many(
        &self,
        requests: &[ExecuteRequest],
        context: &ExecutionContext,
    ) -> BatchExecuteResponse {
        let response =
            BatchExecuteResponse::from_results(self.engine.execute_batch(requests, context).await);
        info!(
            total = response.summary.total,
            successful = response.summary.successful,
            failed = response.summary.failed,
            "batch finished"
        );
        response
    }

    pub fn get_schema(&self, question_id: &str) -> Result<Option<QuestionSchemaPair>, FaqError> {
        self.schemas.get_question_schema(question_id)
    }

    pub async fn validate_parameters(
        &self,
        question_id: &str,
        parameters: &JsonMap,
    ) -> Result<ValidationResult, FaqError> {
        self.schemas
            .validate_question_parameters(question_id, parameters)
            .await
    }

    pub fn list_known_canonicals(&self) -> Vec<KnownCanonical> {
        self.canonical.get_known_canonical_urls().to_vec()
    }

    pub async fn get_canonical_resource(&self, url: &str) -> Resolved<CanonicalResource> {
        self.canonical.resolve_resource(url).await
    }

    pub async fn expand_value_set(&self, url: &str) -> Resolved<ValueSetExpansion> {
        self.canonical.resolve_expansion(url).await
    }

    pub async fn list_cached_canonicals(&self) -> Vec<CachedCanonical> {
        self.canonical.get_cached_resources().await
    }

    pub async fn clear_canonical_cache(&self) -> Result<(), CacheError> {
        self.canonical.clear_cache().await
    }

    pub fn openapi(&self) -> Result<Value, FaqError> {
        self.schemas.get_openapi_schema()
    }

    pub fn audit(&self) -> Result<CanonicalAudit, FaqError> {
        self.schemas.audit_canonical_references()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.canonical.get_cache_stats().await
    }
}

/// Execution context over a local checkout
pub fn local_context(root: impl Into<PathBuf>) -> ExecutionContext {
    let root = root.into();
    let repository = RepositoryRef {
        owner: None,
        repo: root
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned())),
        branch: None,
    };
    ExecutionContext::new(Arc::new(FsStorage::new(root))).with_repository(repository)
}
