//! Shared fixtures for engine integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use dak_faq_canonical::{CanonicalSchemaService, FetchError, FetchResponse, Fetcher, VocabularyCache};
use dak_faq_engine::{
    ExecutionContext, ExecutionEngine, ExecutionInput, ExecutorError, QuestionExecutor,
    QuestionModule, QuestionRegistry, QuestionSchemaService, StaticQuestions,
};
use dak_faq_storage::MemoryStorage;
use dak_faq_types::{
    BindingStrength, ParameterSpec, ParameterType, QuestionDefinition, QuestionLevel,
    QuestionResult, ValueSetBinding,
};
use parking_lot::RwLock;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub const CODES_VS: &str = "http://example.org/fhir/ValueSet/codes.json";
pub const COMPONENTS_VS: &str = "http://example.org/fhir/ValueSet/components.json";
pub const MISSING_VS: &str = "http://example.org/fhir/ValueSet/missing.json";

/// Fetcher serving canned JSON documents by URL; everything else is a 404
#[derive(Clone, Default)]
pub struct MapFetcher {
    documents: Arc<RwLock<HashMap<String, Value>>>,
    count: Arc<AtomicUsize>,
    offline: Arc<AtomicBool>,
}

impl MapFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: &str, document: Value) -> Self {
        self.documents.write().insert(url.to_string(), document);
        self
    }

    pub fn request_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Every request fails with a transport error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for MapFetcher {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<FetchResponse, FetchError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Transport {
                url: url.to_string(),
                message: "network unreachable".to_string(),
            });
        }
        Ok(match self.documents.read().get(url) {
            Some(document) => FetchResponse::ok(document.to_string()),
            None => FetchResponse::not_found(),
        })
    }
}

pub fn default_fetcher() -> MapFetcher {
    MapFetcher::new()
        .with(CODES_VS, json!({"type": "string", "enum": ["a", "b"]}))
        .with(
            COMPONENTS_VS,
            json!({"type": "string", "enum": ["business-processes", "decision-support"]}),
        )
}

/// What a scripted executor does when run
#[derive(Clone)]
pub enum Script {
    Answer(Value),
    Fail(&'static str),
    Panic(&'static str),
    /// Echo the received parameters and asset files
    Echo,
}

pub struct Scripted {
    script: Script,
    runs: Arc<AtomicUsize>,
}

impl Scripted {
    pub fn new(script: Script) -> (Self, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        (
            Self {
                script,
                runs: runs.clone(),
            },
            runs,
        )
    }
}

#[async_trait]
impl QuestionExecutor for Scripted {
    async fn execute(&self, input: ExecutionInput) -> Result<QuestionResult, ExecutorError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Answer(value) => Ok(QuestionResult::new(value.clone(), "answered")),
            Script::Fail(message) => Err(ExecutorError::failed(*message)),
            Script::Panic(message) => panic!("{}", message),
            Script::Echo => Ok(QuestionResult::new(
                json!({"parameters": input.parameters, "assetFiles": input.asset_files}),
                "echo",
            )),
        }
    }
}

pub fn module(definition: QuestionDefinition, script: Script) -> QuestionModule {
    QuestionModule::new(definition, Scripted::new(script).0)
}

pub fn bound_question(id: &str, strength: BindingStrength, url: &str) -> QuestionDefinition {
    QuestionDefinition::new(id, QuestionLevel::Project, id).with_parameter(
        ParameterSpec::required("code", ParameterType::String)
            .with_binding(ValueSetBinding::new(strength, url)),
    )
}

pub struct Harness {
    pub engine: ExecutionEngine,
    pub schemas: Arc<QuestionSchemaService>,
    pub fetcher: MapFetcher,
    pub context: ExecutionContext,
}

pub fn harness(questions: StaticQuestions, fetcher: MapFetcher) -> Harness {
    harness_with_cache(questions, fetcher, VocabularyCache::in_memory())
}

/// Harness over a pre-seeded vocabulary cache
pub fn harness_with_cache(
    questions: StaticQuestions,
    fetcher: MapFetcher,
    cache: VocabularyCache,
) -> Harness {
    let registry = Arc::new(QuestionRegistry::new().with_source(questions));
    let canonical = Arc::new(CanonicalSchemaService::new(
        Arc::new(cache),
        Arc::new(fetcher.clone()),
    ));
    let schemas = Arc::new(QuestionSchemaService::new(registry.clone(), canonical));
    Harness {
        engine: ExecutionEngine::new(registry, schemas.clone()),
        schemas,
        fetcher,
        context: ExecutionContext::new(Arc::new(MemoryStorage::new())),
    }
}
