//! DAK FAQ execution engine
//!
//! - **Question Registry**: the catalog of question modules, loaded once
//! - **Question Schema Service**: vocabulary-aware parameter validation, catalog
//!   audit and OpenAPI rendering
//! - **Execution Engine**: runs questions with per-question failure isolation
//!
//! # Example
//!
//! ```no_run
//! use dak_faq_engine::{BuiltinQuestions, ExecutionContext, ExecutionEngine, QuestionRegistry, QuestionSchemaService};
//! use dak_faq_canonical::{CanonicalSchemaService, OfflineFetcher, VocabularyCache};
//! use dak_faq_storage::FsStorage;
//! use dak_faq_types::ExecuteRequest;
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let registry = Arc::new(QuestionRegistry::new().with_source(BuiltinQuestions));
//! let canonical = Arc::new(CanonicalSchemaService::new(
//!     Arc::new(VocabularyCache::in_memory()),
//!     Arc::new(OfflineFetcher),
//! ));
//! let schemas = Arc::new(QuestionSchemaService::new(registry.clone(), canonical));
//! let engine = ExecutionEngine::new(registry, schemas);
//!
//! let context = ExecutionContext::new(Arc::new(FsStorage::new(".")));
//! let response = engine
//!     .execute_single(&ExecuteRequest::new("dak-summary"), &context)
//!     .await;
//! println!("{}", response.is_success());
//! # }
//! ```

pub mod context;
pub mod engine;
pub mod executor;
pub mod openapi;
pub mod questions;
pub mod registry;
pub mod schema;

pub use context::{ExecutionContext, RepositoryRef};
pub use engine::{ExecutionEngine, ExecutionPhase};
pub use executor::{ExecutionInput, ExecutorError, QuestionExecutor};
pub use questions::BuiltinQuestions;
pub use registry::{CatalogFilter, QuestionModule, QuestionRegistry, QuestionSource, StaticQuestions};
pub use schema::{CanonicalAudit, QuestionSchemaService};
