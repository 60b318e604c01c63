//! Execution engine
//!
//! Every execution moves through
//! `pending -> resolving -> validating -> running -> succeeded | failed`, where
//! `failed` is reachable from every non-terminal phase. Nothing is retried, and
//! nothing a question module does (including panicking) escapes as anything but
//! a failed response.

use crate::context::ExecutionContext;
use crate::executor::ExecutionInput;
use crate::registry::QuestionRegistry;
use crate::schema::QuestionSchemaService;
use chrono::Utc;
use dak_faq_diagnostics::FaqError;
use dak_faq_types::{ExecuteRequest, ExecuteResponse, JsonMap, QuestionDefinition};
use futures::FutureExt;
use futures::stream::{self, StreamExt};
use serde_json::json;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Lifecycle phase of a single execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionPhase {
    Pending,
    Resolving,
    Validating,
    Running,
    Succeeded,
    Failed,
}

impl ExecutionPhase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ExecutionPhase::Pending => "pending",
            ExecutionPhase::Resolving => "resolving",
            ExecutionPhase::Validating => "validating",
            ExecutionPhase::Running => "running",
            ExecutionPhase::Succeeded => "succeeded",
            ExecutionPhase::Failed => "failed",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, ExecutionPhase::Succeeded | ExecutionPhase::Failed)
    }
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct PhaseTracker<'a> {
    question_id: &'a str,
    phase: ExecutionPhase,
}

impl<'a> PhaseTracker<'a> {
    fn new(question_id: &'a str) -> Self {
        Self {
            question_id,
            phase: ExecutionPhase::Pending,
        }
    }

    fn enter(&mut self, next: ExecutionPhase) {
        debug!(question_id = self.question_id, from = %self.phase, to = %next, "execution phase");
        self.phase = next;
    }

    fn fail(mut self, err: &FaqError) -> ExecuteResponse {
        let failed_in = self.phase;
        self.enter(ExecutionPhase::Failed);
        info!(
            question_id = self.question_id,
            phase = %failed_in,
            code = %err.code(),
            "execution failed"
        );
        ExecuteResponse::from_error(self.question_id, err)
    }
}

pub struct ExecutionEngine {
    registry: Arc<QuestionRegistry>,
    schemas: Arc<QuestionSchemaService>,
    batch_concurrency: usize,
}

impl ExecutionEngine {
    pub fn new(registry: Arc<QuestionRegistry>, schemas: Arc<QuestionSchemaService>) -> Self {
        Self {
            registry,
            schemas,
            batch_concurrency: 1,
        }
    }

    /// Run up to `concurrency` batch members at once; results keep request order
    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency.max(1);
        self
    }

    pub fn registry(&self) -> &Arc<QuestionRegistry> {
        &self.registry
    }

    pub fn schemas(&self) -> &Arc<QuestionSchemaService> {
        &self.schemas
    }

    /// Execute one request; failures are returned as failed responses
    pub async fn execute_single(
        &self,
        request: &ExecuteRequest,
        context: &ExecutionContext,
    ) -> ExecuteResponse {
        let started = Instant::now();
        let question_id = request.question_id.as_str();
        let mut tracker = PhaseTracker::new(question_id);

        tracker.enter(ExecutionPhase::Resolving);
        let module = match self.registry.get(question_id) {
            Ok(Some(module)) => module,
            Ok(None) => return tracker.fail(&FaqError::not_found(question_id)),
            Err(e) => return tracker.fail(&e),
        };

        tracker.enter(ExecutionPhase::Validating);
        let validation = self
            .schemas
            .validate_parameters(&module.definition, &request.parameters)
            .await;
        if !validation.is_valid {
            return tracker.fail(&FaqError::validation(question_id, validation.errors));
        }

        tracker.enter(ExecutionPhase::Running);
        let input = ExecutionInput {
            question_id: question_id.to_string(),
            parameters: with_defaults(&module.definition, &request.parameters),
            asset_files: request.asset_files.clone().unwrap_or_default(),
            context: context.clone(),
        };

        let outcome = AssertUnwindSafe(module.executor.execute(input))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(mut result)) => {
                result.warnings.extend(validation.warning_messages());
                result.meta.insert("questionId".into(), json!(question_id));
                result
                    .meta
                    .insert("executedAt".into(), json!(Utc::now().to_rfc3339()));
                result.meta.insert(
                    "durationMs".into(),
                    json!(started.elapsed().as_millis() as u64),
                );
                tracker.enter(ExecutionPhase::Succeeded);
                ExecuteResponse::succeeded(question_id, result)
            }
            Ok(Err(e)) => {
                error!(question_id, error = %e, "question executor failed");
                tracker.fail(&FaqError::execution(question_id, e.to_string()))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(question_id, panic = %message, "question executor panicked");
                tracker.fail(&FaqError::execution(
                    question_id,
                    format!("question executor panicked: {}", message),
                ))
            }
        }
    }

    /// Execute every request independently; `result[i]` answers `requests[i]`
    pub async fn execute_batch(
        &self,
        requests: &[ExecuteRequest],
        context: &ExecutionContext,
    ) -> Vec<ExecuteResponse> {
        debug!(
            requests = requests.len(),
            concurrency = self.batch_concurrency,
            "executing batch"
        );
        if self.batch_concurrency <= 1 {
            let mut responses = Vec::with_capacity(requests.len());
            for request in requests {
                responses.push(self.execute_single(request, context).await);
            }
            return responses;
        }

        stream::iter(requests)
            .map(|request| self.execute_single(request, context))
            .buffered(self.batch_concurrency)
            .collect()
            .await
    }
}

/// Supplied parameters plus declared defaults for anything absent or `null`
fn with_defaults(definition: &QuestionDefinition, supplied: &JsonMap) -> JsonMap {
    let mut parameters = supplied.clone();
    for spec in &definition.parameters {
        let Some(default) = &spec.default_value else {
            continue;
        };
        let absent = parameters.get(&spec.name).is_none_or(|v| v.is_null());
        if absent {
            parameters.insert(spec.name.clone(), default.clone());
        }
    }
    parameters
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
