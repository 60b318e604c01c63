//! The executor seam between the engine and question modules

use crate::context::ExecutionContext;
use async_trait::async_trait;
use dak_faq_storage::{Storage, StorageError};
use dak_faq_types::{JsonMap, QuestionResult};
use serde_json::Value;

/// Failure reported by a question executor
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("cannot parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("{0}")]
    Failed(String),
}

impl ExecutorError {
    pub fn parse(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Everything an executor receives
///
/// `parameters` already has defaults applied and has passed validation.
#[derive(Debug, Clone)]
pub struct ExecutionInput {
    pub question_id: String,
    pub parameters: JsonMap,
    pub asset_files: Vec<String>,
    pub context: ExecutionContext,
}

impl ExecutionInput {
    pub fn storage(&self) -> &dyn Storage {
        self.context.storage().as_ref()
    }

    pub fn str_param(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).and_then(Value::as_str)
    }

    pub fn bool_param(&self, name: &str) -> Option<bool> {
        self.parameters.get(name).and_then(Value::as_bool)
    }
}

/// A question's executable half
#[async_trait]
pub trait QuestionExecutor: Send + Sync {
    async fn execute(&self, input: ExecutionInput) -> Result<QuestionResult, ExecutorError>;
}
