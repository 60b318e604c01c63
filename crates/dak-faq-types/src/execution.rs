//! Execution requests, responses and batch summaries

use crate::JsonMap;
use dak_faq_diagnostics::{Diagnostic, ErrorCode, FaqError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single question invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub question_id: String,
    #[serde(default)]
    pub parameters: JsonMap,
    /// Explicit file scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_files: Option<Vec<String>>,
}

impl ExecuteRequest {
    pub fn new(question_id: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            parameters: JsonMap::new(),
            asset_files: None,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_parameters(mut self, parameters: JsonMap) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_asset_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.asset_files = Some(files.into_iter().map(Into::into).collect());
        self
    }
}

/// What a question module produces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub structured: Value,
    pub narrative: String,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub meta: JsonMap,
}

impl QuestionResult {
    pub fn new(structured: Value, narrative: impl Into<String>) -> Self {
        Self {
            structured,
            narrative: narrative.into(),
            errors: Vec::new(),
            warnings: Vec::new(),
            meta: JsonMap::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// Failure payload of a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteError {
    pub message: String,
    pub code: ErrorCode,
    /// Offending parameters for `VALIDATION_ERROR`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Diagnostic>,
}

impl ExecuteError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            details: Vec::new(),
        }
    }
}

impl From<&FaqError> for ExecuteError {
    fn from(err: &FaqError) -> Self {
        let details = match err {
            FaqError::Validation { issues, .. } => issues.clone(),
            _ => Vec::new(),
        };
        Self {
            message: err.to_string(),
            code: err.code(),
            details,
        }
    }
}

/// Outcome of one invocation; immutable once produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    success: bool,
    question_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<QuestionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<ExecuteError>,
}

impl ExecuteResponse {
    pub fn succeeded(question_id: impl Into<String>, result: QuestionResult) -> Self {
        Self {
            success: true,
            question_id: question_id.into(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(question_id: impl Into<String>, error: ExecuteError) -> Self {
        Self {
            success: false,
            question_id: question_id.into(),
            result: None,
            error: Some(error),
        }
    }

    pub fn from_error(question_id: impl Into<String>, err: &FaqError) -> Self {
        Self::failed(question_id, ExecuteError::from(err))
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn question_id(&self) -> &str {
        &self.question_id
    }

    pub fn result(&self) -> Option<&QuestionResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&ExecuteError> {
        self.error.as_ref()
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }
}

/// Counts over a batch; `successful + failed == total`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Result of a batch execution
///
/// `success` means the batch ran to completion, not that every member succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchExecuteResponse {
    pub success: bool,
    pub results: Vec<ExecuteResponse>,
    pub summary: BatchSummary,
}

impl BatchExecuteResponse {
    pub fn from_results(results: Vec<ExecuteResponse>) -> Self {
        let successful = results.iter().filter(|r| r.is_success()).count();
        let summary = BatchSummary {
            total: results.len(),
            successful,
            failed: results.len() - successful,
        };
        Self {
            success: true,
            results,
            summary,
        }
    }
}
