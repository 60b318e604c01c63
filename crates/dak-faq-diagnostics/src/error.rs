//! FAQ engine error types

use crate::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Error - the request cannot proceed
    Error,
    /// Warning - accepted, but flagged
    Warning,
    /// Information - informational message
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A diagnostic message with an optional subject (usually a parameter name)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// What the diagnostic is about (parameter, URL, file)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Additional context or help
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            subject: None,
            help: None,
        }
    }

    /// Create a new warning diagnostic
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            subject: None,
            help: None,
        }
    }

    /// Set the subject
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render with terminal colors
    #[cfg(feature = "colored")]
    pub fn to_colored_string(&self) -> String {
        use colored::Colorize;

        let level = match self.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".blue().bold(),
        };
        let mut out = match &self.subject {
            Some(subject) => format!("{}[{}] {}: {}", level, self.code, subject.cyan(), self.message),
            None => format!("{}[{}]: {}", level, self.code, self.message),
        };
        if let Some(help) = &self.help {
            out.push_str(&format!("\n  {} {}", "help:".green(), help));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - ", self.severity, self.code)?;
        if let Some(subject) = &self.subject {
            write!(f, "{}: ", subject)?;
        }
        write!(f, "{}", self.message)
    }
}

/// Main FAQ engine error type
#[derive(Debug, Clone, Error)]
pub enum FaqError {
    /// Unknown question id
    #[error("Question not found: {id}")]
    QuestionNotFound { id: String },

    /// Parameter validation failed
    #[error("Invalid parameters for {question_id}: {}", summarize(.issues))]
    Validation {
        question_id: String,
        issues: Vec<Diagnostic>,
    },

    /// The question module reported a failure
    #[error("{message}")]
    Execution { question_id: String, message: String },

    /// Two modules registered the same id
    #[error("Duplicate question id: {id}")]
    DuplicateQuestion { id: String },

    /// A question definition breaks a catalog invariant
    #[error("Invalid question definition {id}: {message}")]
    InvalidDefinition { id: String, message: String },

    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Internal error (should not happen)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn summarize(issues: &[Diagnostic]) -> String {
    issues
        .iter()
        .map(|issue| match &issue.subject {
            Some(subject) => format!("{}: {}", subject, issue.message),
            None => issue.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl FaqError {
    /// Create a question-not-found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::QuestionNotFound { id: id.into() }
    }

    /// Create a validation error from the collected issues
    pub fn validation(question_id: impl Into<String>, issues: Vec<Diagnostic>) -> Self {
        Self::Validation {
            question_id: question_id.into(),
            issues,
        }
    }

    /// Create an execution error
    pub fn execution(question_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            question_id: question_id.into(),
            message: message.into(),
        }
    }

    /// Create an invalid definition error
    pub fn invalid_definition(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the response error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::QuestionNotFound { .. } => ErrorCode::NotFound,
            Self::Validation { .. } => ErrorCode::ValidationError,
            Self::Execution { .. } => ErrorCode::ExecutionError,
            Self::DuplicateQuestion { .. }
            | Self::InvalidDefinition { .. }
            | Self::Config { .. }
            | Self::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Convert to diagnostics; validation errors expand to one entry per issue
    pub fn to_diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Self::Validation { issues, .. } => issues.clone(),
            other => {
                let mut diag = Diagnostic::error(other.code(), other.to_string());
                if let Some(help) = other.code().info().help {
                    diag = diag.with_help(help);
                }
                vec![diag]
            }
        }
    }
}
