//! Error codes surfaced across the execution boundary
//!
//! Every failed execution carries exactly one of these codes. They are part of the
//! wire contract and serialize as `NOT_FOUND`, `VALIDATION_ERROR`, ...

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The requested question id is not in the catalog
    NotFound,
    /// A required parameter is missing or mistyped, or a required binding is violated
    ValidationError,
    /// The question module itself failed
    ExecutionError,
    /// The engine could not set itself up (e.g. an invalid question catalog)
    InternalError,
}

impl ErrorCode {
    /// All codes, in declaration order
    pub const ALL: [ErrorCode; 4] = [
        ErrorCode::NotFound,
        ErrorCode::ValidationError,
        ErrorCode::ExecutionError,
        ErrorCode::InternalError,
    ];

    /// Wire representation of the code
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::ExecutionError => "EXECUTION_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        match self {
            ErrorCode::NotFound => &NOT_FOUND_INFO,
            ErrorCode::ValidationError => &VALIDATION_ERROR_INFO,
            ErrorCode::ExecutionError => &EXECUTION_ERROR_INFO,
            ErrorCode::InternalError => &INTERNAL_ERROR_INFO,
        }
    }

    /// Client errors are caused by the request and are never retried internally
    pub const fn is_client_error(&self) -> bool {
        matches!(self, ErrorCode::NotFound | ErrorCode::ValidationError)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ErrorCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown error code: {}", s))
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static NOT_FOUND_INFO: ErrorInfo = ErrorInfo::new("Question not found")
    .with_help("List the catalog to see which question ids are available");
static VALIDATION_ERROR_INFO: ErrorInfo = ErrorInfo::new("Parameter validation failed")
    .with_help("Check required parameters, their types and bound vocabularies");
static EXECUTION_ERROR_INFO: ErrorInfo = ErrorInfo::new("Question execution failed");
static INTERNAL_ERROR_INFO: ErrorInfo = ErrorInfo::new("Internal engine error");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::NotFound.to_string(), "NOT_FOUND");
        assert_eq!(ErrorCode::ValidationError.to_string(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_error_code_serde_matches_display() {
        for code in ErrorCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
            let back: ErrorCode = serde_json::from_str(&json).unwrap();
            assert_eq!(back, code);
        }
    }

    #[test]
    fn test_error_code_parse() {
        assert_eq!("execution_error".parse::<ErrorCode>(), Ok(ErrorCode::ExecutionError));
        assert!("BOGUS".parse::<ErrorCode>().is_err());
    }

    #[test]
    fn test_client_errors() {
        assert!(ErrorCode::NotFound.is_client_error());
        assert!(ErrorCode::ValidationError.is_client_error());
        assert!(!ErrorCode::ExecutionError.is_client_error());
    }

    #[test]
    fn test_error_info() {
        assert_eq!(ErrorCode::NotFound.info().description, "Question not found");
        assert!(ErrorCode::ExecutionError.info().help.is_none());
    }
}
