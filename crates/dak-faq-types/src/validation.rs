//! Parameter validation results

use dak_faq_diagnostics::{Diagnostic, ErrorCode};
use serde::{Deserialize, Serialize};

/// Outcome of validating supplied parameters against a question definition
///
/// `errors` reject the request; `warnings` are accepted but surfaced in the
/// question result (binding degradations, extensible non-members, unknown
/// parameters).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Record an error about a parameter
    pub fn error(&mut self, parameter: impl Into<String>, message: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(
            Diagnostic::error(ErrorCode::ValidationError, message).with_subject(parameter),
        );
    }

    /// Record a warning about a parameter
    pub fn warning(&mut self, parameter: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(
            Diagnostic::warning(ErrorCode::ValidationError, message).with_subject(parameter),
        );
    }

    /// Warning messages rendered as `parameter: message`
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(render).collect()
    }

    /// Error messages rendered as `parameter: message`
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(render).collect()
    }
}

fn render(diag: &Diagnostic) -> String {
    match &diag.subject {
        Some(subject) => format!("{}: {}", subject, diag.message),
        None => diag.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_keep_result_valid() {
        let mut result = ValidationResult::new();
        result.warning("componentType", "not in value set");
        assert!(result.is_valid);
        assert_eq!(result.warning_messages(), vec!["componentType: not in value set"]);

        result.error("includeFiles", "expected boolean, got string");
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].subject.as_deref(), Some("includeFiles"));
    }
}
