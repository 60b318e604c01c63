//! Question Schema Service
//!
//! Turns static parameter specs into a vocabulary-aware validator. Binding
//! strength decides what a value outside the bound ValueSet means:
//!
//! | strength     | non-member  |
//! |--------------|-------------|
//! | `required`   | error       |
//! | `extensible` | warning     |
//! | `preferred`  | (nothing)   |
//! | `example`    | (nothing)   |
//!
//! A ValueSet that cannot be obtained at all never rejects a value: the code is
//! accepted with a warning whatever the strength. A stale copy is still enforced.

use crate::openapi;
use crate::registry::{CatalogFilter, QuestionRegistry};
use dak_faq_canonical::{CanonicalSchemaService, Membership};
use dak_faq_diagnostics::FaqError;
use dak_faq_types::{
    BindingStrength, JsonMap, ParameterSpec, QuestionDefinition, QuestionSchemaPair,
    ValidationResult, ValueSetBinding, ValueSetCode, json_type_name,
};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Which questions declare canonical references
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalAudit {
    pub questions_with_canonicals: Vec<String>,
    pub questions_without_canonicals: Vec<String>,
    pub canonicals_by_question: IndexMap<String, Vec<String>>,
    /// Distinct canonical URLs across the catalog
    pub total_canonicals: usize,
}

pub struct QuestionSchemaService {
    registry: Arc<QuestionRegistry>,
    canonical: Arc<CanonicalSchemaService>,
}

impl QuestionSchemaService {
    pub fn new(registry: Arc<QuestionRegistry>, canonical: Arc<CanonicalSchemaService>) -> Self {
        Self {
            registry,
            canonical,
        }
    }

    pub fn registry(&self) -> &Arc<QuestionRegistry> {
        &self.registry
    }

    pub fn canonical(&self) -> &Arc<CanonicalSchemaService> {
        &self.canonical
    }

    pub fn get_question(&self, id: &str) -> Result<Option<QuestionDefinition>, FaqError> {
        self.registry.definition(id)
    }

    pub fn get_all_schemas(&self) -> Result<Vec<QuestionDefinition>, FaqError> {
        self.registry.get_catalog(&CatalogFilter::default())
    }

    /// Declared schema pair, or one derived from the parameters
    pub fn get_question_schema(&self, id: &str) -> Result<Option<QuestionSchemaPair>, FaqError> {
        Ok(self.get_question(id)?.map(|definition| {
            definition.schema.clone().unwrap_or_else(|| QuestionSchemaPair {
                input: openapi::input_schema(&definition),
                output: openapi::default_output_schema(),
            })
        }))
    }

    pub async fn validate_question_parameters(
        &self,
        question_id: &str,
        parameters: &JsonMap,
    ) -> Result<ValidationResult, FaqError> {
        let definition = self
            .get_question(question_id)?
            .ok_or_else(|| FaqError::not_found(question_id))?;
        Ok(self.validate_parameters(&definition, parameters).await)
    }

    /// Validate supplied parameters against a definition
    ///
    /// `null` counts as absent. Unknown parameters are ignored with a warning.
    pub async fn validate_parameters(
        &self,
        definition: &QuestionDefinition,
        parameters: &JsonMap,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();

        for spec in &definition.parameters {
            match parameters.get(&spec.name).filter(|v| !v.is_null()) {
                None => {
                    if spec.required && spec.default_value.is_none() {
                        result.error(&spec.name, "required parameter is missing");
                    }
                }
                Some(value) => self.check_value(spec, value, &mut result).await,
            }
        }

        for name in parameters.keys() {
            if definition.parameter(name).is_none() {
                result.warning(name, "unknown parameter ignored");
            }
        }

        debug!(
            question_id = %definition.id,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "validated parameters"
        );
        result
    }

    async fn check_value(&self, spec: &ParameterSpec, value: &Value, result: &mut ValidationResult) {
        if !spec.param_type.accepts(value) {
            result.error(
                &spec.name,
                format!("expected {}, found {}", spec.param_type, json_type_name(value)),
            );
            return;
        }

        if let (Some(pattern), Some(text)) = (&spec.pattern, value.as_str()) {
            match Regex::new(pattern) {
                Ok(regex) if regex.is_match(text) => {}
                Ok(_) => result.error(&spec.name, format!("'{}' does not match {}", text, pattern)),
                Err(e) => result.error(&spec.name, format!("invalid pattern {}: {}", pattern, e)),
            }
        }

        if let Some(binding) = &spec.value_set_binding {
            self.check_binding(&spec.name, binding, value, result).await;
        }
    }

    async fn check_binding(
        &self,
        name: &str,
        binding: &ValueSetBinding,
        value: &Value,
        result: &mut ValidationResult,
    ) {
        if !binding.strength.reports_non_members() {
            return;
        }

        let codes: Vec<&str> = match value {
            Value::String(code) => vec![code.as_str()],
            Value::Array(items) => {
                let codes: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                if codes.len() != items.len() {
                    result.error(name, "values bound to a value set must be strings");
                    return;
                }
                codes
            }
            other => {
                result.error(
                    name,
                    format!("cannot check a {} against a value set", json_type_name(other)),
                );
                return;
            }
        };

        let url = &binding.value_set_url;
        let mut degradations = BTreeSet::new();
        for code in codes {
            let check = self.canonical.check_code(url, code).await;
            degradations.extend(check.warnings);
            match (check.membership, binding.strength) {
                (Membership::NotMember, BindingStrength::Required) => {
                    result.error(name, format!("'{}' is not in value set {}", code, url));
                }
                (Membership::NotMember, _) => {
                    result.warning(
                        name,
                        format!(
                            "'{}' is not in value set {}; accepted under {} binding",
                            code, url, binding.strength
                        ),
                    );
                }
                (Membership::Member | Membership::Unavailable, _) => {}
            }
        }
        for warning in degradations {
            result.warning(name, warning);
        }
    }

    /// Partition the catalog by whether questions declare canonical references
    pub fn audit_canonical_references(&self) -> Result<CanonicalAudit, FaqError> {
        let mut audit = CanonicalAudit::default();
        let mut distinct = BTreeSet::new();

        for definition in self.get_all_schemas()? {
            let urls = definition.canonical_urls();
            if urls.is_empty() {
                audit.questions_without_canonicals.push(definition.id);
            } else {
                distinct.extend(urls.iter().cloned());
                audit.questions_with_canonicals.push(definition.id.clone());
                audit.canonicals_by_question.insert(definition.id, urls);
            }
        }
        audit.total_canonicals = distinct.len();
        Ok(audit)
    }

    /// Codes of the ValueSet a parameter is bound to; empty when unbound or unavailable
    pub async fn get_parameter_value_set_codes(
        &self,
        question_id: &str,
        parameter_name: &str,
    ) -> Result<Vec<ValueSetCode>, FaqError> {
        let definition = self
            .get_question(question_id)?
            .ok_or_else(|| FaqError::not_found(question_id))?;
        let Some(binding) = definition
            .parameter(parameter_name)
            .and_then(|p| p.value_set_binding.as_ref())
        else {
            return Ok(Vec::new());
        };
        Ok(self
            .canonical
            .expand_value_set(&binding.value_set_url)
            .await
            .map(|expansion| expansion.codes)
            .unwrap_or_default())
    }

    pub fn get_openapi_schema(&self) -> Result<Value, FaqError> {
        Ok(openapi::render(
            &self.get_all_schemas()?,
            env!("CARGO_PKG_VERSION"),
        ))
    }
}
