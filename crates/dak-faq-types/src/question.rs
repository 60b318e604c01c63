//! Question definitions and parameter specifications

use dak_faq_diagnostics::FaqError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

/// Scope a question operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionLevel {
    /// Whole repository
    #[serde(alias = "project-wide")]
    Project,
    /// One DAK component
    #[serde(alias = "component-scoped")]
    Component,
    /// Individual asset files
    #[serde(alias = "file-scoped", alias = "asset")]
    File,
}

impl QuestionLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            QuestionLevel::Project => "project",
            QuestionLevel::Component => "component",
            QuestionLevel::File => "file",
        }
    }
}

impl fmt::Display for QuestionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "project" | "project-wide" => Ok(QuestionLevel::Project),
            "component" | "component-scoped" => Ok(QuestionLevel::Component),
            "file" | "file-scoped" | "asset" => Ok(QuestionLevel::File),
            other => Err(format!("Unknown question level: {}", other)),
        }
    }
}

/// Declared type of a parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ParameterType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ParameterType::String => "string",
            ParameterType::Number => "number",
            ParameterType::Integer => "integer",
            ParameterType::Boolean => "boolean",
            ParameterType::Array => "array",
            ParameterType::Object => "object",
        }
    }

    /// Check whether a JSON value conforms to this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParameterType::String => value.is_string(),
            ParameterType::Number => value.is_number(),
            ParameterType::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
            }
            ParameterType::Boolean => value.is_boolean(),
            ParameterType::Array => value.is_array(),
            ParameterType::Object => value.is_object(),
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of the JSON type of a value, for error messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Enforcement level of a vocabulary binding
///
/// See <https://www.hl7.org/fhir/valueset-binding-strength.html>.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingStrength {
    /// Values must come from the ValueSet
    Required,
    /// Values should come from the ValueSet; other codes are accepted with a warning
    Extensible,
    /// Use of the ValueSet is encouraged
    Preferred,
    /// The ValueSet is only illustrative
    Example,
}

impl BindingStrength {
    pub const fn as_str(&self) -> &'static str {
        match self {
            BindingStrength::Required => "required",
            BindingStrength::Extensible => "extensible",
            BindingStrength::Preferred => "preferred",
            BindingStrength::Example => "example",
        }
    }

    /// Whether a non-member value is reported at all
    pub const fn reports_non_members(&self) -> bool {
        matches!(self, BindingStrength::Required | BindingStrength::Extensible)
    }
}

impl fmt::Display for BindingStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindingStrength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "required" => Ok(BindingStrength::Required),
            "extensible" => Ok(BindingStrength::Extensible),
            "preferred" => Ok(BindingStrength::Preferred),
            "example" => Ok(BindingStrength::Example),
            other => Err(format!("Unknown binding strength: {}", other)),
        }
    }
}

/// Binding of a parameter to a canonical ValueSet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSetBinding {
    pub strength: BindingStrength,
    pub value_set_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ValueSetBinding {
    pub fn new(strength: BindingStrength, value_set_url: impl Into<String>) -> Self {
        Self {
            strength,
            value_set_url: value_set_url.into(),
            note: None,
        }
    }

    pub fn required(value_set_url: impl Into<String>) -> Self {
        Self::new(BindingStrength::Required, value_set_url)
    }

    pub fn extensible(value_set_url: impl Into<String>) -> Self {
        Self::new(BindingStrength::Extensible, value_set_url)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// One declared parameter of a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_set_binding: Option<ValueSetBinding>,
    /// Regular expression string values must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl ParameterSpec {
    /// Create an optional parameter
    pub fn new(name: impl Into<String>, param_type: ParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: false,
            description: String::new(),
            default_value: None,
            value_set_binding: None,
            pattern: None,
        }
    }

    /// Create a required parameter
    pub fn required(name: impl Into<String>, param_type: ParameterType) -> Self {
        Self {
            required: true,
            ..Self::new(name, param_type)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_binding(mut self, binding: ValueSetBinding) -> Self {
        self.value_set_binding = Some(binding);
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}

/// Input/output JSON Schema pair published for a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSchemaPair {
    pub input: Value,
    pub output: Value,
}

/// Static metadata for one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDefinition {
    pub id: String,
    pub level: QuestionLevel,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<QuestionSchemaPair>,
    /// Canonical models the question relies on besides its parameter bindings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub canonical_references: Vec<String>,
}

impl QuestionDefinition {
    pub fn new(id: impl Into<String>, level: QuestionLevel, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            level,
            title: title.into(),
            description: String::new(),
            parameters: Vec::new(),
            tags: BTreeSet::new(),
            component_type: None,
            asset_type: None,
            schema: None,
            canonical_references: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_component_type(mut self, component_type: impl Into<String>) -> Self {
        self.component_type = Some(component_type.into());
        self
    }

    pub fn with_asset_type(mut self, asset_type: impl Into<String>) -> Self {
        self.asset_type = Some(asset_type.into());
        self
    }

    pub fn with_schema(mut self, input: Value, output: Value) -> Self {
        self.schema = Some(QuestionSchemaPair { input, output });
        self
    }

    pub fn with_canonical_reference(mut self, url: impl Into<String>) -> Self {
        self.canonical_references.push(url.into());
        self
    }

    /// Look up a parameter by name
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// All canonical URLs this question references, bindings first, without duplicates
    pub fn canonical_urls(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.parameters
            .iter()
            .filter_map(|p| p.value_set_binding.as_ref().map(|b| b.value_set_url.clone()))
            .chain(self.canonical_references.iter().cloned())
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }

    /// Check the catalog invariants of a single definition
    pub fn validate(&self) -> Result<(), FaqError> {
        if self.id.trim().is_empty() {
            return Err(FaqError::invalid_definition(&self.id, "id must not be empty"));
        }
        let mut names = HashSet::new();
        for parameter in &self.parameters {
            if parameter.name.trim().is_empty() {
                return Err(FaqError::invalid_definition(
                    &self.id,
                    "parameter names must not be empty",
                ));
            }
            if !names.insert(parameter.name.as_str()) {
                return Err(FaqError::invalid_definition(
                    &self.id,
                    format!("duplicate parameter name '{}'", parameter.name),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(ParameterType::String, json!("x"), true)]
    #[case(ParameterType::String, json!(1), false)]
    #[case(ParameterType::Integer, json!(3), true)]
    #[case(ParameterType::Integer, json!(3.0), true)]
    #[case(ParameterType::Integer, json!(3.5), false)]
    #[case(ParameterType::Number, json!(3.5), true)]
    #[case(ParameterType::Boolean, json!(false), true)]
    #[case(ParameterType::Boolean, json!("false"), false)]
    #[case(ParameterType::Array, json!(["a"]), true)]
    #[case(ParameterType::Object, json!({"a": 1}), true)]
    #[case(ParameterType::Object, json!(null), false)]
    fn test_parameter_type_accepts(
        #[case] param_type: ParameterType,
        #[case] value: Value,
        #[case] expected: bool,
    ) {
        assert_eq!(param_type.accepts(&value), expected);
    }

    #[test]
    fn test_duplicate_parameter_names_rejected() {
        let def = QuestionDefinition::new("q", QuestionLevel::Project, "Q")
            .with_parameter(ParameterSpec::new("a", ParameterType::String))
            .with_parameter(ParameterSpec::new("a", ParameterType::Boolean));

        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate parameter name 'a'"));
    }

    #[test]
    fn test_canonical_urls_deduplicated() {
        let def = QuestionDefinition::new("q", QuestionLevel::Project, "Q")
            .with_parameter(
                ParameterSpec::new("a", ParameterType::String)
                    .with_binding(ValueSetBinding::required("http://x/ValueSet/A")),
            )
            .with_parameter(
                ParameterSpec::new("b", ParameterType::String)
                    .with_binding(ValueSetBinding::extensible("http://x/ValueSet/A")),
            )
            .with_canonical_reference("http://x/StructureDefinition/M");

        assert_eq!(
            def.canonical_urls(),
            vec!["http://x/ValueSet/A".to_string(), "http://x/StructureDefinition/M".to_string()]
        );
    }

    #[test]
    fn test_definition_serializes_camel_case() {
        let def = QuestionDefinition::new("q", QuestionLevel::Component, "Q").with_parameter(
            ParameterSpec::required("componentType", ParameterType::String)
                .with_binding(ValueSetBinding::required("http://x/ValueSet/A")),
        );

        let value = serde_json::to_value(&def).unwrap();
        assert_eq!(value["level"], "component");
        assert_eq!(value["parameters"][0]["type"], "string");
        assert_eq!(
            value["parameters"][0]["valueSetBinding"]["valueSetUrl"],
            "http://x/ValueSet/A"
        );
    }

    #[rstest]
    #[case("project-wide", QuestionLevel::Project)]
    #[case("component", QuestionLevel::Component)]
    #[case("File-Scoped", QuestionLevel::File)]
    fn test_level_parse(#[case] input: &str, #[case] expected: QuestionLevel) {
        assert_eq!(input.parse::<QuestionLevel>().unwrap(), expected);
    }

    #[test]
    fn test_level_alias_deserializes() {
        let level: QuestionLevel = serde_json::from_value(json!("file-scoped")).unwrap();
        assert_eq!(level, QuestionLevel::File);
    }
}
