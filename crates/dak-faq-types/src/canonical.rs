//! Canonical vocabulary resources

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of canonical resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalType {
    ValueSet,
    LogicalModel,
    StructureDefinition,
}

impl CanonicalType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CanonicalType::ValueSet => "ValueSet",
            CanonicalType::LogicalModel => "LogicalModel",
            CanonicalType::StructureDefinition => "StructureDefinition",
        }
    }
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a returned resource came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceOrigin {
    Remote,
    Cache,
}

/// A fetched vocabulary artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalResource {
    pub url: String,
    #[serde(rename = "type")]
    pub resource_type: CanonicalType,
    /// Payload as published
    pub schema: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub last_fetched: DateTime<Utc>,
    pub origin: ResourceOrigin,
}

impl CanonicalResource {
    pub fn new(url: impl Into<String>, resource_type: CanonicalType, schema: Value) -> Self {
        Self {
            url: url.into(),
            resource_type,
            schema,
            version: None,
            last_fetched: Utc::now(),
            origin: ResourceOrigin::Remote,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_last_fetched(mut self, last_fetched: DateTime<Utc>) -> Self {
        self.last_fetched = last_fetched;
        self
    }

    /// Same resource, marked as served from the cache
    pub fn from_cache(mut self) -> Self {
        self.origin = ResourceOrigin::Cache;
        self
    }

    /// Human-readable title from the payload, if any
    pub fn title(&self) -> Option<&str> {
        self.schema
            .get("title")
            .or_else(|| self.schema.get("name"))
            .and_then(Value::as_str)
    }
}

/// One code of a ValueSet expansion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSetCode {
    pub code: String,
    pub display: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl ValueSetCode {
    /// A code whose display is the code itself
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            display: code.clone(),
            code,
            system: None,
            definition: None,
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = display.into();
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }
}

/// Enumerated codes of a ValueSet, derived on demand from its resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSetExpansion {
    pub url: String,
    pub codes: Vec<ValueSetCode>,
    pub loaded_at: DateTime<Utc>,
}

impl ValueSetExpansion {
    /// Literal membership test on the code value
    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c.code == code)
    }

    pub fn code_values(&self) -> Vec<&str> {
        self.codes.iter().map(|c| c.code.as_str()).collect()
    }
}

/// Outcome of a structural validation against a canonical model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub validated_against: String,
}

impl CanonicalValidationResult {
    pub fn new(validated_against: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            validated_against: validated_against.into(),
        }
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Entry of the static directory of well-known canonical URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownCanonical {
    pub url: String,
    #[serde(rename = "type")]
    pub resource_type: CanonicalType,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Vocabulary cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Distinct keys across both tiers
    pub total: usize,
    pub fresh: usize,
    pub stale: usize,
    pub memory_entries: usize,
    pub durable_entries: usize,
}

/// Summary of a cached resource, for administration listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedCanonical {
    pub key: String,
    pub url: String,
    #[serde(rename = "type")]
    pub resource_type: CanonicalType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub last_fetched: DateTime<Utc>,
    pub is_fresh: bool,
}
