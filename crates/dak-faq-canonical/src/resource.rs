//! Interpretation of fetched canonical documents
//!
//! Published vocabularies arrive in several shapes: FHIR ValueSets (expanded or
//! not), FHIR StructureDefinitions, and JSON schemas generated from either. These
//! helpers classify a document and pull enumerated codes out of it.

use dak_faq_types::{CanonicalType, ValueSetCode};
use serde_json::Value;
use std::collections::HashSet;

/// Classify a document by `resourceType`, then by URL, then by schema shape
pub fn detect_type(url: &str, payload: &Value) -> CanonicalType {
    match payload.get("resourceType").and_then(Value::as_str) {
        Some("ValueSet") => return CanonicalType::ValueSet,
        Some("StructureDefinition") => {
            let logical = payload.get("kind").and_then(Value::as_str) == Some("logical");
            return if logical {
                CanonicalType::LogicalModel
            } else {
                CanonicalType::StructureDefinition
            };
        }
        _ => {}
    }

    if url.contains("/ValueSet/") || url.contains("/ValueSet-") {
        return CanonicalType::ValueSet;
    }
    if ["/StructureDefinition/", "/StructureDefinition-", "LogicalModel"]
        .iter()
        .any(|segment| url.contains(segment))
    {
        return CanonicalType::LogicalModel;
    }

    let has_enumeration = ["enum", "oneOf", "anyOf"]
        .iter()
        .any(|k| payload.get(*k).is_some_and(Value::is_array));
    if has_enumeration && payload.get("properties").is_none() {
        CanonicalType::ValueSet
    } else {
        CanonicalType::LogicalModel
    }
}

/// Every enumerated code in a document, deduplicated per `(system, code)`
///
/// Sources, in order: `oneOf`/`anyOf` alternatives, `enum`, array `items`,
/// `expansion.contains` (nested), `compose.include[].concept`. The first
/// occurrence of a code wins.
pub fn extract_codes(payload: &Value) -> Vec<ValueSetCode> {
    let mut codes = Codes::default();
    collect_schema(payload, &mut codes);

    if let Some(contains) = payload.pointer("/expansion/contains").and_then(Value::as_array) {
        collect_contains(contains, &mut codes);
    }

    if let Some(includes) = payload.pointer("/compose/include").and_then(Value::as_array) {
        for include in includes {
            let system = include.get("system").and_then(Value::as_str);
            for concept in include
                .get("concept")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
            {
                if let Some(code) = concept_code(concept, system) {
                    codes.push(code);
                }
            }
        }
    }

    codes.into_vec()
}

#[derive(Default)]
struct Codes {
    seen: HashSet<(Option<String>, String)>,
    codes: Vec<ValueSetCode>,
}

impl Codes {
    fn push(&mut self, code: ValueSetCode) {
        if self.seen.insert((code.system.clone(), code.code.clone())) {
            self.codes.push(code);
        }
    }

    fn into_vec(self) -> Vec<ValueSetCode> {
        self.codes
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn collect_schema(schema: &Value, codes: &mut Codes) {
    for key in ["oneOf", "anyOf"] {
        for alternative in schema.get(key).and_then(Value::as_array).into_iter().flatten() {
            let value = alternative.get("const").or_else(|| {
                alternative
                    .get("enum")
                    .and_then(Value::as_array)
                    .and_then(|values| values.first())
            });
            let Some(code) = value.and_then(scalar) else {
                continue;
            };
            let mut entry = ValueSetCode::new(code);
            if let Some(title) = alternative.get("title").and_then(Value::as_str) {
                entry = entry.with_display(title);
            }
            if let Some(description) = alternative.get("description").and_then(Value::as_str) {
                entry = entry.with_definition(description);
            }
            codes.push(entry);
        }
    }

    for value in schema.get("enum").and_then(Value::as_array).into_iter().flatten() {
        if let Some(code) = scalar(value) {
            codes.push(ValueSetCode::new(code));
        }
    }

    if let Some(items) = schema.get("items").filter(|items| items.is_object()) {
        collect_schema(items, codes);
    }
}

fn collect_contains(contains: &[Value], codes: &mut Codes) {
    for entry in contains {
        let system = entry.get("system").and_then(Value::as_str);
        if let Some(code) = concept_code(entry, system) {
            codes.push(code);
        }
        if let Some(nested) = entry.get("contains").and_then(Value::as_array) {
            collect_contains(nested, codes);
        }
    }
}

fn concept_code(concept: &Value, system: Option<&str>) -> Option<ValueSetCode> {
    let code = concept.get("code").and_then(Value::as_str)?;
    let mut entry = ValueSetCode::new(code);
    if let Some(system) = system {
        entry = entry.with_system(system);
    }
    if let Some(display) = concept.get("display").and_then(Value::as_str) {
        entry = entry.with_display(display);
    }
    if let Some(definition) = concept.get("definition").and_then(Value::as_str) {
        entry = entry.with_definition(definition);
    }
    Some(entry)
}
