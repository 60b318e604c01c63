//! Structural validation of data against a canonical resource
//!
//! Two resource shapes are understood: JSON schemas (as published for DAK logical
//! models and ValueSets) and FHIR StructureDefinitions. Only the subset needed for
//! DAK artifacts is checked: types, required members, enumerations, closed
//! objects and cardinality. Other keywords are ignored; a `$ref` is reported as
//! not followed.

use crate::resource::extract_codes;
use dak_faq_types::{CanonicalResource, CanonicalType, CanonicalValidationResult, json_type_name};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Validate `data` against a resolved resource
pub fn validate_structure(resource: &CanonicalResource, data: &Value) -> CanonicalValidationResult {
    let mut result = CanonicalValidationResult::new(resource.url.clone());
    let schema = &resource.schema;

    if schema.get("resourceType").and_then(Value::as_str) == Some("StructureDefinition") {
        validate_structure_definition(schema, data, &mut result);
    } else if resource.resource_type == CanonicalType::ValueSet && !has_json_schema_type(schema) {
        validate_codes(schema, data, &mut result);
    } else {
        validate_schema(schema, data, "$", &mut result);
    }
    result
}

fn has_json_schema_type(schema: &Value) -> bool {
    schema.get("type").is_some() || schema.get("enum").is_some() || schema.get("oneOf").is_some()
}

/// FHIR ValueSet without a schema view: data must be one of its codes
fn validate_codes(schema: &Value, data: &Value, result: &mut CanonicalValidationResult) {
    let codes: HashSet<String> = extract_codes(schema).into_iter().map(|c| c.code).collect();
    if codes.is_empty() {
        result.warning("value set enumerates no codes; membership not checked");
        return;
    }
    let values: Vec<&Value> = match data {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    for value in values {
        match value.as_str() {
            Some(code) if codes.contains(code) => {}
            Some(code) => result.error(format!("'{}' is not a member of the value set", code)),
            None => result.error(format!("expected a code, found {}", json_type_name(value))),
        }
    }
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn validate_schema(schema: &Value, data: &Value, path: &str, result: &mut CanonicalValidationResult) {
    let Some(schema) = schema.as_object() else {
        return;
    };

    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        result.warning(format!("{}: reference {} not followed", path, reference));
    }

    let expected: Vec<&str> = match schema.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    if !expected.is_empty() && !expected.iter().any(|t| type_matches(t, data)) {
        result.error(format!(
            "{}: expected {}, found {}",
            path,
            expected.join(" or "),
            json_type_name(data)
        ));
        return;
    }

    if let Some(allowed) = schema.get("enum").and_then(Value::as_array) {
        if !allowed.contains(data) {
            result.error(format!("{}: {} is not an allowed value", path, data));
        }
    }
    if let Some(constant) = schema.get("const") {
        if constant != data {
            result.error(format!("{}: expected {}", path, constant));
        }
    }
    if let Some(alternatives) = schema.get("oneOf").and_then(Value::as_array) {
        let constants: Vec<&Value> = alternatives.iter().filter_map(|a| a.get("const")).collect();
        if constants.len() == alternatives.len() && !constants.contains(&data) {
            result.error(format!("{}: {} is not an allowed value", path, data));
        }
    }

    match data {
        Value::Object(members) => validate_object(schema, members, path, result),
        Value::Array(items) => {
            if let Some(min) = schema.get("minItems").and_then(Value::as_u64) {
                if (items.len() as u64) < min {
                    result.error(format!("{}: expected at least {} items", path, min));
                }
            }
            if let Some(item_schema) = schema.get("items") {
                for (i, item) in items.iter().enumerate() {
                    validate_schema(item_schema, item, &format!("{}[{}]", path, i), result);
                }
            }
        }
        _ => {}
    }
}

fn validate_object(
    schema: &Map<String, Value>,
    members: &Map<String, Value>,
    path: &str,
    result: &mut CanonicalValidationResult,
) {
    for name in schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
    {
        if !members.contains_key(name) {
            result.error(format!("{}: missing required property '{}'", path, name));
        }
    }

    let properties = schema.get("properties").and_then(Value::as_object);
    let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));

    for (name, value) in members {
        let child = format!("{}.{}", path, name);
        match properties.and_then(|p| p.get(name)) {
            Some(property) => validate_schema(property, value, &child, result),
            None if closed => result.error(format!("{}: unexpected property", child)),
            None => {}
        }
    }
}

struct Element<'a> {
    name: &'a str,
    min: u64,
    many: bool,
    type_code: Option<&'a str>,
}

fn validate_structure_definition(
    definition: &Value,
    data: &Value,
    result: &mut CanonicalValidationResult,
) {
    let elements = definition
        .pointer("/snapshot/element")
        .or_else(|| definition.pointer("/differential/element"))
        .and_then(Value::as_array);
    let Some(elements) = elements else {
        result.warning("structure definition declares no elements; nothing checked");
        return;
    };
    let Some(members) = data.as_object() else {
        result.error(format!("$: expected object, found {}", json_type_name(data)));
        return;
    };

    let root = elements
        .first()
        .and_then(|e| e.get("path"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let prefix = format!("{}.", root);

    let top_level: Vec<Element<'_>> = elements
        .iter()
        .filter_map(|e| {
            let path = e.get("path").and_then(Value::as_str)?;
            let name = path.strip_prefix(&prefix).filter(|n| !n.contains('.'))?;
            Some(Element {
                name: name.trim_end_matches("[x]"),
                min: e.get("min").and_then(Value::as_u64).unwrap_or(0),
                many: e.get("max").and_then(Value::as_str).is_some_and(|m| m != "0" && m != "1"),
                type_code: e.pointer("/type/0/code").and_then(Value::as_str),
            })
        })
        .collect();

    for element in &top_level {
        match members.get(element.name) {
            None if element.min > 0 => {
                result.error(format!("$: missing required element '{}'", element.name))
            }
            None => {}
            Some(value) => check_element(element, value, result),
        }
    }

    for name in members.keys() {
        if !top_level.iter().any(|e| e.name == name) {
            result.warning(format!("$.{}: not defined by the model", name));
        }
    }
}

fn check_element(element: &Element<'_>, value: &Value, result: &mut CanonicalValidationResult) {
    let path = format!("$.{}", element.name);
    let values: Vec<&Value> = match value {
        Value::Array(items) if element.many => items.iter().collect(),
        Value::Array(_) => {
            result.error(format!("{}: at most one value allowed", path));
            return;
        }
        single => vec![single],
    };
    if element.many && (values.len() as u64) < element.min {
        result.error(format!("{}: expected at least {} values", path, element.min));
    }

    let Some(expected) = element.type_code.and_then(json_type_for_fhir) else {
        return;
    };
    for value in values {
        if !type_matches(expected, value) {
            result.error(format!(
                "{}: expected {}, found {}",
                path,
                expected,
                json_type_name(value)
            ));
        }
    }
}

fn json_type_for_fhir(code: &str) -> Option<&'static str> {
    match code {
        "string" | "code" | "uri" | "url" | "canonical" | "id" | "markdown" | "date"
        | "dateTime" | "instant" | "time" | "oid" | "uuid" => Some("string"),
        "boolean" => Some("boolean"),
        "integer" | "positiveInt" | "unsignedInt" => Some("integer"),
        "decimal" => Some("number"),
        "Coding" | "CodeableConcept" | "Reference" | "Identifier" | "Period" | "Quantity" => {
            Some("object")
        }
        _ => None,
    }
}
