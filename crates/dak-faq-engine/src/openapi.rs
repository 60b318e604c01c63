//! OpenAPI rendering of the question catalog

use dak_faq_types::{ParameterSpec, QuestionDefinition};
use serde_json::{Map, Value, json};

pub const OPENAPI_VERSION: &str = "3.0.3";

/// JSON schema of a single parameter, with its binding as an extension
pub fn parameter_schema(parameter: &ParameterSpec) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), json!(parameter.param_type.as_str()));
    if !parameter.description.is_empty() {
        schema.insert("description".into(), json!(parameter.description));
    }
    if let Some(default) = &parameter.default_value {
        schema.insert("default".into(), default.clone());
    }
    if let Some(pattern) = &parameter.pattern {
        schema.insert("pattern".into(), json!(pattern));
    }
    if let Some(binding) = &parameter.value_set_binding {
        let mut extension = Map::new();
        extension.insert("strength".into(), json!(binding.strength.as_str()));
        extension.insert("valueSet".into(), json!(binding.value_set_url));
        if let Some(note) = &binding.note {
            extension.insert("note".into(), json!(note));
        }
        schema.insert("x-valueset-binding".into(), Value::Object(extension));
    }
    Value::Object(schema)
}

/// Input schema derived from a question's parameters
pub fn input_schema(definition: &QuestionDefinition) -> Value {
    let properties: Map<String, Value> = definition
        .parameters
        .iter()
        .map(|p| (p.name.clone(), parameter_schema(p)))
        .collect();
    let required: Vec<&str> = definition
        .parameters
        .iter()
        .filter(|p| p.required)
        .map(|p| p.name.as_str())
        .collect();

    let mut schema = json!({
        "type": "object",
        "properties": properties,
    });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

/// Output schema used when a question does not declare one
pub fn default_output_schema() -> Value {
    json!({"$ref": "#/components/schemas/QuestionResult"})
}

fn operation(definition: &QuestionDefinition) -> Value {
    let input = definition
        .schema
        .as_ref()
        .map(|s| s.input.clone())
        .unwrap_or_else(|| input_schema(definition));
    let output = definition
        .schema
        .as_ref()
        .map(|s| s.output.clone())
        .unwrap_or_else(default_output_schema);

    let mut op = json!({
        "operationId": definition.id,
        "summary": definition.title,
        "tags": definition.tags,
        "x-question-level": definition.level.as_str(),
        "requestBody": {
            "required": definition.parameters.iter().any(|p| p.required),
            "content": {"application/json": {"schema": {
                "type": "object",
                "properties": {
                    "parameters": input,
                    "assetFiles": {"type": "array", "items": {"type": "string"}}
                }
            }}}
        },
        "responses": {
            "200": {
                "description": "Question executed",
                "content": {"application/json": {"schema": {
                    "allOf": [
                        {"$ref": "#/components/schemas/ExecuteResponse"},
                        {"type": "object", "properties": {"result": {
                            "type": "object",
                            "properties": {"structured": output}
                        }}}
                    ]
                }}}
            },
            "400": {"$ref": "#/components/responses/ValidationError"},
            "404": {"$ref": "#/components/responses/NotFound"}
        }
    });
    if !definition.description.is_empty() {
        op["description"] = json!(definition.description);
    }
    if let Some(component) = &definition.component_type {
        op["x-component-type"] = json!(component);
    }
    if let Some(asset) = &definition.asset_type {
        op["x-asset-type"] = json!(asset);
    }
    let canonicals = definition.canonical_urls();
    if !canonicals.is_empty() {
        op["x-canonical-references"] = json!(canonicals);
    }
    op
}

fn components() -> Value {
    json!({
        "schemas": {
            "QuestionResult": {
                "type": "object",
                "required": ["structured", "narrative"],
                "properties": {
                    "structured": {"type": "object"},
                    "narrative": {"type": "string"},
                    "errors": {"type": "array", "items": {"type": "string"}},
                    "warnings": {"type": "array", "items": {"type": "string"}},
                    "meta": {"type": "object"}
                }
            },
            "ExecuteError": {
                "type": "object",
                "required": ["message", "code"],
                "properties": {
                    "message": {"type": "string"},
                    "code": {"type": "string", "enum": ["NOT_FOUND", "VALIDATION_ERROR", "EXECUTION_ERROR", "INTERNAL_ERROR"]},
                    "details": {"type": "array", "items": {"type": "object"}}
                }
            },
            "ExecuteResponse": {
                "type": "object",
                "required": ["success", "questionId"],
                "properties": {
                    "success": {"type": "boolean"},
                    "questionId": {"type": "string"},
                    "result": {"$ref": "#/components/schemas/QuestionResult"},
                    "error": {"$ref": "#/components/schemas/ExecuteError"}
                }
            },
            "BatchExecuteResponse": {
                "type": "object",
                "required": ["success", "results", "summary"],
                "properties": {
                    "success": {"type": "boolean"},
                    "results": {"type": "array", "items": {"$ref": "#/components/schemas/ExecuteResponse"}},
                    "summary": {
                        "type": "object",
                        "properties": {
                            "total": {"type": "integer"},
                            "successful": {"type": "integer"},
                            "failed": {"type": "integer"}
                        }
                    }
                }
            }
        },
        "responses": {
            "NotFound": {
                "description": "Unknown question",
                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ExecuteResponse"}}}
            },
            "ValidationError": {
                "description": "Parameters failed validation",
                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ExecuteResponse"}}}
            }
        }
    })
}

/// Render the catalog as an OpenAPI document
pub fn render(definitions: &[QuestionDefinition], version: &str) -> Value {
    let mut paths = Map::new();
    paths.insert(
        "/questions".into(),
        json!({"get": {
            "operationId": "listQuestions",
            "summary": "List available questions",
            "responses": {"200": {"description": "Question catalog"}}
        }}),
    );
    paths.insert(
        "/questions/batch".into(),
        json!({"post": {
            "operationId": "executeMany",
            "summary": "Execute several questions",
            "responses": {"200": {
                "description": "Batch outcome",
                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/BatchExecuteResponse"}}}
            }}
        }}),
    );
    for definition in definitions {
        paths.insert(
            format!("/questions/{}/execute", definition.id),
            json!({"post": operation(definition)}),
        );
    }

    json!({
        "openapi": OPENAPI_VERSION,
        "info": {
            "title": "DAK FAQ API",
            "version": version,
            "description": "Questions answerable about a Digital Adaptation Kit repository"
        },
        "paths": paths,
        "components": components()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dak_faq_types::{ParameterType, QuestionLevel, ValueSetBinding};

    fn definition() -> QuestionDefinition {
        QuestionDefinition::new("inventory", QuestionLevel::Project, "Inventory")
            .with_parameter(
                ParameterSpec::required("componentType", ParameterType::String)
                    .with_binding(ValueSetBinding::extensible("http://x/ValueSet/C")),
            )
            .with_parameter(
                ParameterSpec::new("includeFiles", ParameterType::Boolean).with_default(json!(false)),
            )
            .with_canonical_reference("http://x/StructureDefinition/DAK")
    }

    #[test]
    fn test_input_schema() {
        let schema = input_schema(&definition());
        assert_eq!(schema["required"], json!(["componentType"]));
        assert_eq!(
            schema["properties"]["componentType"]["x-valueset-binding"]["strength"],
            "extensible"
        );
        assert_eq!(schema["properties"]["includeFiles"]["default"], false);
    }

    #[test]
    fn test_render_paths() {
        let doc = render(&[definition()], "0.1.0");
        assert_eq!(doc["openapi"], OPENAPI_VERSION);
        let op = &doc["paths"]["/questions/inventory/execute"]["post"];
        assert_eq!(op["operationId"], "inventory");
        assert_eq!(
            op["x-canonical-references"],
            json!(["http://x/ValueSet/C", "http://x/StructureDefinition/DAK"])
        );
        assert!(doc["components"]["schemas"]["BatchExecuteResponse"].is_object());
    }
}
