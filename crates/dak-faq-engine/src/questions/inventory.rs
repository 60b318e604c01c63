//! `component-inventory`: how many files back each DAK component

use crate::executor::{ExecutionInput, ExecutorError, QuestionExecutor};
use crate::registry::QuestionModule;
use async_trait::async_trait;
use dak_faq_canonical::known::DAK_COMPONENT_TYPE_VALUE_SET;
use dak_faq_storage::ListOptions;
use dak_faq_types::{
    ParameterSpec, ParameterType, QuestionDefinition, QuestionLevel, QuestionResult,
    ValueSetBinding,
};
use serde_json::{Value, json};
use std::collections::BTreeSet;

pub const COMPONENT_INVENTORY: &str = "component-inventory";

/// DAK components with the repository locations their sources live under
pub const DAK_COMPONENTS: &[(&str, &str, &[&str])] = &[
    (
        "health-interventions",
        "Health interventions and recommendations",
        &["input/pagecontent/health-interventions*.md"],
    ),
    (
        "generic-personas",
        "Generic personas",
        &["input/fsh/actors/**/*.fsh", "input/actors/**/*.json"],
    ),
    (
        "user-scenarios",
        "User scenarios",
        &["input/pagecontent/user-scenario*.md"],
    ),
    (
        "business-processes",
        "Business processes and workflows",
        &["input/business-processes/**/*.bpmn", "input/images/**/*.bpmn"],
    ),
    (
        "core-data-elements",
        "Core data elements",
        &["input/fsh/models/**/*.fsh", "input/dictionary/**/*"],
    ),
    (
        "decision-support-logic",
        "Decision-support logic",
        &["input/dmn/**/*.dmn", "input/cql/**/*.cql"],
    ),
    (
        "program-indicators",
        "Program indicators",
        &["input/fsh/measures/**/*.fsh"],
    ),
    (
        "requirements",
        "Functional and non-functional requirements",
        &["input/fsh/requirements/**/*.fsh", "input/requirements/**/*"],
    ),
    (
        "test-scenarios",
        "Test scenarios",
        &["input/testing/**/*"],
    ),
];

pub(super) fn module() -> QuestionModule {
    QuestionModule::new(
        QuestionDefinition::new(
            COMPONENT_INVENTORY,
            QuestionLevel::Project,
            "Component inventory",
        )
        .with_description("Number of source files found for each DAK component")
        .with_tags(["overview", "components"])
        .with_parameter(
            ParameterSpec::new("componentType", ParameterType::String)
                .with_description("Restrict the inventory to one component")
                .with_binding(
                    ValueSetBinding::extensible(DAK_COMPONENT_TYPE_VALUE_SET)
                        .with_note("Local component types are allowed"),
                ),
        )
        .with_parameter(
            ParameterSpec::new("includeFiles", ParameterType::Boolean)
                .with_description("List the matched files")
                .with_default(json!(false)),
        ),
        ComponentInventory,
    )
}

struct ComponentInventory;

#[async_trait]
impl QuestionExecutor for ComponentInventory {
    async fn execute(&self, input: ExecutionInput) -> Result<QuestionResult, ExecutorError> {
        let storage = input.storage();
        let include_files = input.bool_param("includeFiles").unwrap_or(false);
        let selected = input.str_param("componentType");

        let mut warnings = Vec::new();
        let components: Vec<_> = match selected {
            Some(kind) => {
                let found: Vec<_> = DAK_COMPONENTS.iter().filter(|(k, ..)| *k == kind).collect();
                if found.is_empty() {
                    warnings.push(format!("no file layout is known for component type '{}'", kind));
                }
                found
            }
            None => DAK_COMPONENTS.iter().collect(),
        };

        let mut entries = Vec::new();
        let mut total = 0;
        let mut lines = Vec::new();
        for (kind, label, patterns) in components {
            let mut files = BTreeSet::new();
            for pattern in *patterns {
                files.extend(storage.list_files(pattern, &ListOptions::new()).await?);
            }
            total += files.len();
            lines.push(format!("{}: {}", label, files.len()));

            let mut entry = json!({
                "componentType": kind,
                "label": label,
                "fileCount": files.len(),
            });
            if include_files {
                entry["files"] = json!(files);
            }
            entries.push(entry);
        }

        let narrative = if lines.is_empty() {
            "No matching components.".to_string()
        } else {
            format!("{} files across {} components. {}", total, entries.len(), lines.join("; "))
        };

        let mut result = QuestionResult::new(
            json!({"components": Value::Array(entries), "totalFiles": total}),
            narrative,
        );
        result.warnings.extend(warnings);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionContext;
    use dak_faq_storage::MemoryStorage;
    use dak_faq_types::JsonMap;
    use std::sync::Arc;

    fn storage() -> MemoryStorage {
        let storage = MemoryStorage::new();
        for path in [
            "input/business-processes/anc/registration.bpmn",
            "input/business-processes/anc/visit.bpmn",
            "input/dmn/ANC.DT.01.dmn",
            "input/cql/ANCDT01.cql",
            "input/fsh/actors/client.fsh",
        ] {
            storage.insert(path, "x").unwrap();
        }
        storage
    }

    fn input(parameters: Value) -> ExecutionInput {
        let parameters: JsonMap = serde_json::from_value(parameters).unwrap();
        ExecutionInput {
            question_id: COMPONENT_INVENTORY.into(),
            parameters,
            asset_files: Vec::new(),
            context: ExecutionContext::new(Arc::new(storage())),
        }
    }

    #[tokio::test]
    async fn test_full_inventory() {
        let result = ComponentInventory.execute(input(json!({}))).await.unwrap();
        assert_eq!(result.structured["totalFiles"], 5);
        let components = result.structured["components"].as_array().unwrap();
        assert_eq!(components.len(), DAK_COMPONENTS.len());
        assert!(components[0].get("files").is_none());
    }

    #[tokio::test]
    async fn test_single_component_with_files() {
        let result = ComponentInventory
            .execute(input(json!({"componentType": "decision-support-logic", "includeFiles": true})))
            .await
            .unwrap();
        assert_eq!(
            result.structured["components"][0]["files"],
            json!(["input/cql/ANCDT01.cql", "input/dmn/ANC.DT.01.dmn"])
        );
    }

    #[tokio::test]
    async fn test_local_component_type_warns() {
        let result = ComponentInventory
            .execute(input(json!({"componentType": "local-extension"})))
            .await
            .unwrap();
        assert_eq!(result.structured["totalFiles"], 0);
        assert_eq!(result.warnings.len(), 1);
    }
}
