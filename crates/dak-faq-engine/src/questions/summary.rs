//! `dak-summary`: identity and publication metadata of the DAK

use crate::executor::{ExecutionInput, ExecutorError, QuestionExecutor};
use crate::registry::QuestionModule;
use async_trait::async_trait;
use dak_faq_types::{QuestionDefinition, QuestionLevel, QuestionResult};
use serde_json::{Value, json};

pub const DAK_SUMMARY: &str = "dak-summary";

const DAK_MODEL: &str = "http://smart.who.int/base/StructureDefinition/DAK";

pub(super) fn module() -> QuestionModule {
    QuestionModule::new(
        QuestionDefinition::new(DAK_SUMMARY, QuestionLevel::Project, "DAK summary")
            .with_description(
                "Identity, version, status and publisher of the DAK, read from dak.json or sushi-config.yaml",
            )
            .with_tags(["overview", "metadata"])
            .with_canonical_reference(DAK_MODEL),
        DakSummary,
    )
}

struct DakSummary;

fn text(document: &Value, key: &str) -> Option<String> {
    match document.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn publisher(document: &Value) -> Option<String> {
    match document.get("publisher")? {
        Value::String(name) => Some(name.clone()),
        Value::Object(publisher) => publisher.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn dependency_count(document: &Value) -> usize {
    match document.get("dependencies") {
        Some(Value::Object(map)) => map.len(),
        Some(Value::Array(items)) => items.len(),
        _ => 0,
    }
}

#[async_trait]
impl QuestionExecutor for DakSummary {
    async fn execute(&self, input: ExecutionInput) -> Result<QuestionResult, ExecutorError> {
        let storage = input.storage();

        let (source, document): (&str, Value) = if storage.file_exists("dak.json").await {
            let contents = storage.read_to_string("dak.json").await?;
            let document =
                serde_json::from_str(&contents).map_err(|e| ExecutorError::parse("dak.json", e))?;
            ("dak.json", document)
        } else if storage.file_exists("sushi-config.yaml").await {
            let contents = storage.read_to_string("sushi-config.yaml").await?;
            let document = serde_yaml::from_str(&contents)
                .map_err(|e| ExecutorError::parse("sushi-config.yaml", e))?;
            ("sushi-config.yaml", document)
        } else {
            return Err(ExecutorError::failed(
                "repository has neither dak.json nor sushi-config.yaml",
            ));
        };

        let id = text(&document, "id");
        let name = text(&document, "name");
        let title = text(&document, "title");
        let version = text(&document, "version");
        let status = text(&document, "status");
        let publisher = publisher(&document);
        let dependencies = dependency_count(&document);

        let label = title.clone().or_else(|| name.clone()).or_else(|| id.clone());
        let mut narrative = format!(
            "{} version {}",
            label.as_deref().unwrap_or("Unnamed DAK"),
            version.as_deref().unwrap_or("(unversioned)")
        );
        if let Some(status) = &status {
            narrative.push_str(&format!(", status {}", status));
        }
        if let Some(publisher) = &publisher {
            narrative.push_str(&format!(", published by {}", publisher));
        }
        narrative.push_str(&format!(". {} dependencies.", dependencies));

        let mut result = QuestionResult::new(
            json!({
                "source": source,
                "id": id,
                "name": name,
                "title": title,
                "version": version,
                "status": status,
                "publisher": publisher,
                "dependencyCount": dependencies,
            }),
            narrative,
        );
        if id.is_none() {
            result = result.with_warning(format!("{} does not declare an id", source));
        }
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

    fn input(storage: MemoryStorage) -> ExecutionInput {
        ExecutionInput {
            question_id: DAK_SUMMARY.into(),
            parameters: JsonMap::new(),
            asset_files: Vec::new(),
            context: ExecutionContext::new(Arc::new(storage)),
        }
    }

    #[tokio::test]
    async fn test_reads_sushi_config() {
        let storage = MemoryStorage::new()
            .with_file(
                "sushi-config.yaml",
                "id: smart.who.int.anc\nname: ANC\ntitle: Antenatal Care\nversion: 1.0.0\nstatus: draft\npublisher:\n  name: WHO\ndependencies:\n  smart.who.int.base: current\n  hl7.fhir.uv.cpg: 2.0.0\n",
            )
            .unwrap();
        let result = DakSummary.execute(input(storage)).await.unwrap();

        assert_eq!(result.structured["source"], "sushi-config.yaml");
        assert_eq!(result.structured["id"], "smart.who.int.anc");
        assert_eq!(result.structured["publisher"], "WHO");
        assert_eq!(result.structured["dependencyCount"], 2);
        assert!(result.narrative.starts_with("Antenatal Care version 1.0.0"));
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_prefers_dak_json() {
        let storage = MemoryStorage::new()
            .with_file("dak.json", r#"{"name": "Immunizations", "publisher": "WHO"}"#)
            .unwrap()
            .with_file("sushi-config.yaml", "id: other\n")
            .unwrap();
        let result = DakSummary.execute(input(storage)).await.unwrap();

        assert_eq!(result.structured["source"], "dak.json");
        assert_eq!(result.structured["name"], "Immunizations");
        assert_eq!(result.warnings, vec!["dak.json does not declare an id"]);
    }

    #[tokio::test]
    async fn test_missing_and_malformed_metadata() {
        let empty = DakSummary.execute(input(MemoryStorage::new())).await;
        assert!(matches!(empty, Err(ExecutorError::Failed(_))));

        let broken = MemoryStorage::new().with_file("dak.json", "{").unwrap();
        let result = DakSummary.execute(input(broken)).await;
        assert!(matches!(result, Err(ExecutorError::Parse { path, .. }) if path == "dak.json"));
    }
}
