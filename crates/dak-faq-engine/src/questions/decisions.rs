//! `decision-table-inputs`: decisions declared in DMN files and their inputs

use super::select_files;
use super::xml::{attribute, local_name};
use crate::executor::{ExecutionInput, ExecutorError, QuestionExecutor};
use crate::registry::QuestionModule;
use async_trait::async_trait;
use dak_faq_types::{ParameterSpec, ParameterType, QuestionDefinition, QuestionLevel, QuestionResult};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;
use serde_json::json;

pub const DECISION_TABLE_INPUTS: &str = "decision-table-inputs";

const DEFAULT_PATTERN: &str = "**/*.dmn";

pub(super) fn module() -> QuestionModule {
    QuestionModule::new(
        QuestionDefinition::new(
            DECISION_TABLE_INPUTS,
            QuestionLevel::Component,
            "Decision table inputs",
        )
        .with_description("Decisions declared in DMN files, with their inputs and outputs")
        .with_component_type("decision-support-logic")
        .with_tags(["logic", "dmn"])
        .with_parameter(
            ParameterSpec::new("filePattern", ParameterType::String)
                .with_description("Glob selecting DMN files")
                .with_default(json!(DEFAULT_PATTERN)),
        ),
        DecisionTableInputs,
    )
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct Decision {
    file: String,
    id: Option<String>,
    name: Option<String>,
    inputs: Vec<String>,
    outputs: Vec<String>,
    rule_count: usize,
}

fn on_element(file: &str, e: &BytesStart<'_>, current: &mut Option<Decision>) {
    let name = local_name(e);
    match (name.as_str(), current.as_mut()) {
        ("decision", _) => {
            *current = Some(Decision {
                file: file.to_string(),
                id: attribute(e, "id"),
                name: attribute(e, "name"),
                ..Decision::default()
            });
        }
        ("input", Some(decision)) => decision.inputs.push(
            attribute(e, "label")
                .or_else(|| attribute(e, "id"))
                .unwrap_or_default(),
        ),
        ("output", Some(decision)) => decision.outputs.push(
            attribute(e, "label")
                .or_else(|| attribute(e, "name"))
                .or_else(|| attribute(e, "id"))
                .unwrap_or_default(),
        ),
        ("rule", Some(decision)) => decision.rule_count += 1,
        _ => {}
    }
}

fn parse_dmn(file: &str, contents: &str) -> Result<Vec<Decision>, ExecutorError> {
    let mut reader = Reader::from_str(contents);
    reader.config_mut().trim_text(true);

    let mut decisions = Vec::new();
    let mut current: Option<Decision> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => on_element(file, &e, &mut current),
            Ok(Event::Empty(e)) => {
                on_element(file, &e, &mut current);
                if e.local_name().as_ref() == b"decision" {
                    decisions.extend(current.take());
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"decision" {
                    decisions.extend(current.take());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExecutorError::parse(file, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(decisions)
}

struct DecisionTableInputs;

#[async_trait]
impl QuestionExecutor for DecisionTableInputs {
    async fn execute(&self, input: ExecutionInput) -> Result<QuestionResult, ExecutorError> {
        let files = select_files(&input, DEFAULT_PATTERN).await?;
        let mut decisions = Vec::new();
        let mut errors = Vec::new();

        for file in &files {
            let contents = input.storage().read_to_string(file).await?;
            match parse_dmn(file, &contents) {
                Ok(found) => decisions.extend(found),
                Err(e) => errors.push(e.to_string()),
            }
        }

        let input_count: usize = decisions.iter().map(|d| d.inputs.len()).sum();
        let narrative = format!(
            "{} decisions with {} inputs across {} DMN files.",
            decisions.len(),
            input_count,
            files.len()
        );
        let mut result = QuestionResult::new(
            json!({
                "fileCount": files.len(),
                "decisionCount": decisions.len(),
                "decisions": decisions,
            }),
            narrative,
        );
        result.errors = errors;
        Ok(result)
    }
}
