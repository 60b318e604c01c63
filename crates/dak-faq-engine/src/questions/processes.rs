//! `business-process-overview`: processes, lanes and tasks in BPMN files

use super::select_files;
use super::xml::{attribute, local_name};
use crate::executor::{ExecutionInput, ExecutorError, QuestionExecutor};
use crate::registry::QuestionModule;
use async_trait::async_trait;
use dak_faq_types::{ParameterSpec, ParameterType, QuestionDefinition, QuestionLevel, QuestionResult};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

pub const BUSINESS_PROCESS_OVERVIEW: &str = "business-process-overview";

const DEFAULT_PATTERN: &str = "**/*.bpmn";

const TASK_KINDS: &[&str] = &[
    "task",
    "userTask",
    "serviceTask",
    "scriptTask",
    "manualTask",
    "businessRuleTask",
    "sendTask",
    "receiveTask",
    "callActivity",
    "subProcess",
];

const GATEWAY_KINDS: &[&str] = &[
    "exclusiveGateway",
    "parallelGateway",
    "inclusiveGateway",
    "eventBasedGateway",
    "complexGateway",
];

pub(super) fn module() -> QuestionModule {
    QuestionModule::new(
        QuestionDefinition::new(
            BUSINESS_PROCESS_OVERVIEW,
            QuestionLevel::Component,
            "Business process overview",
        )
        .with_description("Processes, swimlanes, tasks and gateways defined in BPMN files")
        .with_component_type("business-processes")
        .with_tags(["workflow", "bpmn"])
        .with_parameter(
            ParameterSpec::new("filePattern", ParameterType::String)
                .with_description("Glob selecting BPMN files")
                .with_default(json!(DEFAULT_PATTERN)),
        ),
        BusinessProcessOverview,
    )
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessFile {
    file: String,
    processes: Vec<String>,
    lanes: Vec<String>,
    tasks: BTreeMap<String, usize>,
    gateways: usize,
    start_events: usize,
    end_events: usize,
}

impl ProcessFile {
    fn task_count(&self) -> usize {
        self.tasks.values().sum()
    }
}

fn parse_bpmn(file: &str, contents: &str) -> Result<ProcessFile, ExecutorError> {
    let mut reader = Reader::from_str(contents);
    reader.config_mut().trim_text(true);

    let mut summary = ProcessFile {
        file: file.to_string(),
        ..ProcessFile::default()
    };
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = local_name(&e);
                let label = || attribute(&e, "name").or_else(|| attribute(&e, "id"));
                match name.as_str() {
                    "process" => summary.processes.extend(label()),
                    "lane" => summary.lanes.extend(label()),
                    "startEvent" => summary.start_events += 1,
                    "endEvent" => summary.end_events += 1,
                    kind if GATEWAY_KINDS.contains(&kind) => summary.gateways += 1,
                    kind if TASK_KINDS.contains(&kind) => {
                        *summary.tasks.entry(kind.to_string()).or_default() += 1;
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExecutorError::parse(file, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(summary)
}

struct BusinessProcessOverview;

#[async_trait]
impl QuestionExecutor for BusinessProcessOverview {
    async fn execute(&self, input: ExecutionInput) -> Result<QuestionResult, ExecutorError> {
        let files = select_files(&input, DEFAULT_PATTERN).await?;
        let mut parsed = Vec::new();
        let mut errors = Vec::new();

        for file in &files {
            let contents = input.storage().read_to_string(file).await?;
            match parse_bpmn(file, &contents) {
                Ok(summary) => parsed.push(summary),
                Err(e) => errors.push(e.to_string()),
            }
        }

        let mut tasks_by_kind: BTreeMap<String, usize> = BTreeMap::new();
        for summary in &parsed {
            for (kind, count) in &summary.tasks {
                *tasks_by_kind.entry(kind.clone()).or_default() += count;
            }
        }
        let process_count: usize = parsed.iter().map(|p| p.processes.len()).sum();
        let lane_count: usize = parsed.iter().map(|p| p.lanes.len()).sum();
        let task_count: usize = parsed.iter().map(ProcessFile::task_count).sum();

        let mut result = QuestionResult::new(
            json!({
                "fileCount": files.len(),
                "processCount": process_count,
                "laneCount": lane_count,
                "taskCount": task_count,
                "tasksByKind": tasks_by_kind,
                "files": parsed,
            }),
            format!(
                "{} processes with {} lanes and {} tasks across {} BPMN files.",
                process_count,
                lane_count,
                task_count,
                files.len()
            ),
        );
        result.errors = errors;
        Ok(result)
    }
}
