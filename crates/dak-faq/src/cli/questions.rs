//! Question commands

use super::output::{OutputFormat, Printer, format_warning};
use super::params::parse_parameters;
use crate::service::FaqService;
use anyhow::{Context, Result, bail};
use dak_faq_engine::{CatalogFilter, ExecutionContext};
use dak_faq_types::{ExecuteRequest, JsonMap};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub fn list(service: &FaqService, printer: &Printer, filter: &CatalogFilter) -> Result<()> {
    let questions = service.list_questions(filter)?;
    printer.catalog(&questions)
}

/// Execute one question; a failed response is an error after it is printed
pub async fn run(
    service: &FaqService,
    printer: &Printer,
    context: &ExecutionContext,
    question_id: &str,
    params: &[String],
    asset_files: Vec<String>,
) -> Result<()> {
    let mut request = ExecuteRequest::new(question_id).with_parameters(parse_parameters(params)?);
    if !asset_files.is_empty() {
        request = request.with_asset_files(asset_files);
    }

    let response = service.execute(&request, context).await;
    printer.response(&response)?;
    match response.error() {
        Some(error) => bail!("{} failed with {}", question_id, error.code),
        None => Ok(()),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BatchFile {
    Requests(Vec<ExecuteRequest>),
    Wrapped { requests: Vec<ExecuteRequest> },
}

impl BatchFile {
    fn into_requests(self) -> Vec<ExecuteRequest> {
        match self {
            BatchFile::Requests(requests) | BatchFile::Wrapped { requests } => requests,
        }
    }
}

/// Requests from a JSON file: a bare array or `{"requests": [...]}`
pub fn read_batch_file(path: &Path) -> Result<Vec<ExecuteRequest>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
    let file: BatchFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse batch file: {}", path.display()))?;
    Ok(file.into_requests())
}

/// Execute a batch; members may fail without failing the command
pub async fn batch(
    service: &FaqService,
    printer: &Printer,
    context: &ExecutionContext,
    file: &Path,
) -> Result<()> {
    let requests = read_batch_file(file)?;
    let response = service.execute_many(&requests, context).await;

    match printer.format() {
        OutputFormat::Table => {
            for result in &response.results {
                printer.response(result)?;
                printer.write("")?;
            }
            let summary = response.summary;
            printer.write(&format!(
                "{} total, {} succeeded, {} failed",
                summary.total, summary.successful, summary.failed
            ))?;
            if summary.failed > 0 {
                eprintln!(
                    "{}",
                    format_warning(&format!("{} of {} questions failed", summary.failed, summary.total))
                );
            }
            Ok(())
        }
        _ => printer.serialize(&response),
    }
}

pub fn schema(service: &FaqService, printer: &Printer, question_id: &str) -> Result<()> {
    match service.get_schema(question_id)? {
        Some(schema) => printer.serialize(&schema),
        None => bail!("Question not found: {}", question_id),
    }
}

pub async fn validate(
    service: &FaqService,
    printer: &Printer,
    question_id: &str,
    params: &[String],
) -> Result<()> {
    let parameters: JsonMap = parse_parameters(params)?;
    let result = service.validate_parameters(question_id, &parameters).await?;
    printer.validation(&result)?;
    if !result.is_valid {
        bail!("{} parameter(s) invalid", result.errors.len());
    }
    Ok(())
}

pub fn openapi(service: &FaqService, printer: &Printer) -> Result<()> {
    printer.serialize(&service.openapi()?)
}

pub fn audit(service: &FaqService, printer: &Printer) -> Result<()> {
    printer.serialize(&service.audit()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_file_shapes() {
        let dir = tempfile::tempdir().unwrap();

        let bare = dir.path().join("bare.json");
        fs::write(&bare, r#"[{"questionId": "dak-summary"}, {"questionId": "x", "parameters": {"a": 1}}]"#)
            .unwrap();
        let requests = read_batch_file(&bare).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].parameters["a"], 1);

        let wrapped = dir.path().join("wrapped.json");
        fs::write(&wrapped, r#"{"requests": [{"questionId": "dak-summary"}]}"#).unwrap();
        assert_eq!(read_batch_file(&wrapped).unwrap()[0].question_id, "dak-summary");

        let bad = dir.path().join("bad.json");
        fs::write(&bad, r#"{"questions": []}"#).unwrap();
        assert!(read_batch_file(&bad).is_err());
    }
}
