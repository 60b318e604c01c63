//! `asset-file-info`: size and shape of individual repository files

use super::select_files;
use crate::executor::{ExecutionInput, ExecutorError, QuestionExecutor};
use crate::registry::QuestionModule;
use async_trait::async_trait;
use dak_faq_storage::StorageError;
use dak_faq_types::{ParameterSpec, ParameterType, QuestionDefinition, QuestionLevel, QuestionResult};
use serde::Serialize;
use serde_json::json;

pub const ASSET_FILE_INFO: &str = "asset-file-info";

pub(super) fn module() -> QuestionModule {
    QuestionModule::new(
        QuestionDefinition::new(ASSET_FILE_INFO, QuestionLevel::File, "Asset file info")
            .with_description("Size, extension and line count of selected files")
            .with_tags(["files"])
            .with_parameter(
                ParameterSpec::new("filePattern", ParameterType::String)
                    .with_description("Glob selecting files when no assetFiles are given"),
            ),
        AssetFileInfo,
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileInfo {
    path: String,
    size: usize,
    extension: Option<String>,
    is_text: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    line_count: Option<usize>,
}

fn describe(path: &str, bytes: &[u8]) -> FileInfo {
    let name = path.rsplit('/').next().unwrap_or(path);
    let extension = name
        .rsplit_once('.')
        .filter(|(stem, _)| !stem.is_empty())
        .map(|(_, ext)| ext.to_lowercase());
    let text = std::str::from_utf8(bytes).ok();
    FileInfo {
        path: path.to_string(),
        size: bytes.len(),
        extension,
        is_text: text.is_some(),
        line_count: text.map(|t| t.lines().count()),
    }
}

struct AssetFileInfo;

#[async_trait]
impl QuestionExecutor for AssetFileInfo {
    async fn execute(&self, input: ExecutionInput) -> Result<QuestionResult, ExecutorError> {
        if input.asset_files.is_empty() && input.str_param("filePattern").is_none() {
            return Err(ExecutorError::failed(
                "no files selected; pass assetFiles or a filePattern",
            ));
        }
        let files = select_files(&input, "").await?;

        let mut infos = Vec::new();
        let mut errors = Vec::new();
        for path in &files {
            match input.storage().read_file(path).await {
                Ok(bytes) => infos.push(describe(path, &bytes)),
                Err(StorageError::NotFound(missing)) => {
                    errors.push(format!("{}: file not found", missing));
                }
                Err(e) => return Err(e.into()),
            }
        }

        let total: usize = infos.iter().map(|i| i.size).sum();
        let mut result = QuestionResult::new(
            json!({"files": infos, "totalSize": total}),
            format!("{} files, {} bytes in total.", infos.len(), total),
        );
        result.errors = errors;
        Ok(result)
    }
}
