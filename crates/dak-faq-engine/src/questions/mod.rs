//! Built-in DAK questions
//!
//! Each question is a `QuestionDefinition` plus an executor that reads the
//! repository through the storage abstraction only.

mod asset;
mod decisions;
mod inventory;
mod processes;
mod summary;
mod xml;

use crate::executor::{ExecutionInput, ExecutorError};
use crate::registry::{QuestionModule, QuestionSource};
use dak_faq_storage::ListOptions;

pub use asset::ASSET_FILE_INFO;
pub use decisions::DECISION_TABLE_INPUTS;
pub use inventory::{COMPONENT_INVENTORY, DAK_COMPONENTS};
pub use processes::BUSINESS_PROCESS_OVERVIEW;
pub use summary::DAK_SUMMARY;

/// Source of the built-in questions
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinQuestions;

impl QuestionSource for BuiltinQuestions {
    fn name(&self) -> &str {
        "builtin"
    }

    fn modules(&self) -> Vec<QuestionModule> {
        vec![
            summary::module(),
            inventory::module(),
            decisions::module(),
            processes::module(),
            asset::module(),
        ]
    }
}

/// Explicit `assetFiles`, else files matching the `filePattern` parameter, else
/// files matching `default_pattern`
pub(crate) async fn select_files(
    input: &ExecutionInput,
    default_pattern: &str,
) -> Result<Vec<String>, ExecutorError> {
    if !input.asset_files.is_empty() {
        return Ok(input.asset_files.clone());
    }
    let pattern = input.str_param("filePattern").unwrap_or(default_pattern);
    Ok(input.storage().list_files(pattern, &ListOptions::new()).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::QuestionRegistry;

    #[test]
    fn test_builtin_catalog_loads() {
        let registry = QuestionRegistry::new().with_source(BuiltinQuestions);
        registry.initialize().unwrap();
        assert_eq!(registry.len().unwrap(), 5);
        for id in [
            DAK_SUMMARY,
            COMPONENT_INVENTORY,
            DECISION_TABLE_INPUTS,
            BUSINESS_PROCESS_OVERVIEW,
            ASSET_FILE_INFO,
        ] {
            assert!(registry.get(id).unwrap().is_some(), "{id} missing");
        }
    }
}
