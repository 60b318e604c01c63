//! Question registry
//!
//! Question modules are contributed by `QuestionSource`s and loaded into the
//! catalog exactly once, on first use. Catalog order is registration order.

use crate::executor::QuestionExecutor;
use dak_faq_diagnostics::FaqError;
use dak_faq_types::{QuestionDefinition, QuestionLevel};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info};

/// A question definition with its executor
#[derive(Clone)]
pub struct QuestionModule {
    pub definition: Arc<QuestionDefinition>,
    pub executor: Arc<dyn QuestionExecutor>,
}

impl QuestionModule {
    pub fn new(definition: QuestionDefinition, executor: impl QuestionExecutor + 'static) -> Self {
        Self {
            definition: Arc::new(definition),
            executor: Arc::new(executor),
        }
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }
}

impl std::fmt::Debug for QuestionModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionModule")
            .field("id", &self.definition.id)
            .finish_non_exhaustive()
    }
}

/// Supplier of question modules
pub trait QuestionSource: Send + Sync {
    /// Source name, for logs
    fn name(&self) -> &str;

    fn modules(&self) -> Vec<QuestionModule>;
}

/// A fixed list of modules
#[derive(Clone, Default)]
pub struct StaticQuestions {
    name: String,
    modules: Vec<QuestionModule>,
}

impl StaticQuestions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modules: Vec::new(),
        }
    }

    pub fn with_module(mut self, module: QuestionModule) -> Self {
        self.modules.push(module);
        self
    }
}

impl QuestionSource for StaticQuestions {
    fn name(&self) -> &str {
        &self.name
    }

    fn modules(&self) -> Vec<QuestionModule> {
        self.modules.clone()
    }
}

/// Catalog filter; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub level: Option<QuestionLevel>,
    pub component_type: Option<String>,
    /// Matches when the question carries any of these tags
    pub tags: Vec<String>,
    pub asset_type: Option<String>,
}

impl CatalogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: QuestionLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_component_type(mut self, component_type: impl Into<String>) -> Self {
        self.component_type = Some(component_type.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_asset_type(mut self, asset_type: impl Into<String>) -> Self {
        self.asset_type = Some(asset_type.into());
        self
    }

    pub fn matches(&self, definition: &QuestionDefinition) -> bool {
        self.level.is_none_or(|level| definition.level == level)
            && self
                .component_type
                .as_deref()
                .is_none_or(|c| definition.component_type.as_deref() == Some(c))
            && (self.tags.is_empty() || self.tags.iter().any(|t| definition.tags.contains(t)))
            && self
                .asset_type
                .as_deref()
                .is_none_or(|a| definition.asset_type.as_deref() == Some(a))
    }
}

/// Catalog of question modules
#[derive(Default)]
pub struct QuestionRegistry {
    sources: Vec<Arc<dyn QuestionSource>>,
    catalog: OnceCell<IndexMap<String, QuestionModule>>,
}

impl QuestionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl QuestionSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Load every source; later calls are no-ops
    pub fn initialize(&self) -> Result<(), FaqError> {
        self.catalog().map(|_| ())
    }

    pub fn is_initialized(&self) -> bool {
        self.catalog.get().is_some()
    }

    fn catalog(&self) -> Result<&IndexMap<String, QuestionModule>, FaqError> {
        self.catalog.get_or_try_init(|| self.load())
    }

    fn load(&self) -> Result<IndexMap<String, QuestionModule>, FaqError> {
        let mut catalog = IndexMap::new();
        for source in &self.sources {
            let modules = source.modules();
            debug!(source = source.name(), count = modules.len(), "loading question source");
            for module in modules {
                check_definition(&module.definition)?;
                let id = module.definition.id.clone();
                if catalog.contains_key(&id) {
                    return Err(FaqError::DuplicateQuestion { id });
                }
                catalog.insert(id, module);
            }
        }
        info!(questions = catalog.len(), "question registry initialized");
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Result<Option<QuestionModule>, FaqError> {
        Ok(self.catalog()?.get(id).cloned())
    }

    pub fn definition(&self, id: &str) -> Result<Option<QuestionDefinition>, FaqError> {
        Ok(self.catalog()?.get(id).map(|m| m.definition.as_ref().clone()))
    }

    /// Definitions matching `filter`, in registration order
    pub fn get_catalog(&self, filter: &CatalogFilter) -> Result<Vec<QuestionDefinition>, FaqError> {
        Ok(self
            .catalog()?
            .values()
            .filter(|m| filter.matches(&m.definition))
            .map(|m| m.definition.as_ref().clone())
            .collect())
    }

    pub fn len(&self) -> Result<usize, FaqError> {
        Ok(self.catalog()?.len())
    }
}

fn check_definition(definition: &QuestionDefinition) -> Result<(), FaqError> {
    definition.validate()?;
    for parameter in &definition.parameters {
        if let Some(pattern) = &parameter.pattern {
            Regex::new(pattern).map_err(|e| {
                FaqError::invalid_definition(
                    &definition.id,
                    format!("parameter '{}' has an invalid pattern: {}", parameter.name, e),
                )
            })?;
        }
        if let Some(binding) = &parameter.value_set_binding {
            if binding.value_set_url.trim().is_empty() {
                return Err(FaqError::invalid_definition(
                    &definition.id,
                    format!("parameter '{}' is bound to an empty value set URL", parameter.name),
                ));
            }
        }
    }
    Ok(())
}
