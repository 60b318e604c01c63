//! Output formatting utilities

use anyhow::{Context, Result};
use colored::Colorize;
use dak_faq_types::{ExecuteResponse, QuestionDefinition, ValidationResult};
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Indented JSON
    Pretty,
    /// Human-readable tables
    Table,
}

/// Set up color output based on user preference
pub fn setup_colors(mode: &str) {
    match mode.to_lowercase().as_str() {
        "always" => colored::control::set_override(true),
        "never" => colored::control::set_override(false),
        _ => colored::control::set_override(std::io::stdout().is_terminal()),
    }
}

/// Format an error for display, with its cause chain
pub fn format_error(error: &anyhow::Error) -> String {
    format!("{} {:#}", "Error:".red().bold(), error)
}

pub fn format_warning(warning: &str) -> String {
    format!("{} {}", "Warning:".yellow().bold(), warning)
}

pub fn format_success(message: &str) -> String {
    format!("{} {}", "Success:".green().bold(), message)
}

/// Where and how command output is written
#[derive(Debug, Clone)]
pub struct Printer {
    format: OutputFormat,
    output_file: Option<PathBuf>,
}

impl Printer {
    pub fn new(format: OutputFormat, output_file: Option<PathBuf>) -> Self {
        Self {
            format,
            output_file,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn write(&self, content: &str) -> Result<()> {
        write_output(content, self.output_file.as_deref())
    }

    /// JSON in the chosen flavour; `table` falls back to a generic table
    pub fn serialize<T: Serialize>(&self, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).context("Failed to serialize output")?;
        let content = match self.format {
            OutputFormat::Json => format_json(&value, false)?,
            OutputFormat::Pretty => format_json(&value, true)?,
            OutputFormat::Table => match format_as_table(&value) {
                Some(table) => table,
                None => format_json(&value, true)?,
            },
        };
        self.write(&content)
    }

    pub fn response(&self, response: &ExecuteResponse) -> Result<()> {
        match self.format {
            OutputFormat::Table => self.write(&render_response(response)),
            _ => self.serialize(response),
        }
    }

    pub fn catalog(&self, questions: &[QuestionDefinition]) -> Result<()> {
        match self.format {
            OutputFormat::Table => self.write(&catalog_table(questions)),
            _ => self.serialize(&questions),
        }
    }

    pub fn validation(&self, result: &ValidationResult) -> Result<()> {
        match self.format {
            OutputFormat::Table => self.write(&render_validation(result)),
            _ => self.serialize(result),
        }
    }
}

/// Write output to a file or stdout
pub fn write_output(content: &str, output_file: Option<&Path>) -> Result<()> {
    if let Some(path) = output_file {
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write to output file: {}", path.display()))?;
        eprintln!(
            "{}",
            format_success(&format!("Output written to {}", path.display()))
        );
    } else {
        println!("{}", content);
    }
    Ok(())
}

pub fn format_json(value: &Value, pretty: bool) -> Result<String> {
    if pretty {
        serde_json::to_string_pretty(value).context("Failed to serialize JSON")
    } else {
        serde_json::to_string(value).context("Failed to serialize JSON")
    }
}

#[derive(Tabled)]
struct QuestionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Canonicals")]
    canonicals: usize,
}

pub fn catalog_table(questions: &[QuestionDefinition]) -> String {
    if questions.is_empty() {
        return "(no questions)".to_string();
    }
    let rows = questions.iter().map(|q| QuestionRow {
        id: q.id.clone(),
        level: q.level.to_string(),
        component: q.component_type.clone().unwrap_or_default(),
        title: q.title.clone(),
        canonicals: q.canonical_urls().len(),
    });
    Table::new(rows).with(Style::modern()).to_string()
}

/// Status line, narrative, warnings and errors, then the structured answer
pub fn render_response(response: &ExecuteResponse) -> String {
    let mut lines = Vec::new();
    match (response.result(), response.error()) {
        (Some(result), _) => {
            lines.push(format!("{} {}", "✓".green().bold(), response.question_id().bold()));
            if !result.narrative.is_empty() {
                lines.push(String::new());
                lines.push(result.narrative.clone());
            }
            for warning in &result.warnings {
                lines.push(format_warning(warning));
            }
            for error in &result.errors {
                lines.push(format!("{} {}", "Error:".red().bold(), error));
            }
            if let Some(table) = format_as_table(&result.structured) {
                lines.push(String::new());
                lines.push(table);
            }
        }
        (None, Some(error)) => {
            lines.push(format!(
                "{} {} [{}]",
                "✗".red().bold(),
                response.question_id().bold(),
                error.code.as_str().red()
            ));
            lines.push(error.message.clone());
            for detail in &error.details {
                lines.push(format!("  {}", detail.to_colored_string()));
            }
        }
        (None, None) => lines.push(response.question_id().to_string()),
    }
    lines.join("\n")
}

pub fn render_validation(result: &ValidationResult) -> String {
    let mut lines = Vec::new();
    if result.is_valid {
        lines.push(format!("{} parameters are valid", "✓".green().bold()));
    } else {
        lines.push(format!("{} parameters are invalid", "✗".red().bold()));
    }
    for issue in result.errors.iter().chain(&result.warnings) {
        lines.push(format!("  {}", issue.to_colored_string()));
    }
    lines.join("\n")
}

/// Format value as table (if possible)
pub fn format_as_table(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                return Some("(empty list)".to_string());
            }

            // Objects sharing the first item's keys become one row each
            if let Some(Value::Object(first)) = items.first() {
                let keys: Vec<String> = first.keys().cloned().collect();
                let uniform = items.iter().all(|item| {
                    item.as_object().is_some_and(|obj| {
                        obj.len() == keys.len() && obj.keys().all(|k| keys.contains(k))
                    })
                });

                if uniform {
                    let mut builder = Builder::default();
                    builder.push_record(keys.iter().cloned());
                    for item in items {
                        builder.push_record(
                            keys.iter().map(|k| item.get(k).map(format_value).unwrap_or_default()),
                        );
                    }
                    let mut table = builder.build();
                    table.with(Style::modern());
                    return Some(table.to_string());
                }
            }

            let lines: Vec<String> = items
                .iter()
                .enumerate()
                .map(|(i, v)| format!("  {}. {}", i + 1, format_value(v)))
                .collect();
            Some(lines.join("\n"))
        }
        Value::Object(obj) => {
            #[derive(Tabled)]
            struct KeyValue {
                #[tabled(rename = "Key")]
                key: String,
                #[tabled(rename = "Value")]
                value: String,
            }

            let rows: Vec<KeyValue> = obj
                .iter()
                .map(|(k, v)| KeyValue {
                    key: k.clone(),
                    value: format_value(v),
                })
                .collect();
            Some(Table::new(rows).with(Style::modern()).to_string())
        }
        _ => None,
    }
}

/// Format a simple value for display
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) if arr.iter().all(|v| v.is_string()) && arr.len() <= 4 => arr
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{}} with {} fields", obj.len()),
    }
}
