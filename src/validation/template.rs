//! Knowledge document scaffolding.

use super::loader::ValidationPolicy;
use super::paths::normalize_path;
use super::result::ValidationResult;
use super::schema::DocumentClass;
use super::validator::DocumentValidator;
use crate::types::Document;
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Inputs for a new knowledge document. Only `title` and `file_path` are required.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocumentTemplateRequest {
    pub title: String,
    pub file_path: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default = "default_source_type")]
    pub source_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub related: Vec<String>,
}

fn default_priority() -> String {
    "medium".to_string()
}

fn default_source_type() -> String {
    "markdown".to_string()
}

impl DocumentTemplateRequest {
    pub fn new(title: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            file_path: file_path.into(),
            priority: default_priority(),
            source_type: default_source_type(),
            tags: Vec::new(),
            summary: None,
            key_points: Vec::new(),
            related: Vec::new(),
        }
    }
}

/// `<source prefix>-<slug>`, e.g. `md-getting-started`.
pub fn generate_document_id(title: &str, source_type: &str) -> String {
    let prefix = match source_type {
        "markdown" => "md",
        "code" => "code",
        "config" => "cfg",
        "documentation" => "doc",
        "tutorial" => "tut",
        _ => "doc",
    };

    let kept: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    let slug = kept.split_whitespace().collect::<Vec<_>>().join("-");

    format!("{}-{}", prefix, slug)
}

/// Build a knowledge document from `request` and validate it.
///
/// The built document is available from [`ValidationResult::document`] even
/// when validation fails, so callers can show what was produced.
pub fn create_document_template(
    request: &DocumentTemplateRequest,
    validator: &DocumentValidator<'_>,
    policy: &ValidationPolicy,
) -> ValidationResult {
    let path = normalize_path(&request.file_path, validator.registry().base_directory());
    let summary = match request.summary.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => format!("Brief description of {}", request.title),
    };

    let mut document = Document::new();
    document.insert(
        "id".into(),
        Value::from(generate_document_id(&request.title, &request.source_type)),
    );
    document.insert("title".into(), Value::from(request.title.clone()));
    document.insert("summary".into(), Value::from(summary));
    document.insert("file_path".into(), Value::from(path.path));
    document.insert("file_name".into(), Value::from(path.file_name));
    document.insert("directory".into(), Value::from(path.directory));
    document.insert(
        "last_modified".into(),
        Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    document.insert("priority".into(), Value::from(request.priority.clone()));
    document.insert("tags".into(), Value::from(request.tags.clone()));
    document.insert("related".into(), Value::from(request.related.clone()));
    document.insert("source_type".into(), Value::from(request.source_type.clone()));
    document.insert("key_points".into(), Value::from(request.key_points.clone()));

    validator.validate(&document, DocumentClass::Knowledge, policy)
}
