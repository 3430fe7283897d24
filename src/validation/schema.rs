//! Schema Registry
//!
//! Declarative document schemas, one per document class, built from the
//! `document_schema` section of the active configuration.

use super::loader::coerce_bool;
use crate::error::ConfigError;
use crate::merge::policy::join_path;
use crate::types::{json_type_name, ConfigDocument, Document};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Fields a `custom` document may always carry when strict mode checks it.
pub const CUSTOM_MINIMAL_FIELDS: &[&str] = &["id", "title", "content", "metadata"];

const SCHEMA_SECTION_SHAPE: &str = "an object with 'knowledge' and 'custom' class schemas";

/// Document class, which selects the schema a document is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentClass {
    Knowledge,
    Custom,
}

impl DocumentClass {
    /// Documents carrying both `id` and `title` are knowledge documents.
    pub fn infer(document: &Document) -> Self {
        if document.contains_key("id") && document.contains_key("title") {
            DocumentClass::Knowledge
        } else {
            DocumentClass::Custom
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentClass::Knowledge => "knowledge",
            DocumentClass::Custom => "custom",
        }
    }
}

impl fmt::Display for DocumentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "knowledge" => Ok(DocumentClass::Knowledge),
            "custom" => Ok(DocumentClass::Custom),
            other => Err(format!(
                "unknown document class '{}' (expected knowledge or custom)",
                other
            )),
        }
    }
}

/// Declared type of a document field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Array,
    /// Array whose items are all non-empty strings.
    StringArray,
    Object,
    Number,
    Integer,
    Boolean,
}

impl FieldType {
    pub fn parse(name: &str) -> Option<Self> {
        let parsed = match name.trim().to_ascii_lowercase().as_str() {
            "string" | "str" => FieldType::String,
            "array" | "list" => FieldType::Array,
            "string_array" => FieldType::StringArray,
            "object" | "dict" => FieldType::Object,
            "number" | "float" => FieldType::Number,
            "integer" | "int" => FieldType::Integer,
            "boolean" | "bool" => FieldType::Boolean,
            _ => return None,
        };
        Some(parsed)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Array => "array",
            FieldType::StringArray => "string_array",
            FieldType::Object => "object",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
        }
    }

    /// Shape check only; item contents of a string array are value checks.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Array | FieldType::StringArray => value.is_array(),
            FieldType::Object => value.is_object(),
            FieldType::Number => value.is_number(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Boolean => value.is_boolean(),
        }
    }
}

/// Declared textual format of a string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldFormat {
    /// Letters, digits, hyphens and underscores.
    Identifier,
    /// ISO 8601 date-time; a trailing `Z` is accepted.
    Timestamp,
}

impl FieldFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "identifier" | "id" => Some(FieldFormat::Identifier),
            "timestamp" | "iso8601" => Some(FieldFormat::Timestamp),
            _ => None,
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            FieldFormat::Identifier => {
                !text.is_empty()
                    && text
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            }
            FieldFormat::Timestamp => is_iso_timestamp(text),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            FieldFormat::Identifier => {
                "only letters, digits, hyphens, and underscores"
            }
            FieldFormat::Timestamp => "an ISO 8601 timestamp such as 2025-01-04T10:30:00Z",
        }
    }
}

fn is_iso_timestamp(text: &str) -> bool {
    DateTime::parse_from_rfc3339(text).is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
}

/// Rules for one document class.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassSchema {
    pub required_fields: Vec<String>,
    pub field_types: BTreeMap<String, FieldType>,
    pub allowed_values: BTreeMap<String, Vec<String>>,
    pub field_formats: BTreeMap<String, FieldFormat>,
    pub path_fields: Vec<String>,
    pub allow_extra_fields: bool,
}

impl ClassSchema {
    pub fn requiring<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Every field name this schema mentions.
    pub fn declared_fields(&self) -> BTreeSet<&str> {
        self.required_fields
            .iter()
            .map(String::as_str)
            .chain(self.field_types.keys().map(String::as_str))
            .chain(self.allowed_values.keys().map(String::as_str))
            .chain(self.field_formats.keys().map(String::as_str))
            .chain(self.path_fields.iter().map(String::as_str))
            .collect()
    }

    pub fn declares(&self, field: &str) -> bool {
        self.declared_fields().contains(field)
    }

    fn parse(value: &Value, path: &str, errors: &mut Vec<ConfigError>) -> Option<Self> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                errors.push(ConfigError::InvalidShape {
                    path: path.to_string(),
                    expected: "an object describing a document class",
                    found: json_type_name(other),
                });
                return None;
            }
        };

        let mut schema = ClassSchema::default();
        let start = errors.len();

        let required_path = join_path(path, "required_fields");
        match map.get("required_fields") {
            Some(value) => match string_list(value, &required_path) {
                Ok(fields) => schema.required_fields = fields,
                Err(e) => errors.push(e),
            },
            None => errors.push(ConfigError::MissingKey {
                path: required_path,
                expected: "an array of field names",
            }),
        }

        if let Some(value) = map.get("field_types") {
            let types_path = join_path(path, "field_types");
            for (field, type_name) in entries(value, &types_path, errors) {
                let field_path = join_path(&types_path, field);
                match type_name.as_str().and_then(FieldType::parse) {
                    Some(field_type) => {
                        schema.field_types.insert(field.clone(), field_type);
                    }
                    None => errors.push(ConfigError::UnknownFieldType {
                        path: field_path,
                        value: display_value(type_name),
                    }),
                }
            }
        }

        if let Some(value) = map.get("allowed_values") {
            let allowed_path = join_path(path, "allowed_values");
            for (field, values) in entries(value, &allowed_path, errors) {
                match string_list(values, &join_path(&allowed_path, field)) {
                    Ok(list) => {
                        schema.allowed_values.insert(field.clone(), list);
                    }
                    Err(e) => errors.push(e),
                }
            }
        }

        if let Some(value) = map.get("field_formats") {
            let formats_path = join_path(path, "field_formats");
            for (field, format_name) in entries(value, &formats_path, errors) {
                match format_name.as_str().and_then(FieldFormat::parse) {
                    Some(format) => {
                        schema.field_formats.insert(field.clone(), format);
                    }
                    None => errors.push(ConfigError::UnknownFieldFormat {
                        path: join_path(&formats_path, field),
                        value: display_value(format_name),
                    }),
                }
            }
        }

        if let Some(value) = map.get("path_fields") {
            match string_list(value, &join_path(path, "path_fields")) {
                Ok(fields) => schema.path_fields = fields,
                Err(e) => errors.push(e),
            }
        }

        if let Some(value) = map.get("allow_extra_fields") {
            match coerce_bool(&join_path(path, "allow_extra_fields"), value) {
                Ok(flag) => schema.allow_extra_fields = flag,
                Err(e) => errors.push(e),
            }
        }

        (errors.len() == start).then_some(schema)
    }
}

/// Schemas for every document class plus the base directory used for path correction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaRegistry {
    knowledge: ClassSchema,
    custom: ClassSchema,
    base_directory: Option<String>,
}

impl SchemaRegistry {
    pub fn new(knowledge: ClassSchema, custom: ClassSchema) -> Self {
        Self {
            knowledge,
            custom,
            base_directory: None,
        }
    }

    pub fn with_base_directory(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.base_directory = (!base.trim().is_empty()).then_some(base);
        self
    }

    /// Build from `document_schema` and `security.allowed_base_directory`.
    pub fn from_config(config: &ConfigDocument) -> Result<Self, ConfigError> {
        let mut errors = Vec::new();
        match Self::collect(config, &mut errors) {
            Some(registry) if errors.is_empty() => Ok(registry),
            _ => Err(errors.into_iter().next().unwrap_or(ConfigError::MissingSection {
                section: "document_schema".to_string(),
                expected: SCHEMA_SECTION_SHAPE,
            })),
        }
    }

    /// Parse the registry, recording every problem instead of stopping at the first.
    pub(crate) fn collect(config: &ConfigDocument, errors: &mut Vec<ConfigError>) -> Option<Self> {
        let section = match config.get("document_schema") {
            Some(Value::Object(map)) => map,
            Some(other) => {
                errors.push(ConfigError::InvalidShape {
                    path: "document_schema".to_string(),
                    expected: SCHEMA_SECTION_SHAPE,
                    found: json_type_name(other),
                });
                return None;
            }
            None => {
                errors.push(ConfigError::MissingSection {
                    section: "document_schema".to_string(),
                    expected: SCHEMA_SECTION_SHAPE,
                });
                return None;
            }
        };

        let mut class = |name: &str| {
            let path = join_path("document_schema", name);
            match section.get(name) {
                Some(value) => ClassSchema::parse(value, &path, errors),
                None => {
                    errors.push(ConfigError::MissingKey {
                        path,
                        expected: "an object with at least 'required_fields'",
                    });
                    None
                }
            }
        };
        let knowledge = class("knowledge");
        let custom = class("custom");

        let base_directory = match config
            .get("security")
            .and_then(|s| s.get("allowed_base_directory"))
        {
            None | Some(Value::Null) => None,
            Some(Value::String(base)) => Some(base.clone()),
            Some(other) => {
                errors.push(ConfigError::InvalidShape {
                    path: "security.allowed_base_directory".to_string(),
                    expected: "a directory path string",
                    found: json_type_name(other),
                });
                None
            }
        };

        let registry = Self::new(knowledge?, custom?);
        Some(match base_directory {
            Some(base) => registry.with_base_directory(base),
            None => registry,
        })
    }

    pub fn schema_for(&self, class: DocumentClass) -> &ClassSchema {
        match class {
            DocumentClass::Knowledge => &self.knowledge,
            DocumentClass::Custom => &self.custom,
        }
    }

    pub fn base_directory(&self) -> Option<&str> {
        self.base_directory.as_deref()
    }

    /// Field set the extra-field check accepts for `class`.
    ///
    /// Knowledge documents use their full declared schema; custom documents
    /// use the minimal default set plus whatever their schema declares.
    pub fn accepted_fields(&self, class: DocumentClass, required_only: bool) -> BTreeSet<&str> {
        let schema = self.schema_for(class);
        let mut fields: BTreeSet<&str> = if required_only {
            schema.required_fields.iter().map(String::as_str).collect()
        } else {
            schema.declared_fields()
        };
        if class == DocumentClass::Custom {
            fields.extend(CUSTOM_MINIMAL_FIELDS.iter().copied());
        }
        fields
    }
}

fn string_list(value: &Value, path: &str) -> Result<Vec<String>, ConfigError> {
    let shape_error = |found| ConfigError::InvalidShape {
        path: path.to_string(),
        expected: "an array of strings",
        found,
    };
    let items = value.as_array().ok_or_else(|| shape_error(json_type_name(value)))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| shape_error(json_type_name(item)))
        })
        .collect()
}

fn entries<'a>(
    value: &'a Value,
    path: &str,
    errors: &mut Vec<ConfigError>,
) -> Vec<(&'a String, &'a Value)> {
    match value {
        Value::Object(map) => map.iter().collect(),
        other => {
            errors.push(ConfigError::InvalidShape {
                path: path.to_string(),
                expected: "an object keyed by field name",
                found: json_type_name(other),
            });
            Vec::new()
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
