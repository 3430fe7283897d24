//! Validation Config Loader
//!
//! Extracts the document-validation policy and schema registry from a
//! configuration document. An incomplete configuration is fatal: every
//! failure names the exact path that is missing or malformed.

use super::result::{IssueKind, ValidationResult};
use super::schema::SchemaRegistry;
use crate::error::ConfigError;
use crate::merge::policy::join_path;
use crate::types::{json_type_name, ConfigDocument};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sections without which no validator can be built.
pub const REQUIRED_SECTIONS: &[&str] = &["document_schema", "document_validation"];

const POLICY_SECTION_SHAPE: &str = "an object of boolean flags: strict_schema_validation, \
     allow_extra_fields, required_fields_only, auto_correct_paths";

/// Document validation switches, immutable for the lifetime of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    pub strict_schema_validation: bool,
    pub allow_extra_fields: bool,
    pub required_fields_only: bool,
    pub auto_correct_paths: bool,
}

impl ValidationPolicy {
    /// Whether undeclared fields are rejected.
    pub fn rejects_extra_fields(&self) -> bool {
        self.strict_schema_validation && !self.allow_extra_fields
    }

    fn collect(section: &Value, errors: &mut Vec<ConfigError>) -> Option<Self> {
        let map = match section {
            Value::Object(map) => map,
            other => {
                errors.push(ConfigError::InvalidShape {
                    path: "document_validation".to_string(),
                    expected: POLICY_SECTION_SHAPE,
                    found: json_type_name(other),
                });
                return None;
            }
        };

        let start = errors.len();
        let mut flag = |key: &str| {
            let path = join_path("document_validation", key);
            match map.get(key) {
                Some(value) => coerce_bool(&path, value)
                    .map_err(|e| errors.push(e))
                    .ok(),
                None => {
                    errors.push(ConfigError::MissingKey {
                        path,
                        expected: "a boolean",
                    });
                    None
                }
            }
        };

        let strict_schema_validation = flag("strict_schema_validation");
        let allow_extra_fields = flag("allow_extra_fields");
        let required_fields_only = flag("required_fields_only");
        let auto_correct_paths = flag("auto_correct_paths");

        if errors.len() != start {
            return None;
        }
        Some(Self {
            strict_schema_validation: strict_schema_validation?,
            allow_extra_fields: allow_extra_fields?,
            required_fields_only: required_fields_only?,
            auto_correct_paths: auto_correct_paths?,
        })
    }
}

/// Coerce a JSON boolean or a boolean-like string.
///
/// Accepts `true`/`false`, and the strings `true|false|yes|no|on|off|1|0`
/// in any case. Anything else is a configuration error, never a silent `false`.
pub fn coerce_bool(path: &str, value: &Value) -> Result<bool, ConfigError> {
    let malformed = || ConfigError::MalformedBoolean {
        path: path.to_string(),
        value: value.to_string(),
    };
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(malformed()),
        },
        _ => Err(malformed()),
    }
}

/// Builds validation state from a configuration document.
pub struct ValidationConfigLoader;

impl ValidationConfigLoader {
    /// Extract the validation policy. Fails on the first missing or malformed entry.
    pub fn load(config: &ConfigDocument) -> Result<ValidationPolicy, ConfigError> {
        Self::require_sections(config)?;
        let mut errors = Vec::new();
        match config
            .get("document_validation")
            .and_then(|section| ValidationPolicy::collect(section, &mut errors))
        {
            Some(policy) => Ok(policy),
            None => Err(errors.into_iter().next().unwrap_or(ConfigError::MissingSection {
                section: "document_validation".to_string(),
                expected: POLICY_SECTION_SHAPE,
            })),
        }
    }

    /// Policy and schema registry together; the pair a validator is built from.
    pub fn load_all(
        config: &ConfigDocument,
    ) -> Result<(ValidationPolicy, SchemaRegistry), ConfigError> {
        let policy = Self::load(config)?;
        let registry = SchemaRegistry::from_config(config)?;
        tracing::debug!(
            strict = policy.strict_schema_validation,
            allow_extra = policy.allow_extra_fields,
            required_only = policy.required_fields_only,
            auto_correct = policy.auto_correct_paths,
            base_directory = registry.base_directory().unwrap_or(""),
            "validation policy loaded"
        );
        Ok((policy, registry))
    }

    fn require_sections(config: &ConfigDocument) -> Result<(), ConfigError> {
        for section in REQUIRED_SECTIONS {
            if !config.contains_key(*section) {
                return Err(ConfigError::MissingSection {
                    section: section.to_string(),
                    expected: expected_shape(section),
                });
            }
        }
        Ok(())
    }

    /// Every top-level section of `template` must be present in `config`.
    pub fn require_template_sections(
        config: &ConfigDocument,
        template: &ConfigDocument,
    ) -> Result<(), ConfigError> {
        match template.keys().find(|section| !config.contains_key(*section)) {
            Some(section) => Err(ConfigError::MissingSection {
                section: section.clone(),
                expected: expected_shape(section),
            }),
            None => Ok(()),
        }
    }

    /// Check a candidate configuration against the template, collecting every problem.
    pub fn validate_config(
        candidate: &ConfigDocument,
        template: &ConfigDocument,
    ) -> ValidationResult {
        let mut result = ValidationResult::new("configuration");
        let mut errors = Vec::new();

        let sections = template
            .keys()
            .map(String::as_str)
            .chain(REQUIRED_SECTIONS.iter().copied().filter(|s| !template.contains_key(*s)));
        for section in sections {
            match (candidate.get(section), template.get(section)) {
                (None, _) => errors.push(ConfigError::MissingSection {
                    section: section.to_string(),
                    expected: expected_shape(section),
                }),
                (Some(value), Some(Value::Object(_))) if !value.is_object() => {
                    errors.push(ConfigError::InvalidShape {
                        path: section.to_string(),
                        expected: "an object",
                        found: json_type_name(value),
                    })
                }
                _ => {}
            }
        }

        if let Some(section) = candidate.get("document_validation").filter(|v| v.is_object()) {
            ValidationPolicy::collect(section, &mut errors);
        }
        if candidate.get("document_schema").is_some_and(Value::is_object) {
            SchemaRegistry::collect(candidate, &mut errors);
        }

        for section in candidate.keys().filter(|k| !template.contains_key(*k)) {
            result.add_warning(format!(
                "section '{}' is not part of the shipped template and will be merged as-is",
                section
            ));
        }

        for error in errors {
            let (kind, field) = issue_for(&error);
            result.add_issue(kind, field, error.to_string());
        }
        result
    }
}

fn expected_shape(section: &str) -> &'static str {
    match section {
        "document_validation" => POLICY_SECTION_SHAPE,
        "document_schema" => "an object with 'knowledge' and 'custom' class schemas",
        _ => "an object",
    }
}

fn issue_for(error: &ConfigError) -> (IssueKind, String) {
    match error {
        ConfigError::MissingSection { section, .. } => (IssueKind::MissingField, section.clone()),
        ConfigError::MissingKey { path, .. } => (IssueKind::MissingField, path.clone()),
        ConfigError::InvalidShape { path, .. } => (IssueKind::TypeMismatch, path.clone()),
        ConfigError::MalformedBoolean { path, .. }
        | ConfigError::UnknownFieldType { path, .. }
        | ConfigError::UnknownFieldFormat { path, .. } => (IssueKind::InvalidValue, path.clone()),
        ConfigError::Unreadable { path, .. }
        | ConfigError::InvalidUtf8 { path, .. }
        | ConfigError::Parse { path, .. } => {
            (IssueKind::InvalidValue, path.display().to_string())
        }
        ConfigError::NoConfigHome | ConfigError::Settings(_) => {
            (IssueKind::InvalidValue, "settings".to_string())
        }
    }
}
