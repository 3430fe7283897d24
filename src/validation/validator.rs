//! Document Validator
//!
//! Checks one document against the schema for its class. Every violation is
//! collected; nothing short-circuits. Validation never fails with an error:
//! the outcome is always a [`ValidationResult`].

use super::loader::ValidationPolicy;
use super::paths::normalize_path;
use super::result::{IssueKind, PathCorrection, ValidationResult};
use super::schema::{ClassSchema, DocumentClass, FieldType, SchemaRegistry};
use crate::types::{json_type_name, Document};
use serde_json::Value;

/// Validates documents against a schema registry. Holds no mutable state.
#[derive(Debug, Clone, Copy)]
pub struct DocumentValidator<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> DocumentValidator<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r SchemaRegistry {
        self.registry
    }

    /// Validate with the class inferred from the document itself.
    pub fn validate_inferred(
        &self,
        document: &Document,
        policy: &ValidationPolicy,
    ) -> ValidationResult {
        self.validate(document, DocumentClass::infer(document), policy)
    }

    pub fn validate(
        &self,
        document: &Document,
        class: DocumentClass,
        policy: &ValidationPolicy,
    ) -> ValidationResult {
        let schema = self.registry.schema_for(class);
        let subject = match document.get("id").and_then(Value::as_str) {
            Some(id) => format!("{} document '{}'", class, id),
            None => format!("{} document", class),
        };
        let mut result = ValidationResult::new(subject);
        let mut document = document.clone();

        if policy.auto_correct_paths {
            self.correct_paths(&mut document, schema, &mut result);
        }

        check_required(&document, schema, &mut result);
        let mistyped = check_types(&document, schema, &mut result);
        check_values(&document, schema, &mistyped, &mut result);
        self.check_extra(&document, class, schema, policy, &mut result);

        tracing::debug!(
            class = %class,
            issues = result.issues().len(),
            corrections = result.corrections().len(),
            "document validated"
        );

        result.set_document(document);
        result
    }

    fn correct_paths(
        &self,
        document: &mut Document,
        schema: &ClassSchema,
        result: &mut ValidationResult,
    ) {
        let base = self.registry.base_directory();
        let mut derived = None;

        for field in &schema.path_fields {
            let Some(Value::String(original)) = document.get(field) else {
                continue;
            };
            let normalized = normalize_path(original, base);
            if &normalized.path != original {
                result.add_correction(PathCorrection {
                    field: field.clone(),
                    original: original.clone(),
                    corrected: normalized.path.clone(),
                });
                document.insert(field.clone(), Value::String(normalized.path.clone()));
            }
            if derived.is_none() {
                derived = Some(normalized);
            }
        }

        let Some(normalized) = derived else {
            return;
        };
        for (field, value) in [
            ("file_name", normalized.file_name),
            ("directory", normalized.directory),
        ] {
            if !schema.declares(field) {
                continue;
            }
            let current = document.get(field).and_then(Value::as_str);
            if current == Some(value.as_str()) {
                continue;
            }
            result.add_correction(PathCorrection {
                field: field.to_string(),
                original: current.unwrap_or_default().to_string(),
                corrected: value.clone(),
            });
            document.insert(field.to_string(), Value::String(value));
        }
    }

    fn check_extra(
        &self,
        document: &Document,
        class: DocumentClass,
        schema: &ClassSchema,
        policy: &ValidationPolicy,
        result: &mut ValidationResult,
    ) {
        let accepted = self.registry.accepted_fields(class, policy.required_fields_only);
        let extras: Vec<&String> = document
            .keys()
            .filter(|key| !accepted.contains(key.as_str()))
            .collect();
        if extras.is_empty() {
            return;
        }

        if policy.rejects_extra_fields() && !schema.allow_extra_fields {
            for field in extras {
                result.add_issue(
                    IssueKind::ExtraField,
                    field.as_str(),
                    format!("field '{}' is not allowed for {} documents", field, class),
                );
            }
        } else {
            for field in extras {
                result.add_warning(format!(
                    "field '{}' is not declared for {} documents",
                    field, class
                ));
            }
        }
    }
}

fn check_required(document: &Document, schema: &ClassSchema, result: &mut ValidationResult) {
    for field in &schema.required_fields {
        match document.get(field) {
            None => result.add_issue(
                IssueKind::MissingField,
                field.as_str(),
                format!("required field '{}' is missing", field),
            ),
            Some(Value::Null) => result.add_issue(
                IssueKind::MissingField,
                field.as_str(),
                format!("required field '{}' is null", field),
            ),
            Some(_) => {}
        }
    }
}

/// Returns the fields that failed their type check.
fn check_types<'s>(
    document: &Document,
    schema: &'s ClassSchema,
    result: &mut ValidationResult,
) -> Vec<&'s str> {
    let mut mistyped = Vec::new();
    for (field, field_type) in &schema.field_types {
        let Some(value) = document.get(field).filter(|v| !v.is_null()) else {
            continue;
        };
        if !field_type.matches(value) {
            result.add_issue(
                IssueKind::TypeMismatch,
                field.as_str(),
                format!(
                    "field '{}' must be of type {}, got {}",
                    field,
                    field_type.name(),
                    json_type_name(value)
                ),
            );
            mistyped.push(field.as_str());
        }
    }
    mistyped
}

fn check_values(
    document: &Document,
    schema: &ClassSchema,
    mistyped: &[&str],
    result: &mut ValidationResult,
) {
    let present = |field: &str| {
        document
            .get(field)
            .filter(|v| !v.is_null() && !mistyped.iter().any(|m| *m == field))
    };

    for (field, allowed) in &schema.allowed_values {
        let Some(Value::String(value)) = present(field) else {
            continue;
        };
        if !allowed.iter().any(|a| a == value) {
            result.add_issue(
                IssueKind::InvalidValue,
                field.as_str(),
                format!(
                    "field '{}' must be one of [{}], got '{}'",
                    field,
                    allowed.join(", "),
                    value
                ),
            );
        }
    }

    for (field, format) in &schema.field_formats {
        let Some(Value::String(value)) = present(field) else {
            continue;
        };
        if !format.matches(value) {
            result.add_issue(
                IssueKind::InvalidValue,
                field.as_str(),
                format!("field '{}' must be {}, got '{}'", field, format.describe(), value),
            );
        }
    }

    for (field, field_type) in &schema.field_types {
        if *field_type != FieldType::StringArray {
            continue;
        }
        let Some(Value::Array(items)) = present(field) else {
            continue;
        };
        for (index, item) in items.iter().enumerate() {
            let blank = item.as_str().map_or(true, |s| s.trim().is_empty());
            if blank {
                result.add_issue(
                    IssueKind::InvalidValue,
                    format!("{}[{}]", field, index),
                    format!("item {} of '{}' must be a non-empty string", index, field),
                );
            }
        }
    }
}
