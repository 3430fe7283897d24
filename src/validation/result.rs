//! Aggregated validation outcome.

use crate::types::Document;
use serde::Serialize;
use std::fmt;

/// Category of a single validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingField,
    TypeMismatch,
    ExtraField,
    InvalidValue,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IssueKind::MissingField => "missing field",
            IssueKind::TypeMismatch => "type mismatch",
            IssueKind::ExtraField => "extra field",
            IssueKind::InvalidValue => "invalid value",
        };
        f.write_str(label)
    }
}

/// One violation, addressed by field name or dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub field: String,
    pub message: String,
}

/// A cosmetic path fix applied before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathCorrection {
    pub field: String,
    pub original: String,
    pub corrected: String,
}

/// Every violation found in one pass, plus the corrections and the document as validated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    subject: String,
    ok: bool,
    issues: Vec<ValidationIssue>,
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    corrections: Vec<PathCorrection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<Document>,
}

impl ValidationResult {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ok: true,
            issues: Vec::new(),
            warnings: Vec::new(),
            corrections: Vec::new(),
            document: None,
        }
    }

    pub fn add_issue(
        &mut self,
        kind: IssueKind,
        field: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.ok = false;
        self.issues.push(ValidationIssue {
            kind,
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn add_correction(&mut self, correction: PathCorrection) {
        self.corrections.push(correction);
    }

    pub(crate) fn set_document(&mut self, document: Document) {
        self.document = Some(document);
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn is_valid(&self) -> bool {
        self.ok
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn corrections(&self) -> &[PathCorrection] {
        &self.corrections
    }

    /// The document after path correction, as it was checked.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn into_document(self) -> Option<Document> {
        self.document
    }

    /// Fields named by issues of `kind`, in report order.
    pub fn fields_with(&self, kind: IssueKind) -> Vec<&str> {
        self.issues
            .iter()
            .filter(|issue| issue.kind == kind)
            .map(|issue| issue.field.as_str())
            .collect()
    }

    pub fn missing_fields(&self) -> Vec<&str> {
        self.fields_with(IssueKind::MissingField)
    }

    /// Human-readable issue lines, one per violation.
    pub fn error_messages(&self) -> Vec<String> {
        self.issues
            .iter()
            .map(|issue| format!("{}: {}", issue.kind, issue.message))
            .collect()
    }
}
