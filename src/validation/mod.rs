//! Document Validation
//!
//! Policy and schema are loaded from the configuration document once (or on
//! explicit reload) and passed explicitly into every validation call.

pub mod loader;
pub mod paths;
pub mod result;
pub mod schema;
pub mod template;
pub mod validator;

pub use loader::{coerce_bool, ValidationConfigLoader, ValidationPolicy, REQUIRED_SECTIONS};
pub use paths::{normalize_path, NormalizedPath};
pub use result::{IssueKind, PathCorrection, ValidationIssue, ValidationResult};
pub use schema::{
    ClassSchema, DocumentClass, FieldFormat, FieldType, SchemaRegistry, CUSTOM_MINIMAL_FIELDS,
};
pub use template::{create_document_template, generate_document_id, DocumentTemplateRequest};
pub use validator::DocumentValidator;
