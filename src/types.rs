//! Core types shared across the configuration lifecycle and document validation.

use serde_json::{Map, Value};

/// ConfigDocument: the persisted configuration, keyed by top-level section name
pub type ConfigDocument = Map<String, Value>;

/// Document: a user-submitted document body awaiting validation
pub type Document = Map<String, Value>;

/// Short JSON type name used in diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
