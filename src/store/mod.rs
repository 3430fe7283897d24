//! Config Store
//!
//! Durable home of the configuration document. Reads parse the whole file in
//! one pass; writes land in a sibling temporary file that then replaces the
//! live file by rename, so a concurrent reader sees either the old document or
//! the new one, never a torn write.

pub mod persistence;

use crate::error::{ConfigError, StorageError};
use crate::types::{json_type_name, ConfigDocument};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::Path;

pub use persistence::FileConfigStore;

/// Config store interface
pub trait ConfigStore: Send + Sync {
    /// Location of the live document, for diagnostics.
    fn location(&self) -> &Path;

    fn exists(&self) -> bool;

    /// Read and parse the full document.
    fn load(&self) -> Result<ConfigDocument, ConfigError>;

    /// Atomically replace the live document.
    fn save(&self, document: &ConfigDocument) -> Result<(), StorageError>;

    /// Last modification time of the live document, if it exists.
    fn modified(&self) -> Result<Option<DateTime<Utc>>, StorageError>;
}

/// Parse document text; the root must be a JSON object.
pub fn parse_document(text: &str, path: &Path) -> Result<ConfigDocument, ConfigError> {
    let value: Value = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ConfigError::InvalidShape {
            path: path.display().to_string(),
            expected: "a JSON object at the document root",
            found: json_type_name(&other),
        }),
    }
}

/// Render a document the way it is stored on disk: pretty JSON with a trailing newline.
pub fn render_document(document: &ConfigDocument) -> Result<String, StorageError> {
    let mut text = serde_json::to_string_pretty(document)?;
    text.push('\n');
    Ok(text)
}
