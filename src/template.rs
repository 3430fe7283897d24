//! Shipped default configuration template.
//!
//! The template is the source of `Latest` section content on upgrade and the
//! full replacement document on reset.

use crate::error::ConfigError;
use crate::store::parse_document;
use crate::types::ConfigDocument;
use crate::validation::ValidationConfigLoader;
use serde_json::Value;
use std::path::{Path, PathBuf};

const EMBEDDED_TEMPLATE: &str = include_str!("../templates/config.default.json");
const EMBEDDED_NAME: &str = "<embedded config.default.json>";

/// A parsed template document plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultTemplate {
    document: ConfigDocument,
    origin: PathBuf,
}

impl DefaultTemplate {
    /// The template compiled into the binary.
    pub fn embedded() -> Result<Self, ConfigError> {
        let origin = PathBuf::from(EMBEDDED_NAME);
        Self::checked(parse_document(EMBEDDED_TEMPLATE, &origin)?, origin)
    }

    /// A template override read from disk; must itself be a valid configuration.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::checked(parse_document(&text, path)?, path.to_path_buf())
    }

    /// Embedded template unless an override path is given.
    pub fn resolve(override_path: Option<&Path>) -> Result<Self, ConfigError> {
        match override_path {
            Some(path) => Self::from_file(path),
            None => Self::embedded(),
        }
    }

    fn checked(document: ConfigDocument, origin: PathBuf) -> Result<Self, ConfigError> {
        ValidationConfigLoader::load_all(&document)?;
        Ok(Self { document, origin })
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn server_version(&self) -> Option<&str> {
        server_version(&self.document)
    }
}

/// `server.version` of a configuration document.
pub fn server_version(document: &ConfigDocument) -> Option<&str> {
    document
        .get("server")
        .and_then(|server| server.get("version"))
        .and_then(Value::as_str)
}
