//! The configuration currently in force, with the validation state derived from it.

use crate::error::ConfigError;
use crate::types::ConfigDocument;
use crate::validation::{
    DocumentValidator, SchemaRegistry, ValidationConfigLoader, ValidationPolicy,
};

/// Immutable snapshot of the active configuration. Replaced wholesale, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveConfig {
    document: ConfigDocument,
    policy: ValidationPolicy,
    registry: SchemaRegistry,
}

impl ActiveConfig {
    /// Derive policy and registry; fails fast on any missing or malformed section.
    pub fn build(document: ConfigDocument) -> Result<Self, ConfigError> {
        let (policy, registry) = ValidationConfigLoader::load_all(&document)?;
        Ok(Self {
            document,
            policy,
            registry,
        })
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn validator(&self) -> DocumentValidator<'_> {
        DocumentValidator::new(&self.registry)
    }
}
