//! Requests and results of the admin operations.

use crate::backup::BackupRecord;
use crate::error::ApiError;
use crate::merge::policy::join_path;
use crate::merge::MergeReport;
use crate::types::{json_type_name, ConfigDocument};
use crate::validation::ValidationResult;
use serde::Serialize;
use serde_json::{Map, Value};

/// A requested change to the configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigUpdate {
    /// Replace the whole document.
    Replace(ConfigDocument),
    /// Set one value. `key` may be dotted to reach nested tables. `value` is
    /// parsed as JSON when possible and stored as a string otherwise.
    Set {
        section: String,
        key: String,
        value: String,
    },
}

impl ConfigUpdate {
    pub fn set(
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        ConfigUpdate::Set {
            section: section.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// The candidate document this update would produce from `current`.
    pub fn apply_to(&self, current: &ConfigDocument) -> Result<ConfigDocument, ApiError> {
        let (section, key, raw) = match self {
            ConfigUpdate::Replace(document) => return Ok(document.clone()),
            ConfigUpdate::Set {
                section,
                key,
                value,
            } => (section, key, value),
        };

        let segments: Vec<&str> = key.split('.').map(str::trim).collect();
        if section.trim().is_empty() || segments.iter().any(|s| s.is_empty()) {
            return Err(ApiError::InvalidRequest(format!(
                "section and key must be non-empty (got '{}' / '{}')",
                section, key
            )));
        }
        let value = parse_update_value(raw);

        let mut candidate = current.clone();
        let mut table = match candidate
            .entry(section.clone())
            .or_insert_with(|| Value::Object(Map::new()))
        {
            Value::Object(map) => map,
            other => {
                return Err(ApiError::InvalidRequest(format!(
                    "section '{}' is {}, not a table",
                    section,
                    json_type_name(other)
                )))
            }
        };

        let mut path = section.clone();
        let (leaf, parents) = match segments.split_last() {
            Some(split) => split,
            None => return Err(ApiError::InvalidRequest("empty key".to_string())),
        };
        for segment in parents {
            path = join_path(&path, segment);
            table = match table
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()))
            {
                Value::Object(map) => map,
                other => {
                    return Err(ApiError::InvalidRequest(format!(
                        "'{}' is {}, not a table",
                        path,
                        json_type_name(other)
                    )))
                }
            };
        }
        table.insert(leaf.to_string(), value);
        Ok(candidate)
    }
}

/// JSON if it parses (`false`, `9300`, `["a"]`), the raw text otherwise.
pub fn parse_update_value(raw: &str) -> Value {
    serde_json::from_str(raw.trim()).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Whether an update was applied or rejected by validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateOutcome {
    Applied { validation: ValidationResult },
    Rejected { validation: ValidationResult },
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, UpdateOutcome::Applied { .. })
    }

    pub fn validation(&self) -> &ValidationResult {
        match self {
            UpdateOutcome::Applied { validation } | UpdateOutcome::Rejected { validation } => {
                validation
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResetOutcome {
    pub backup: BackupRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradeOutcome {
    pub backup: BackupRecord,
    pub from_version: Option<String>,
    pub to_version: Option<String>,
    pub report: MergeReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestoreOutcome {
    pub backup: BackupRecord,
}
