//! Error types for configuration loading, persistence, backups, and the admin surface.
//!
//! Document validation failures are not errors; they are reported through
//! [`crate::validation::ValidationResult`].

use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration errors raised while loading the persisted document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required section '{section}' is missing (expected {expected})")]
    MissingSection {
        section: String,
        expected: &'static str,
    },

    #[error("required key '{path}' is missing (expected {expected})")]
    MissingKey {
        path: String,
        expected: &'static str,
    },

    #[error("'{path}' must be a boolean, got {value}")]
    MalformedBoolean { path: String, value: String },

    #[error("'{path}' has the wrong shape: expected {expected}, found {found}")]
    InvalidShape {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("'{path}' names unknown field type '{value}'")]
    UnknownFieldType { path: String, value: String },

    #[error("'{path}' names unknown field format '{value}'")]
    UnknownFieldFormat { path: String, value: String },

    #[error("failed to read configuration {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration {path} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        path: PathBuf,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("failed to parse configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not determine the configuration home (neither XDG_CONFIG_HOME nor HOME is set)")]
    NoConfigHome,

    #[error("runtime settings error: {0}")]
    Settings(#[from] config::ConfigError),
}

/// Persistence failures. The operation that hit one aborts without touching the live file.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("path {path} has no parent directory")]
    NoParentDirectory { path: PathBuf },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Backup lookup failures.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error(
        "no configuration backup found in {dir}; restore needs a prior snapshot \
         (use reset to return to the shipped defaults instead)"
    )]
    NotFound { dir: PathBuf },

    #[error("'{name}' is not a configuration backup file name")]
    InvalidName { name: String },
}

/// Errors surfaced by the admin service and CLI.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("{0}")]
    BackupError(#[from] BackupError),

    #[error("another configuration change is in progress ({operation}); try again when it finishes")]
    Busy { operation: &'static str },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("logging setup failed: {0}")]
    Logging(String),
}
