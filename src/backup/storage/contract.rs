use crate::error::StorageError;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// A backup file found in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBackup {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub path: PathBuf,
}

pub trait BackupStorage: Send + Sync {
    /// Directory the backups live in.
    fn directory(&self) -> &Path;
    /// All backups, newest first.
    fn list(&self) -> Result<Vec<StoredBackup>, StorageError>;
    /// Write a new backup; fails rather than replacing an existing file of the same name.
    fn create(&self, name: &str, contents: &[u8]) -> Result<PathBuf, StorageError>;
    fn read(&self, backup: &StoredBackup) -> Result<Vec<u8>, StorageError>;
}
