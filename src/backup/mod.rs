//! Configuration Backups
//!
//! Every destructive change to the configuration (upgrade, reset) is preceded
//! by a snapshot of the full document. Snapshots are immutable files whose
//! names embed their creation time; restore always picks the newest one and
//! never falls back to the shipped defaults.

pub mod naming;
pub mod storage;

use crate::error::{ApiError, BackupError, ConfigError, StorageError};
use crate::store::{parse_document, render_document};
use crate::types::ConfigDocument;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

pub use naming::{backup_name, parse_backup_name};
pub use storage::{BackupStorage, DirectoryBackupStorage, StoredBackup};

/// Attempts made when a freshly chosen name is already taken on disk.
const NAME_COLLISION_ATTEMPTS: u32 = 3;

/// Metadata for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupRecord {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub path: PathBuf,
    /// BLAKE3 digest of the stored bytes, hex encoded.
    pub digest: String,
    pub size_bytes: u64,
}

impl BackupRecord {
    fn from_stored(stored: &StoredBackup, bytes: &[u8]) -> Self {
        Self {
            name: stored.name.clone(),
            created_at: stored.created_at,
            path: stored.path.clone(),
            digest: hex::encode(blake3::hash(bytes).as_bytes()),
            size_bytes: bytes.len() as u64,
        }
    }
}

/// Creates, lists, and restores configuration snapshots.
pub struct BackupManager {
    storage: Arc<dyn BackupStorage>,
}

impl BackupManager {
    pub fn new(storage: Arc<dyn BackupStorage>) -> Self {
        Self { storage }
    }

    /// Manager over a plain backup directory.
    pub fn in_directory(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(DirectoryBackupStorage::new(dir)))
    }

    pub fn directory(&self) -> PathBuf {
        self.storage.directory().to_path_buf()
    }

    /// Write an immutable snapshot of `config`.
    ///
    /// The record's timestamp is strictly later than every existing backup and
    /// than `not_before` (typically the live file's modification time).
    pub fn snapshot(
        &self,
        config: &ConfigDocument,
        not_before: Option<DateTime<Utc>>,
    ) -> Result<BackupRecord, StorageError> {
        let bytes = render_document(config)?.into_bytes();

        let newest = self.storage.list()?.first().map(|b| b.created_at);
        let mut created_at = Utc::now().trunc_subsecs(6);
        for floor in [newest, not_before].into_iter().flatten() {
            let floor = floor.trunc_subsecs(6) + Duration::microseconds(1);
            if created_at < floor {
                created_at = floor;
            }
        }

        let mut attempt = 0;
        loop {
            let name = backup_name(created_at);
            match self.storage.create(&name, &bytes) {
                Ok(path) => {
                    let stored = StoredBackup {
                        name,
                        created_at,
                        path,
                    };
                    let record = BackupRecord::from_stored(&stored, &bytes);
                    tracing::info!(
                        backup = %record.name,
                        digest = %record.digest,
                        "configuration snapshot written"
                    );
                    return Ok(record);
                }
                Err(StorageError::Io { source, .. })
                    if source.kind() == std::io::ErrorKind::AlreadyExists
                        && attempt + 1 < NAME_COLLISION_ATTEMPTS =>
                {
                    attempt += 1;
                    created_at += Duration::microseconds(1);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// All snapshots, newest first.
    pub fn list(&self) -> Result<Vec<BackupRecord>, StorageError> {
        self.storage
            .list()?
            .iter()
            .map(|stored| {
                let bytes = self.storage.read(stored)?;
                Ok(BackupRecord::from_stored(stored, &bytes))
            })
            .collect()
    }

    /// Newest snapshot, if any.
    pub fn latest(&self) -> Result<Option<BackupRecord>, StorageError> {
        match self.storage.list()?.first() {
            Some(stored) => {
                let bytes = self.storage.read(stored)?;
                Ok(Some(BackupRecord::from_stored(stored, &bytes)))
            }
            None => Ok(None),
        }
    }

    /// Configuration held by the newest snapshot.
    pub fn restore(&self) -> Result<ConfigDocument, ApiError> {
        self.restore_latest().map(|(_, config)| config)
    }

    /// Newest snapshot together with its parsed configuration.
    pub fn restore_latest(&self) -> Result<(BackupRecord, ConfigDocument), ApiError> {
        let stored = self
            .storage
            .list()?
            .into_iter()
            .next()
            .ok_or_else(|| BackupError::NotFound {
                dir: self.storage.directory().to_path_buf(),
            })?;
        let bytes = self.storage.read(&stored)?;
        let text = std::str::from_utf8(&bytes).map_err(|source| ConfigError::InvalidUtf8 {
            path: stored.path.clone(),
            source,
        })?;
        let config = parse_document(text, &stored.path)?;
        Ok((BackupRecord::from_stored(&stored, &bytes), config))
    }
}
