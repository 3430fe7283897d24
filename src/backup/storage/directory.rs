use crate::backup::naming::parse_backup_name;
use crate::backup::storage::{BackupStorage, StoredBackup};
use crate::error::StorageError;
use crate::store::persistence::{write_atomic, WriteMode};
use std::path::{Path, PathBuf};

/// Backups stored as individual JSON files in one directory.
pub struct DirectoryBackupStorage {
    dir: PathBuf,
}

impl DirectoryBackupStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl BackupStorage for DirectoryBackupStorage {
    fn directory(&self) -> &Path {
        &self.dir
    }

    fn list(&self) -> Result<Vec<StoredBackup>, StorageError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|e| StorageError::io(&self.dir, e))?;

        let mut found = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(
                        "Failed to read directory entry in {}: {}",
                        self.dir.display(),
                        e
                    );
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let name = match path.file_name().and_then(|s| s.to_str()) {
                Some(name) => name.to_string(),
                None => {
                    tracing::warn!("Skipping backup with non UTF8 name: {:?}", path);
                    continue;
                }
            };

            // Foreign files in the directory are not ours to judge.
            let created_at = match parse_backup_name(&name) {
                Ok(ts) => ts,
                Err(_) => continue,
            };

            found.push(StoredBackup {
                name,
                created_at,
                path,
            });
        }

        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.name.cmp(&a.name)));
        Ok(found)
    }

    fn create(&self, name: &str, contents: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.dir.join(name);
        write_atomic(&path, contents, WriteMode::CreateNew)?;
        Ok(path)
    }

    fn read(&self, backup: &StoredBackup) -> Result<Vec<u8>, StorageError> {
        std::fs::read(&backup.path).map_err(|e| StorageError::io(&backup.path, e))
    }
}
