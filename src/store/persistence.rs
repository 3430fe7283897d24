//! File-backed config store with replace-by-rename writes.

use super::{parse_document, render_document, ConfigStore};
use crate::error::{ConfigError, StorageError};
use crate::types::ConfigDocument;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Stores the configuration document as a single JSON file.
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfigStore {
    fn location(&self) -> &Path {
        &self.path
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> Result<ConfigDocument, ConfigError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Unreadable {
            path: self.path.clone(),
            source,
        })?;
        parse_document(&text, &self.path)
    }

    fn save(&self, document: &ConfigDocument) -> Result<(), StorageError> {
        let text = render_document(document)?;
        write_atomic(&self.path, text.as_bytes(), WriteMode::Replace)?;
        tracing::debug!(path = %self.path.display(), bytes = text.len(), "configuration persisted");
        Ok(())
    }

    fn modified(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        match std::fs::metadata(&self.path) {
            Ok(metadata) => {
                let mtime = metadata
                    .modified()
                    .map_err(|e| StorageError::io(&self.path, e))?;
                Ok(Some(DateTime::<Utc>::from(mtime)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(&self.path, e)),
        }
    }
}

/// Whether an atomic write may replace an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
    Replace,
    CreateNew,
}

/// Write `contents` to a temporary file beside `path`, flush it, then move it into place.
///
/// With [`WriteMode::CreateNew`] the final move fails if `path` already exists.
pub(crate) fn write_atomic(
    path: &Path,
    contents: &[u8],
    mode: WriteMode,
) -> Result<(), StorageError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        Some(_) => Path::new("."),
        None => {
            return Err(StorageError::NoParentDirectory {
                path: path.to_path_buf(),
            })
        }
    };
    std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;

    let mut temp = tempfile::Builder::new()
        .prefix(".kbase-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| StorageError::io(parent, e))?;
    temp.write_all(contents)
        .map_err(|e| StorageError::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| StorageError::io(temp.path(), e))?;

    let persisted = match mode {
        WriteMode::Replace => temp.persist(path),
        WriteMode::CreateNew => temp.persist_noclobber(path),
    };
    persisted.map_err(|e| StorageError::io(path, e.error))?;
    Ok(())
}
