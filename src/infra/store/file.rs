//! File-backed blob store: one JSON document per record.

use std::fs::{create_dir_all, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use crate::core::{BlobStore, SyncError};

/// Stores each record as `<dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    path: PathBuf,
}

impl FileBlobStore {
    /// Open (creating if needed) a store rooted at `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let path = path.as_ref().to_path_buf();
        create_dir_all(&path).map_err(|e| SyncError::Persistence(e.to_string()))?;
        Ok(Self { path })
    }

    /// Root directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_path(&self, name: &str) -> Result<PathBuf, SyncError> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(SyncError::Persistence(format!("invalid record name `{name}`")));
        }
        Ok(self.path.join(format!("{name}.json")))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, name: &str) -> Result<Option<String>, SyncError> {
        let file_path = self.file_path(name)?;
        let mut file = match OpenOptions::new().read(true).open(&file_path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SyncError::Persistence(e.to_string())),
        };
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| SyncError::Persistence(e.to_string()))?;
        Ok(Some(contents))
    }

    fn set(&self, name: &str, value: &str) -> Result<(), SyncError> {
        let file_path = self.file_path(name)?;
        let tmp_path = file_path.with_extension("json.tmp");
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(|e| SyncError::Persistence(e.to_string()))?;
        file.write_all(value.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| SyncError::Persistence(e.to_string()))?;
        std::fs::rename(&tmp_path, &file_path).map_err(|e| SyncError::Persistence(e.to_string()))
    }

    fn remove(&self, name: &str) -> Result<(), SyncError> {
        let file_path = self.file_path(name)?;
        match std::fs::remove_file(&file_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::Persistence(e.to_string())),
        }
    }
}
