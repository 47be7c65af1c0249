//! Sample Store Implementation

use crate::StorageError;
use location_model::LocationSample;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default name of the persisted sample file
pub const DEFAULT_FILE_NAME: &str = "location_data.json";

/// Single-file store for the latest location sample.
///
/// Writes go to a uniquely named sibling temp file which is then renamed
/// over the target, so readers see either the old document or the new one,
/// never a mix.
#[derive(Debug, Clone)]
pub struct SampleStore {
    /// Directory holding the sample file
    dir: PathBuf,
    /// Full path of the sample file
    path: PathBuf,
}

impl SampleStore {
    /// Create a store for `dir/file_name`
    pub fn new(dir: impl Into<PathBuf>, file_name: &str) -> Self {
        let dir = dir.into();
        let path = dir.join(file_name);
        info!("Sample store at {}", path.display());
        Self { dir, path }
    }

    /// Create a store using [`DEFAULT_FILE_NAME`]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, DEFAULT_FILE_NAME)
    }

    /// Path of the sample file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the stored sample.
    ///
    /// Every call gets its own temp file, so concurrent writers never share
    /// one; the last rename wins.
    pub fn write(&self, sample: &LocationSample) -> Result<(), StorageError> {
        let json = serde_json::to_vec(sample)?;
        let dir_err = |source: std::io::Error| StorageError::Io {
            path: self.dir.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(dir_err)?;

        // Deleted on drop if anything fails before persist
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{}.", self.file_name()))
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(dir_err)?;

        tmp.write_all(&json).map_err(dir_err)?;
        tmp.as_file().sync_all().map_err(dir_err)?;

        tmp.persist(&self.path).map_err(|e| StorageError::Io {
            path: self.path.clone(),
            source: e.error,
        })?;

        debug!("Wrote {} bytes to {}", json.len(), self.path.display());
        Ok(())
    }

    /// Read the stored sample, `None` if nothing has been written yet
    pub fn read(&self) -> Result<Option<LocationSample>, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(DEFAULT_FILE_NAME)
    }
}
