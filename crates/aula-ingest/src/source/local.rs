//! Local-directory batch store.
//!
//! Walks a capture directory tree recursively and exposes every file with
//! the capture extension as a batch. Names are root-relative paths with
//! `/` separators regardless of platform, so cursors taken from one store
//! compare cleanly against names from another.

use super::{BatchEntry, BatchStore};
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Default file extension of capture batches.
const CAPTURE_EXTENSION: &str = "avro";

/// Batch store backed by a local directory tree.
pub struct LocalStore {
    root: PathBuf,
    extension: String,
}

impl LocalStore {
    /// Create a store over `root`, listing `.avro` files.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: CAPTURE_EXTENSION.to_string(),
        }
    }

    /// Override the capture file extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn unavailable(&self, source: std::io::Error) -> Error {
        Error::SourceUnavailable {
            name: self.root.display().to_string(),
            source,
        }
    }

    /// Recursively collect matching files under `dir`.
    fn walk(&self, dir: &Path, entries: &mut Vec<BatchEntry>) -> std::io::Result<()> {
        for dir_entry in fs::read_dir(dir)? {
            let dir_entry = dir_entry?;
            let path = dir_entry.path();
            let file_type = dir_entry.file_type()?;

            if file_type.is_dir() {
                self.walk(&path, entries)?;
            } else if file_type.is_file()
                && path.extension().is_some_and(|ext| ext == self.extension.as_str())
            {
                let size = dir_entry.metadata()?.len();
                entries.push(BatchEntry {
                    name: relative_name(&self.root, &path),
                    size,
                });
            }
        }
        Ok(())
    }
}

impl BatchStore for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    fn list(&self, after: &str) -> Result<Vec<BatchEntry>> {
        let mut entries = Vec::new();
        self.walk(&self.root, &mut entries)
            .map_err(|e| self.unavailable(e))?;

        entries.retain(|entry| entry.name.as_str() > after);
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let mut path = self.root.clone();
        for segment in name.split('/') {
            path.push(segment);
        }
        fs::read(&path).map_err(|e| Error::SourceUnavailable {
            name: name.to_string(),
            source: e,
        })
    }
}

/// Root-relative path with `/` separators.
fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
