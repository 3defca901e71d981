//! Archive and metadata sinks.
//!
//! Collaborators the pipeline writes to: the archive sink mirrors
//! processed raw batches into a secondary root, and the metadata sink
//! persists the run watermark under a well-known key.

use crate::watermark::Watermark;
use crate::{Error, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Secondary sink that mirrors processed raw batches.
///
/// Writes are idempotent overwrites: re-processing a batch after a crash
/// replaces the prior copy and must not error.
pub trait ArchiveSink {
    /// Store the raw bytes of one processed batch under its name.
    fn write(&self, name: &str, bytes: &[u8]) -> Result<()>;
}

/// Durable sink for the run watermark.
pub trait MetadataSink {
    /// Persist the watermark under `key`, overwriting any prior value.
    fn write(&self, key: &str, watermark: &Watermark) -> Result<()>;

    /// Load the watermark stored under `key`, `None` when absent.
    fn load(&self, key: &str) -> Result<Option<Watermark>>;
}

/// Archive sink backed by a local directory tree.
///
/// Batch names keep their `/` structure below the archive root; parent
/// directories are created on demand.
pub struct LocalArchive {
    root: PathBuf,
}

impl LocalArchive {
    /// Create an archive rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in name.split('/') {
            path.push(segment);
        }
        path
    }
}

impl ArchiveSink for LocalArchive {
    fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(())
    }
}

/// In-memory archive sink, used in tests.
#[derive(Default)]
pub struct MemoryArchive {
    batches: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryArchive {
    /// Create an empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the batches written so far, in name order.
    pub fn names(&self) -> Vec<String> {
        self.batches.lock().keys().cloned().collect()
    }

    /// Bytes stored under `name`, if any.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.batches.lock().get(name).cloned()
    }
}

impl ArchiveSink for MemoryArchive {
    fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.batches.lock().insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Metadata sink backed by a local directory.
///
/// Each key is stored as one JSON document in the directory.
pub struct LocalMetadata {
    root: PathBuf,
}

impl LocalMetadata {
    /// Create a metadata sink rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl MetadataSink for LocalMetadata {
    fn write(&self, key: &str, watermark: &Watermark) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let json = serde_json::to_string_pretty(watermark)?;
        fs::write(self.root.join(key), json)?;
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Watermark>> {
        let path = self.root.join(key);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }
}
