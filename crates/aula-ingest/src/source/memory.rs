//! In-memory batch store.
//!
//! Ordered map of name → bytes, used by pipeline tests. The reported size
//! can be overridden per entry so the placeholder-batch skip threshold can
//! be exercised without crafting containers of an exact byte size.

use super::{BatchEntry, BatchStore};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::ops::Bound;

struct StoredBatch {
    bytes: Vec<u8>,
    reported_size: u64,
}

/// Batch store backed by an ordered in-memory map.
#[derive(Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, StoredBatch>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a batch; the listed size is the byte length.
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        let reported_size = bytes.len() as u64;
        self.insert_with_size(name, bytes, reported_size);
    }

    /// Insert a batch with an explicit listed size.
    pub fn insert_with_size(&mut self, name: impl Into<String>, bytes: Vec<u8>, size: u64) {
        self.entries.insert(
            name.into(),
            StoredBatch {
                bytes,
                reported_size: size,
            },
        );
    }
}

impl BatchStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn list(&self, after: &str) -> Result<Vec<BatchEntry>> {
        Ok(self
            .entries
            .range::<str, _>((Bound::Excluded(after), Bound::Unbounded))
            .map(|(name, stored)| BatchEntry {
                name: name.clone(),
                size: stored.reported_size,
            })
            .collect())
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.entries
            .get(name)
            .map(|stored| stored.bytes.clone())
            .ok_or_else(|| Error::SourceUnavailable {
                name: name.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such batch"),
            })
    }
}
