//! Batch store adapters.
//!
//! This module provides the stores the ingestion controller pulls capture
//! batches from. Each store enumerates batches in a deterministic order
//! and serves whole-file reads.
//!
//! # Available Stores
//!
//! - [`LocalStore`] - Recursive walk over a local capture directory
//! - [`MemoryStore`] - Ordered in-memory map, used in tests
//!
//! # Architecture
//!
//! All stores implement the [`BatchStore`] trait, which keeps the pipeline
//! agnostic to what backs the content root (object-storage container,
//! local directory tree).

mod local;
mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

use crate::Result;

/// An addressable capture batch inside a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    /// `/`-separated path-like name. Lexicographic byte order on names is
    /// the processing order and the resume-cursor order.
    pub name: String,

    /// Size in bytes, used for the placeholder-batch skip threshold.
    pub size: u64,
}

/// A content root that holds capture batches.
///
/// Stores are read-only from the pipeline's point of view and enumerated
/// fresh each run. Retry policy for transient transport errors lives in
/// the store implementation, not in the pipeline.
pub trait BatchStore {
    /// Human-readable name for this store (used in logs).
    fn name(&self) -> &'static str;

    /// List entries whose name strictly exceeds `after`, ascending by name.
    ///
    /// An empty listing is valid and yields an empty run. A listing
    /// failure is fatal to the run: an incomplete listing would silently
    /// truncate the day's data.
    fn list(&self, after: &str) -> Result<Vec<BatchEntry>>;

    /// Read the raw bytes of one entry.
    fn read(&self, name: &str) -> Result<Vec<u8>>;
}
