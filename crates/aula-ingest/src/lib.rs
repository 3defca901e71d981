//! AULA ingestion pipeline components.
//!
//! This crate provides the incremental batch pipeline that turns capture
//! batches of learning-activity events into a normalized, enriched event
//! table plus a resume watermark.
//!
//! # Modules
//!
//! - [`source`] - Batch store adapters (local directory, in-memory)
//! - [`pipeline`] - Ingestion controller (ceiling, watermark bookkeeping)
//! - [`table`] - Typed event table and normalization
//! - [`enrich`] - Derived columns (author/unit, Content/Evaluation)
//! - [`sink`] - Archive mirror and watermark metadata sinks
//! - [`watermark`] - Resume cursor type and best-effort persistence
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   BatchStore    │  (capture directory, object-storage container)
//! └────────┬────────┘
//!          │ list > after, read
//!          ▼
//! ┌─────────────────┐      ┌──────────────┐
//! │   Controller    │─────▶│ ArchiveSink  │  raw-batch mirror
//! └────────┬────────┘      └──────────────┘
//!          │ raw records + watermark
//!          ▼
//! ┌─────────────────┐      ┌──────────────┐
//! │   Normalizer    │      │ MetadataSink │  resume cursor
//! └────────┬────────┘      └──────────────┘
//!          │ typed, sorted table
//!          ▼
//! ┌─────────────────┐
//! │    Enricher     │  author/unit, Content/Evaluation
//! └─────────────────┘
//! ```
//!
//! The pipeline is a single-threaded, strictly sequential reduction over
//! batches in name order: each batch's contribution to the running record
//! count must be known before the next batch is read.

pub mod enrich;
pub mod error;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod table;
pub mod watermark;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

pub use enrich::{add_unit_type, derive_author_unit};
pub use pipeline::{ingest, IngestLimits, IngestOutcome, IngestStats};
pub use sink::{ArchiveSink, LocalArchive, LocalMetadata, MemoryArchive, MetadataSink};
pub use source::{BatchEntry, BatchStore, LocalStore, MemoryStore};
pub use table::{normalize, EventRow, EventTable};
pub use watermark::{Watermark, WATERMARK_KEY};
