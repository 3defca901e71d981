//! Core types and decoding for the AULA learning-event ingestion pipeline.
//!
//! This crate provides:
//! - The loosely-typed raw record shared across the pipeline
//! - Avro capture-batch container decoding
//! - Prometheus metrics helpers
//! - Shared error types

mod batch;
mod error;
pub mod metrics;
mod record;

pub use batch::{decode_batch, BODY_FIELD};
pub use error::{Error, Result};
pub use record::{fields, RawRecord};
