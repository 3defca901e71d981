//! Error types for the capture-batch decoding layer.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decoding a capture batch.
#[derive(Error, Debug)]
pub enum Error {
    /// The Avro container could not be read.
    #[error("avro container error: {0}")]
    Avro(String),

    /// A container record is missing a required field.
    #[error("missing field '{field}' in container record")]
    MissingField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// The record body is not UTF-8 text.
    #[error("record body is not UTF-8 text")]
    BodyNotText,

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
