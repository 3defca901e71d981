//! Error types for the ingestion pipeline.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during an ingestion run.
#[derive(Error, Debug)]
pub enum Error {
    /// Listing or reading the batch store failed.
    ///
    /// Fatal for the run: a partial listing would silently truncate the
    /// day's data, so no watermark is emitted.
    #[error("source unavailable: {name}: {source}")]
    SourceUnavailable {
        /// Store or entry the operation targeted.
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A non-trivial capture batch failed to decode.
    #[error("malformed batch '{name}': {source}")]
    MalformedBatch {
        /// Name of the batch that failed.
        name: String,
        #[source]
        source: aula_core::Error,
    },

    /// A required column was absent from a payload.
    #[error("missing column '{column}'")]
    MissingColumn {
        /// The name of the missing column.
        column: &'static str,
    },

    /// A numeric column held non-numeric text.
    #[error("column '{column}' has non-numeric value '{value}'")]
    MalformedColumn {
        /// The name of the column.
        column: &'static str,
        /// The offending text.
        value: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
