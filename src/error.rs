//! Error types for docorder.

use std::io;
use thiserror::Error;

/// Result type alias for docorder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reconstructing a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A source or output document is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A bounding box is missing, too short or degenerate.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A record's page identifier could not be coerced to a page number.
    #[error("Invalid page number: {0}")]
    InvalidPageNumber(String),

    /// A source document does not have the expected shape.
    #[error("Unexpected source shape: {0}")]
    SourceShape(String),

    /// A page has structured fragments but the lines source never covers it.
    #[error("No lines found for page {0}")]
    MissingLines(u32),

    /// The normalization collaborator failed or returned non-JSON.
    #[error("Normalization error: {0}")]
    Normalize(String),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
