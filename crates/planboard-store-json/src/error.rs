//! Error types for planboard store operations.

use thiserror::Error;

/// Errors that can occur during `JsonStore` operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Task was not found on the board.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// A task was created without a status.
    #[error("Task '{0}' has no status")]
    MissingStatus(String),

    /// Failed to parse the board file.
    #[error("Failed to parse board file: {0}")]
    ParseError(#[source] serde_json::Error),

    /// Failed to serialize the board file.
    #[error("Failed to serialize board file: {0}")]
    SerializeError(#[source] serde_json::Error),

    /// The board file uses a format this build cannot read.
    #[error("Unsupported board file version {0}")]
    UnsupportedVersion(u32),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Other unclassified error.
    #[error("Other error: {0}")]
    Other(String),
}
