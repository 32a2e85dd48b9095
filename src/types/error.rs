//! Error types for the quick-block library.

use thiserror::Error;

/// All errors that can occur in the quick-block library.
#[derive(Error, Debug)]
pub enum BlockError {
    /// IO error from a file-backed store or an import/export file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored or supplied document could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The persisted store rejected or failed an operation.
    #[error("Store error: {0}")]
    Store(String),

    /// An import payload failed the shape check. Nothing was merged.
    #[error("Invalid block list file format: {0}")]
    InvalidImport(String),

    /// No record exists for the given username.
    #[error("User @{0} is not blocked")]
    NotFound(String),

    /// A command-line or config value could not be parsed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience result type for quick-block operations.
pub type BlockResult<T> = Result<T, BlockError>;
