//! Error types for the salween extraction library.
//!
//! Structural extraction failures (unknown document type or format, empty
//! input) are reported as `Failed` result values with a reason, not as
//! errors; this enum covers the storage and serialization boundary.

use thiserror::Error;

/// Primary error type for extraction operations.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience Result type alias for ExtractError.
pub type Result<T> = std::result::Result<T, ExtractError>;
