//! Store error types.

use thiserror::Error;
use tusk_core::UploadId;

/// Storage engine errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("upload not found: {0}")]
    NotFound(UploadId),

    #[error(
        "Stream contains more data than the file's upload length. \
         Stream data: {stream_size}, upload length: {upload_length}."
    )]
    SizeExceeded {
        stream_size: u64,
        upload_length: u64,
    },

    #[error("unsupported checksum algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("core error: {0}")]
    Core(#[from] tusk_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
