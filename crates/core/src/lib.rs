//! Core domain types for the tusk resumable-upload store.
//!
//! This crate defines the data model shared between the storage engine and
//! its consumers:
//! - Upload identifiers
//! - The metadata wire codec
//! - The checksum algorithm registry
//! - Store configuration

pub mod checksum;
pub mod config;
pub mod error;
pub mod metadata;
pub mod upload;

pub use checksum::{ChecksumAlgorithm, ChunkDigester, SUPPORTED_CHECKSUM_ALGORITHMS};
pub use config::StoreConfig;
pub use error::{Error, Result};
pub use metadata::UploadMetadata;
pub use upload::UploadId;

/// Default buffer size for streaming disk I/O: 64 KiB
pub const DEFAULT_IO_CHUNK_SIZE: usize = 64 * 1024;
