//! Disk-backed storage engine for resumable, chunked uploads.
//!
//! This crate provides:
//! - [`UploadStore`], the operation surface an upload protocol layer
//!   drives: create, append, verify, read back, delete
//! - [`DiskStore`], the disk-backed implementation (one directory root,
//!   three records per upload id)
//! - [`UploadFile`], the read-back handle

pub mod disk;
pub mod error;
pub mod file;
pub mod traits;

pub use disk::DiskStore;
pub use error::{StoreError, StoreResult};
pub use file::UploadFile;
pub use traits::{ByteStream, DataStream, UploadStore};

use std::sync::Arc;
use tusk_core::StoreConfig;

/// Create an upload store from configuration.
pub async fn from_config(config: &StoreConfig) -> StoreResult<Arc<dyn UploadStore>> {
    let store = DiskStore::from_config(config).await?;
    Ok(Arc::new(store))
}
