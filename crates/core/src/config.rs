//! Store configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the disk store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory all upload records live under.
    pub root: PathBuf,
    /// Buffer size for streaming disk I/O, in bytes.
    #[serde(default = "default_io_chunk_size")]
    pub io_chunk_size: usize,
}

impl StoreConfig {
    /// Create a configuration with defaults for the given root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            io_chunk_size: default_io_chunk_size(),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.root.as_os_str().is_empty() {
            return Err("root directory must not be empty".to_string());
        }
        if self.io_chunk_size == 0 {
            return Err("io_chunk_size must be non-zero".to_string());
        }
        Ok(())
    }
}

fn default_io_chunk_size() -> usize {
    crate::DEFAULT_IO_CHUNK_SIZE
}
