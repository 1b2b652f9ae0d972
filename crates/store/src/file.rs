//! Read-back handle for stored uploads.

use crate::error::{StoreError, StoreResult};
use crate::traits::ByteStream;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tusk_core::{UploadId, UploadMetadata};

/// A stored upload opened for reading.
///
/// Carries the decoded metadata mapping and streams the full current
/// content. The mapping is empty when the upload has no metadata record.
pub struct UploadFile {
    id: UploadId,
    path: PathBuf,
    io_chunk_size: usize,
    metadata: UploadMetadata,
}

impl UploadFile {
    pub(crate) fn new(
        id: UploadId,
        path: PathBuf,
        io_chunk_size: usize,
        metadata: UploadMetadata,
    ) -> Self {
        Self {
            id,
            path,
            io_chunk_size,
            metadata,
        }
    }

    /// The upload's id.
    pub fn id(&self) -> &UploadId {
        &self.id
    }

    /// The decoded metadata mapping.
    pub fn metadata(&self) -> &UploadMetadata {
        &self.metadata
    }

    /// Stream the full current content in bounded chunks.
    pub async fn content(&self) -> StoreResult<ByteStream> {
        let file = fs::File::open(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(self.id.clone())
            } else {
                StoreError::Io(e)
            }
        })?;

        let chunk_size = self.io_chunk_size;
        let stream = async_stream::try_stream! {
            let mut file = file;
            let mut buf = vec![0u8; chunk_size];
            loop {
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                yield Bytes::copy_from_slice(&buf[..n]);
            }
        };

        Ok(Box::pin(stream))
    }
}
