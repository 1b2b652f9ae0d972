//! Store trait definitions.

use crate::error::StoreResult;
use crate::file::UploadFile;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;
use tusk_core::UploadId;

/// A boxed stream of incoming upload bytes.
pub type DataStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// A boxed stream of stored content bytes for read-back.
pub type ByteStream = Pin<Box<dyn Stream<Item = StoreResult<Bytes>> + Send>>;

/// Storage engine surface consumed by the upload protocol layer.
///
/// Every operation accepts a cancellation token, observed at each I/O
/// suspension point so a long-running call stops promptly without leaving
/// torn on-disk state. Callers are responsible for serializing operations on
/// one upload id; distinct ids never contend.
#[async_trait]
pub trait UploadStore: Send + Sync + 'static {
    /// Create a fresh upload: an empty content record, the declared length
    /// record if one was provided, and the metadata record if the supplied
    /// text is non-empty and well-formed.
    ///
    /// On a failure partway through, partial records are removed
    /// best-effort before the error is returned.
    async fn create_file(
        &self,
        upload_length: Option<u64>,
        metadata: Option<&str>,
        cancel: &CancellationToken,
    ) -> StoreResult<UploadId>;

    /// Check whether a content record exists for `id`.
    async fn file_exists(&self, id: &UploadId, cancel: &CancellationToken) -> StoreResult<bool>;

    /// Read the declared upload length.
    ///
    /// Absent, empty, or unparsable length records all read as `None`
    /// ("length unknown"), never as zero and never as an error.
    async fn upload_length(
        &self,
        id: &UploadId,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<u64>>;

    /// Current size of the content record, which is the upload offset.
    ///
    /// Fails with [`StoreError::NotFound`] if no content record exists.
    ///
    /// [`StoreError::NotFound`]: crate::StoreError::NotFound
    async fn upload_offset(&self, id: &UploadId, cancel: &CancellationToken) -> StoreResult<u64>;

    /// The persisted metadata blob, verbatim.
    ///
    /// Absent or empty records read as `None` ("no metadata").
    async fn upload_metadata(
        &self,
        id: &UploadId,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<String>>;

    /// Open a read-back handle, or `None` if no content record exists.
    async fn get_file(
        &self,
        id: &UploadId,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<UploadFile>>;

    /// Append a stream of bytes to the content record, returning the number
    /// of bytes written by this call.
    ///
    /// Appending to an upload already at its declared length consumes
    /// nothing and returns 0. A stream carrying more data than the declared
    /// length admits fails with [`StoreError::SizeExceeded`] without
    /// persisting any byte past the ceiling. If `cancel` fires mid-stream
    /// the call stops promptly and returns the bytes durably written so
    /// far; the on-disk size always equals the sum of reported counts.
    ///
    /// [`StoreError::SizeExceeded`]: crate::StoreError::SizeExceeded
    async fn append_data(
        &self,
        id: &UploadId,
        data: DataStream,
        cancel: &CancellationToken,
    ) -> StoreResult<u64>;

    /// Verify `expected` against the digest of the bytes written by the
    /// most recent append to `id`.
    ///
    /// On match, returns `true` and leaves the upload untouched. On
    /// mismatch, truncates the content record back to the offset that
    /// append started at and returns `false`, so the client can safely
    /// retry the same chunk. An algorithm name outside
    /// [`supported_algorithms`] fails with
    /// [`StoreError::UnsupportedAlgorithm`] instead of reporting a
    /// mismatch.
    ///
    /// [`supported_algorithms`]: UploadStore::supported_algorithms
    /// [`StoreError::UnsupportedAlgorithm`]: crate::StoreError::UnsupportedAlgorithm
    async fn verify_checksum(
        &self,
        id: &UploadId,
        algorithm: &str,
        expected: &[u8],
        cancel: &CancellationToken,
    ) -> StoreResult<bool>;

    /// Delete the content, length, and metadata records for `id`.
    ///
    /// Deleting an id that does not exist succeeds; the observable result
    /// is the same either way.
    async fn delete_file(&self, id: &UploadId, cancel: &CancellationToken) -> StoreResult<()>;

    /// Names of the checksum algorithms `verify_checksum` accepts.
    fn supported_algorithms(&self) -> &'static [&'static str];

    /// Verify the store's backing storage is reachable.
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
