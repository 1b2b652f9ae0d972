//! Disk-backed upload store.

use crate::error::{StoreError, StoreResult};
use crate::file::UploadFile;
use crate::traits::{DataStream, UploadStore};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tusk_core::checksum::ChecksumAlgorithm;
use tusk_core::{SUPPORTED_CHECKSUM_ALGORITHMS, StoreConfig, UploadId, UploadMetadata};

/// File name suffix of the length record.
const UPLOAD_LENGTH_SUFFIX: &str = ".uploadlength";

/// File name suffix of the metadata record.
const METADATA_SUFFIX: &str = ".metadata";

/// Disk-backed implementation of [`UploadStore`].
///
/// One upload id maps to up to three files under the root directory:
/// `<root>/<id>` (content), `<root>/<id>.uploadlength` (declared length)
/// and `<root>/<id>.metadata` (metadata blob). The start offset of the most
/// recent append per id is tracked in memory; it is the rollback point
/// checksum verification truncates to on mismatch.
pub struct DiskStore {
    root: PathBuf,
    io_chunk_size: usize,
    chunk_starts: Mutex<HashMap<UploadId, u64>>,
}

impl DiskStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            io_chunk_size: tusk_core::DEFAULT_IO_CHUNK_SIZE,
            chunk_starts: Mutex::new(HashMap::new()),
        })
    }

    /// Create a store from a validated configuration.
    pub async fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        config.validate().map_err(StoreError::Config)?;
        let mut store = Self::new(&config.root).await?;
        store.io_chunk_size = config.io_chunk_size;
        Ok(store)
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn content_path(&self, id: &UploadId) -> PathBuf {
        self.root.join(id.as_str())
    }

    fn length_path(&self, id: &UploadId) -> PathBuf {
        self.root
            .join(format!("{}{UPLOAD_LENGTH_SUFFIX}", id.as_str()))
    }

    fn metadata_path(&self, id: &UploadId) -> PathBuf {
        self.root.join(format!("{}{METADATA_SUFFIX}", id.as_str()))
    }

    fn ensure_live(cancel: &CancellationToken) -> StoreResult<()> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        Ok(())
    }

    /// Record the rollback point for the append that starts at `offset`.
    fn record_chunk_start(&self, id: &UploadId, offset: u64) {
        self.chunk_starts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), offset);
    }

    fn chunk_start(&self, id: &UploadId) -> Option<u64> {
        self.chunk_starts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .copied()
    }

    fn forget_chunk_start(&self, id: &UploadId) {
        self.chunk_starts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }

    /// Size of the content record.
    async fn content_size(&self, id: &UploadId) -> StoreResult<u64> {
        match fs::metadata(self.content_path(id)).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read the declared length; anything malformed reads as unknown.
    async fn read_upload_length(&self, id: &UploadId) -> StoreResult<Option<u64>> {
        match fs::read_to_string(self.length_path(id)).await {
            Ok(text) => Ok(text.trim().parse::<u64>().ok()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every record belonging to `id`, ignoring records that are
    /// already gone.
    async fn remove_records(&self, id: &UploadId) -> StoreResult<()> {
        for path in [
            self.content_path(id),
            self.length_path(id),
            self.metadata_path(id),
        ] {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Persist the length and metadata records for a freshly created id.
    async fn write_side_records(
        &self,
        id: &UploadId,
        upload_length: Option<u64>,
        metadata_text: Option<&str>,
        cancel: &CancellationToken,
    ) -> StoreResult<()> {
        if let Some(length) = upload_length {
            Self::ensure_live(cancel)?;
            fs::write(self.length_path(id), length.to_string()).await?;
        }
        if let Some(text) = metadata_text {
            Self::ensure_live(cancel)?;
            fs::write(self.metadata_path(id), text).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl UploadStore for DiskStore {
    async fn create_file(
        &self,
        upload_length: Option<u64>,
        metadata: Option<&str>,
        cancel: &CancellationToken,
    ) -> StoreResult<UploadId> {
        Self::ensure_live(cancel)?;

        // Validate before touching disk so a malformed request creates
        // nothing. Empty metadata text means "no metadata record".
        let metadata_text = match metadata {
            Some(text) => UploadMetadata::parse(text)?.map(|_| text),
            None => None,
        };

        let id = UploadId::generate();
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.content_path(&id))
            .await?;

        if let Err(e) = self
            .write_side_records(&id, upload_length, metadata_text, cancel)
            .await
        {
            // Leave no half-initialized id behind.
            if let Err(cleanup) = self.remove_records(&id).await {
                warn!(id = %id, error = %cleanup, "failed to clean up partial upload");
            }
            return Err(e);
        }

        debug!(
            id = %id,
            upload_length = ?upload_length,
            has_metadata = metadata_text.is_some(),
            "upload created"
        );
        Ok(id)
    }

    async fn file_exists(&self, id: &UploadId, cancel: &CancellationToken) -> StoreResult<bool> {
        Self::ensure_live(cancel)?;
        Ok(fs::try_exists(self.content_path(id)).await?)
    }

    async fn upload_length(
        &self,
        id: &UploadId,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<u64>> {
        Self::ensure_live(cancel)?;
        self.read_upload_length(id).await
    }

    async fn upload_offset(&self, id: &UploadId, cancel: &CancellationToken) -> StoreResult<u64> {
        Self::ensure_live(cancel)?;
        self.content_size(id).await
    }

    async fn upload_metadata(
        &self,
        id: &UploadId,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<String>> {
        Self::ensure_live(cancel)?;
        match fs::read_to_string(self.metadata_path(id)).await {
            Ok(text) if text.is_empty() => Ok(None),
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_file(
        &self,
        id: &UploadId,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<UploadFile>> {
        Self::ensure_live(cancel)?;
        if !fs::try_exists(self.content_path(id)).await? {
            return Ok(None);
        }

        let metadata = match self.upload_metadata(id, cancel).await? {
            Some(text) => match UploadMetadata::parse(&text) {
                Ok(Some(map)) => map,
                Ok(None) => UploadMetadata::new(),
                Err(e) => {
                    debug!(id = %id, error = %e, "ignoring malformed metadata record");
                    UploadMetadata::new()
                }
            },
            None => UploadMetadata::new(),
        };

        Ok(Some(UploadFile::new(
            id.clone(),
            self.content_path(id),
            self.io_chunk_size,
            metadata,
        )))
    }

    async fn append_data(
        &self,
        id: &UploadId,
        mut data: DataStream,
        cancel: &CancellationToken,
    ) -> StoreResult<u64> {
        Self::ensure_live(cancel)?;

        let offset = self.content_size(id).await?;
        let upload_length = self.read_upload_length(id).await?;

        if upload_length == Some(offset) {
            // Already complete; accept the call but consume nothing.
            return Ok(0);
        }

        // Rollback point for a later checksum verification.
        self.record_chunk_start(id, offset);

        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(self.content_path(id))
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    StoreError::NotFound(id.clone())
                } else {
                    StoreError::Io(e)
                }
            })?;

        let mut total = offset;
        let mut written = 0u64;
        loop {
            let chunk = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(id = %id, written, "append cancelled mid-stream");
                    break;
                }
                item = data.next() => match item {
                    Some(chunk) => chunk?,
                    None => break,
                },
            };
            if chunk.is_empty() {
                continue;
            }

            if let Some(limit) = upload_length {
                if total + chunk.len() as u64 > limit {
                    // Reject before writing; no byte past the ceiling is
                    // ever persisted.
                    file.flush().await?;
                    return Err(StoreError::SizeExceeded {
                        stream_size: total + chunk.len() as u64,
                        upload_length: limit,
                    });
                }
            }

            file.write_all(&chunk).await?;
            total += chunk.len() as u64;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        debug!(id = %id, written, offset = total, "appended data");
        Ok(written)
    }

    async fn verify_checksum(
        &self,
        id: &UploadId,
        algorithm: &str,
        expected: &[u8],
        cancel: &CancellationToken,
    ) -> StoreResult<bool> {
        Self::ensure_live(cancel)?;

        let algorithm = ChecksumAlgorithm::parse(algorithm)
            .map_err(|_| StoreError::UnsupportedAlgorithm(algorithm.to_string()))?;

        let size = self.content_size(id).await?;
        // Without a tracked append the range is empty: there is nothing
        // this store instance may roll back.
        let chunk_start = self.chunk_start(id).unwrap_or(size).min(size);

        let mut file = fs::File::open(self.content_path(id)).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(id.clone())
            } else {
                StoreError::Io(e)
            }
        })?;
        file.seek(SeekFrom::Start(chunk_start)).await?;

        let mut digester = algorithm.digester();
        let mut remaining = size - chunk_start;
        let mut buf = vec![0u8; self.io_chunk_size];
        while remaining > 0 {
            Self::ensure_live(cancel)?;
            let want = buf.len().min(remaining as usize);
            let n = file.read(&mut buf[..want]).await?;
            if n == 0 {
                break;
            }
            digester.update(&buf[..n]);
            remaining -= n as u64;
        }
        drop(file);

        if digester.finalize() == expected {
            debug!(id = %id, algorithm = %algorithm, chunk_start, "checksum verified");
            return Ok(true);
        }

        // Roll the failed chunk back so the client can retry it.
        let content = fs::OpenOptions::new()
            .write(true)
            .open(self.content_path(id))
            .await?;
        content.set_len(chunk_start).await?;
        content.sync_all().await?;
        self.record_chunk_start(id, chunk_start);

        debug!(id = %id, algorithm = %algorithm, chunk_start, "checksum mismatch, chunk discarded");
        Ok(false)
    }

    async fn delete_file(&self, id: &UploadId, cancel: &CancellationToken) -> StoreResult<()> {
        Self::ensure_live(cancel)?;
        self.remove_records(id).await?;
        self.forget_chunk_start(id);
        debug!(id = %id, "upload deleted");
        Ok(())
    }

    fn supported_algorithms(&self) -> &'static [&'static str] {
        SUPPORTED_CHECKSUM_ALGORITHMS
    }

    async fn health_check(&self) -> StoreResult<()> {
        let metadata = fs::metadata(&self.root).await.map_err(|e| {
            StoreError::Io(std::io::Error::new(
                e.kind(),
                format!("store root not accessible: {e}"),
            ))
        })?;

        if !metadata.is_dir() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("store root is not a directory: {:?}", self.root),
            )));
        }

        Ok(())
    }
}
