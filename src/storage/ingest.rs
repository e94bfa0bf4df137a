//! Ingestion Pipeline
//!
//! `upload` first asks the [`DuplicateResolver`]; on a hit the existing
//! record is returned and nothing is copied. On a miss a fresh UUID is minted
//! and the source is copied into the root as `<uuid><ext>`.
//!
//! The copy lands in `.ingest-<uuid>.part` first, is flushed, synced and size
//! checked, then renamed into place. The partial file is removed on every
//! failure path, so a returned record never points at a half-written file.

use crate::error::{AppError, Result};
use crate::models::{basename, extname, FileRecord};
use crate::services::FileTypeClassifier;
use crate::storage::dedup::DuplicateResolver;
use crate::storage::hasher::ContentHasher;
use crate::storage::root::{StorageRoot, INGEST_PREFIX};
use dashmap::DashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Per-digest locks for uploads currently in flight.
type InFlightUploads = DashMap<String, Arc<Mutex<()>>>;

#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    pub copy_buffer_size: usize,
    /// `None` lets a copy run as long as the filesystem needs.
    pub copy_timeout: Option<Duration>,
    pub serialize_identical_uploads: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            copy_buffer_size: 64 * 1024,
            copy_timeout: None,
            serialize_identical_uploads: false,
        }
    }
}

pub struct IngestionPipeline {
    root: StorageRoot,
    hasher: ContentHasher,
    resolver: DuplicateResolver,
    classifier: Arc<dyn FileTypeClassifier>,
    options: IngestOptions,
    in_flight: InFlightUploads,
}

impl IngestionPipeline {
    pub fn new(
        root: StorageRoot,
        hasher: ContentHasher,
        classifier: Arc<dyn FileTypeClassifier>,
        options: IngestOptions,
    ) -> Self {
        let resolver = DuplicateResolver::new(root.clone(), hasher, classifier.clone());
        Self {
            root,
            hasher,
            resolver,
            classifier,
            options,
            in_flight: DashMap::new(),
        }
    }

    pub fn resolver(&self) -> &DuplicateResolver {
        &self.resolver
    }

    /// Store `source` under a new identity, or return the existing record
    /// when byte-identical content is already stored.
    pub async fn upload(&self, source: &Path) -> Result<FileRecord> {
        if !self.options.serialize_identical_uploads {
            return self.upload_resolved(source, None).await;
        }

        let digest = self.hasher.compute_hash_incremental(source).await?;
        let lock = self
            .in_flight
            .entry(digest.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = lock.lock().await;
            self.upload_resolved(source, Some(digest.clone())).await
        };

        drop(lock);
        self.in_flight
            .remove_if(&digest, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    async fn upload_resolved(&self, source: &Path, digest: Option<String>) -> Result<FileRecord> {
        if let Some(duplicate) = self
            .resolver
            .find_duplicate_with_digest(source, digest)
            .await?
        {
            info!(
                source = %source.display(),
                id = %duplicate.id,
                "Upload resolved to existing file (deduplication)"
            );
            return Ok(duplicate);
        }

        let id = Uuid::new_v4().to_string();
        let origin_name = basename(source);
        let ext = extname(Path::new(&origin_name));
        let name = format!("{}{}", id, ext);
        let dest = self.root.entry_path(&name);

        self.copy_into_root(source, &id, &dest).await?;

        let metadata = match fs::metadata(&dest).await {
            Ok(metadata) => metadata,
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&dest).await {
                    warn!(
                        dest = %dest.display(),
                        error = %cleanup,
                        "Failed to remove unreadable upload"
                    );
                }
                return Err(AppError::io_error(
                    format!("Failed to stat stored file: {}", e),
                    Some(dest),
                ));
            }
        };

        let file_type = self.classifier.classify(&ext);
        let record =
            FileRecord::from_metadata(id, origin_name, name, dest, &metadata, ext, file_type, 1);

        info!(
            id = %record.id,
            size = record.size,
            path = %record.path.display(),
            source = %source.display(),
            "Stored file"
        );

        Ok(record)
    }

    /// Copy `source` to a partial file, verify its size, rename onto `dest`.
    async fn copy_into_root(&self, source: &Path, id: &str, dest: &Path) -> Result<()> {
        let partial = self
            .root
            .entry_path(&format!("{}{}.part", INGEST_PREFIX, id));

        let mut src_file = fs::File::open(source).await.map_err(|e| {
            AppError::io_error(
                format!("Failed to open source file: {}", e),
                Some(source.to_path_buf()),
            )
        })?;
        let expected = src_file
            .metadata()
            .await
            .map_err(|e| {
                AppError::io_error(
                    format!("Failed to stat source file: {}", e),
                    Some(source.to_path_buf()),
                )
            })?
            .len();

        // declared before the target handle so the handle closes first
        let cleanup = scopeguard::guard(partial.clone(), |partial| {
            if let Err(e) = std::fs::remove_file(&partial) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(
                        partial = %partial.display(),
                        error = %e,
                        "Failed to clean up partial upload"
                    );
                }
            }
        });

        let mut dst_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&partial)
            .await
            .map_err(|e| {
                AppError::io_error(
                    format!("Failed to create target file: {}", e),
                    Some(partial.clone()),
                )
            })?;

        let copy = self.stream_copy(&mut src_file, &mut dst_file, source, &partial);
        let copied = match self.options.copy_timeout {
            Some(limit) => match tokio::time::timeout(limit, copy).await {
                Ok(copied) => copied,
                Err(_) => {
                    error!(
                        source = %source.display(),
                        timeout_ms = limit.as_millis() as u64,
                        "File copy timed out"
                    );
                    return Err(AppError::Timeout(format!(
                        "File copy timeout after {:?}",
                        limit
                    )));
                }
            },
            None => copy.await,
        };

        let written = match copied {
            Ok(written) => written,
            Err(e) => {
                error!(
                    source = %source.display(),
                    target = %partial.display(),
                    error = %e,
                    "File copy failed"
                );
                return Err(e);
            }
        };
        drop(dst_file);

        if expected != written {
            return Err(AppError::io_error(
                format!(
                    "Source changed during copy: expected {} bytes, wrote {}",
                    expected, written
                ),
                Some(source.to_path_buf()),
            ));
        }

        fs::rename(&partial, dest).await.map_err(|e| {
            AppError::io_error(
                format!("Failed to move upload into place: {}", e),
                Some(dest.to_path_buf()),
            )
        })?;

        // renamed, nothing left to clean up
        let _ = scopeguard::ScopeGuard::into_inner(cleanup);

        debug!(
            source = %source.display(),
            target = %dest.display(),
            bytes = written,
            "File copied successfully"
        );
        Ok(())
    }

    /// Stream `src_file` into `dst_file`, then flush and sync. Returns bytes written.
    async fn stream_copy(
        &self,
        src_file: &mut fs::File,
        dst_file: &mut fs::File,
        source: &Path,
        partial: &Path,
    ) -> Result<u64> {
        let mut buffer = vec![0u8; self.options.copy_buffer_size.max(1)];
        let mut written = 0u64;

        loop {
            let bytes_read = src_file.read(&mut buffer).await.map_err(|e| {
                AppError::io_error(
                    format!("Failed to read from source file: {}", e),
                    Some(source.to_path_buf()),
                )
            })?;

            if bytes_read == 0 {
                break; // EOF
            }

            dst_file
                .write_all(&buffer[..bytes_read])
                .await
                .map_err(|e| {
                    AppError::io_error(
                        format!("Failed to write to target file: {}", e),
                        Some(partial.to_path_buf()),
                    )
                })?;

            written += bytes_read as u64;
        }

        dst_file.flush().await.map_err(|e| {
            AppError::io_error(
                format!("Failed to flush target file: {}", e),
                Some(partial.to_path_buf()),
            )
        })?;
        dst_file.sync_all().await.map_err(|e| {
            AppError::io_error(
                format!("Failed to sync target file: {}", e),
                Some(partial.to_path_buf()),
            )
        })?;

        Ok(written)
    }
}
