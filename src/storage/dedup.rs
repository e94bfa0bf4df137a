//! Duplicate Resolver
//!
//! Linear scan of the storage root with a size gate in front of hashing:
//! only entries whose size matches the candidate exactly are hashed. There is
//! no persisted size or digest index.

use crate::error::{AppError, Result};
use crate::models::{extname, FileRecord};
use crate::services::FileTypeClassifier;
use crate::storage::hasher::ContentHasher;
use crate::storage::root::{StorageRoot, StoredEntry};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// `count` value on records that resolved to an existing entry.
pub const DUPLICATE_COUNT: u32 = 2;

#[derive(Clone)]
pub struct DuplicateResolver {
    root: StorageRoot,
    hasher: ContentHasher,
    classifier: Arc<dyn FileTypeClassifier>,
}

impl DuplicateResolver {
    pub fn new(
        root: StorageRoot,
        hasher: ContentHasher,
        classifier: Arc<dyn FileTypeClassifier>,
    ) -> Self {
        Self {
            root,
            hasher,
            classifier,
        }
    }

    /// First stored entry (in name order) byte-identical to `candidate`.
    pub async fn find_duplicate(&self, candidate: &Path) -> Result<Option<FileRecord>> {
        self.find_duplicate_with_digest(candidate, None).await
    }

    /// Like [`find_duplicate`](Self::find_duplicate), reusing a candidate
    /// digest the caller already computed.
    pub async fn find_duplicate_with_digest(
        &self,
        candidate: &Path,
        candidate_digest: Option<String>,
    ) -> Result<Option<FileRecord>> {
        let candidate_meta = fs::metadata(candidate).await.map_err(|e| {
            AppError::io_error(
                format!("Failed to stat upload candidate: {}", e),
                Some(candidate.to_path_buf()),
            )
        })?;
        if !candidate_meta.is_file() {
            return Err(AppError::io_error(
                "Upload candidate is not a regular file",
                Some(candidate.to_path_buf()),
            ));
        }
        let size = candidate_meta.len();

        let entries = self.root.list_entries().await?;
        let mut candidate_digest = candidate_digest;

        for entry in entries.iter().filter(|e| e.size() == size) {
            let stored_digest = match candidate_digest {
                Some(_) => self.hash_stored(entry).await?,
                None => {
                    let (candidate_hash, stored_hash) = tokio::try_join!(
                        self.hasher.compute_hash_incremental(candidate),
                        self.hash_stored(entry),
                    )?;
                    candidate_digest = Some(candidate_hash);
                    stored_hash
                }
            };

            let Some(stored_digest) = stored_digest else {
                continue;
            };

            if candidate_digest.as_deref() == Some(stored_digest.as_str()) {
                debug!(
                    candidate = %candidate.display(),
                    stored = %entry.path.display(),
                    hash = %stored_digest,
                    "Duplicate content found"
                );
                return Ok(Some(self.duplicate_record(entry)));
            }

            debug!(
                candidate = %candidate.display(),
                stored = %entry.path.display(),
                size,
                "Size matched but content differs"
            );
        }

        Ok(None)
    }

    /// Digest of a stored entry, `None` if it was deleted since the listing.
    async fn hash_stored(&self, entry: &StoredEntry) -> Result<Option<String>> {
        let e = match self.hasher.compute_hash_incremental(&entry.path).await {
            Ok(digest) => return Ok(Some(digest)),
            Err(e) => e,
        };

        if let Ok(false) = fs::try_exists(&entry.path).await {
            debug!(stored = %entry.path.display(), "Stored entry vanished during scan");
            return Ok(None);
        }
        Err(e)
    }

    fn duplicate_record(&self, entry: &StoredEntry) -> FileRecord {
        let ext = extname(&entry.path);
        let id = entry.name[..entry.name.len() - ext.len()].to_string();
        let file_type = self.classifier.classify(&ext);

        FileRecord::from_metadata(
            id,
            entry.name.clone(),
            entry.name.clone(),
            entry.path.clone(),
            &entry.metadata,
            ext,
            file_type,
            DUPLICATE_COUNT,
        )
    }
}
