//! Storage Root Lifecycle
//!
//! The storage root is a single flat directory. Every managed file sits
//! directly inside it as `<uuid><ext>`; nothing is ever scanned recursively.

use crate::error::{AppError, Result};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Prefix of in-progress ingestion files. Such entries are never reported
/// as stored files.
pub const INGEST_PREFIX: &str = ".ingest-";

/// One regular file found directly inside the storage root.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub name: String,
    pub path: PathBuf,
    pub metadata: Metadata,
}

impl StoredEntry {
    pub fn size(&self) -> u64 {
        self.metadata.len()
    }
}

/// Owns the storage directory path.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    dir: PathBuf,
}

impl StorageRoot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Create the root and any missing ancestors. Idempotent.
    pub async fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            AppError::io_error(
                format!("Failed to create storage directory: {}", e),
                Some(self.dir.clone()),
            )
        })
    }

    /// Remove the whole root recursively, then recreate it empty.
    ///
    /// Every previously issued managed path is dangling afterwards.
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(root = %self.dir.display(), "Storage directory already absent");
            }
            Err(e) => {
                return Err(AppError::io_error(
                    format!("Failed to remove storage directory: {}", e),
                    Some(self.dir.clone()),
                ));
            }
        }

        self.ensure().await?;
        info!(root = %self.dir.display(), "Storage directory cleared");
        Ok(())
    }

    /// Path of a direct child. `name` must be a single path component.
    pub fn entry_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Whether `name` can only refer to a direct child of the root.
    pub fn is_flat_name(name: &str) -> bool {
        !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains('/')
            && !name.contains('\\')
    }

    pub fn is_partial(name: &str) -> bool {
        name.starts_with(INGEST_PREFIX)
    }

    /// Flat listing of stored regular files, sorted by name.
    ///
    /// In-progress ingestion files and anything that is not a regular file
    /// are skipped. A missing root lists as empty.
    pub async fn list_entries(&self) -> Result<Vec<StoredEntry>> {
        let mut read_dir = match fs::read_dir(&self.dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(root = %self.dir.display(), "Storage directory missing, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(AppError::io_error(
                    format!("Failed to list storage directory: {}", e),
                    Some(self.dir.clone()),
                ));
            }
        };

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(|e| {
            AppError::io_error(
                format!("Failed to read storage directory entry: {}", e),
                Some(self.dir.clone()),
            )
        })? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if Self::is_partial(&name) {
                continue;
            }

            // entry vanished between readdir and stat
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(AppError::io_error(
                        format!("Failed to stat stored file: {}", e),
                        Some(entry.path()),
                    ));
                }
            };

            if !metadata.is_file() {
                continue;
            }

            entries.push(StoredEntry {
                name,
                path: entry.path(),
                metadata,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Total bytes of stored files. A missing root counts as empty.
    pub async fn storage_size(&self) -> Result<u64> {
        Ok(self.list_entries().await?.iter().map(StoredEntry::size).sum())
    }
}
