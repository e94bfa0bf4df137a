//! Content Hasher
//!
//! SHA-256 over file content, streamed in bounded chunks so large files never
//! need to fit in memory. Identical bytes always give identical digests,
//! regardless of name, extension or timestamps.

use crate::error::{AppError, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncReadExt, BufReader};

pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct ContentHasher {
    buffer_size: usize,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl ContentHasher {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    /// Lowercase hex SHA-256 of an in-memory buffer.
    ///
    /// ```
    /// use file_storage::storage::ContentHasher;
    ///
    /// let hash = ContentHasher::compute_hash(b"hello world");
    /// assert_eq!(hash.len(), 64);
    /// ```
    pub fn compute_hash(content: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content);
        format!("{:x}", hasher.finalize())
    }

    /// Lowercase hex SHA-256 of a file, read `buffer_size` bytes at a time.
    ///
    /// # Errors
    ///
    /// Fails if the path cannot be opened, is not a regular file, or a read
    /// fails mid-stream. No partial digest is ever returned.
    pub async fn compute_hash_incremental(&self, file_path: &Path) -> Result<String> {
        let file = fs::File::open(file_path).await.map_err(|e| {
            AppError::io_error(
                format!("Failed to open file for hashing: {}", e),
                Some(file_path.to_path_buf()),
            )
        })?;

        let metadata = file.metadata().await.map_err(|e| {
            AppError::io_error(
                format!("Failed to stat file for hashing: {}", e),
                Some(file_path.to_path_buf()),
            )
        })?;
        if !metadata.is_file() {
            return Err(AppError::io_error(
                "Cannot hash a path that is not a regular file",
                Some(file_path.to_path_buf()),
            ));
        }

        let mut reader = BufReader::with_capacity(self.buffer_size, file);
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            let bytes_read = reader.read(&mut buffer).await.map_err(|e| {
                AppError::io_error(
                    format!("Failed to read file for hashing: {}", e),
                    Some(file_path.to_path_buf()),
                )
            })?;

            if bytes_read == 0 {
                break; // EOF
            }

            hasher.update(&buffer[..bytes_read]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }
}
