//! 文件存储管理器
//!
//! Content-addressed storage for a desktop app: files picked by the user are
//! copied into a private flat directory under fresh UUIDs, byte-identical
//! content is stored once, and stored entries can be read back as text or as
//! base64 images.
//!
//! ```no_run
//! use file_storage::models::StorageConfig;
//! use file_storage::storage::FileManager;
//! use std::path::Path;
//!
//! # async fn demo() -> file_storage::error::Result<()> {
//! let manager = FileManager::new(&StorageConfig::default()).await?;
//! let record = manager.upload(Path::new("/tmp/report.pdf")).await?;
//! assert_eq!(record.name, format!("{}{}", record.id, record.ext));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(feature = "standalone")]
pub mod commands;

pub use error::{AppError, Result};
pub use models::{AppConfig, AppConfigLoader, FileCategory, FileRecord, StorageConfig};
pub use storage::FileManager;
