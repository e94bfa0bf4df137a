//! 应用路径解析
//!
//! 提供存储根目录和临时目录所在的基础目录。核心不创建也不管理基础目录本身。

use crate::error::Result;
use crate::models::StorageConfig;
use std::path::PathBuf;

pub trait AppPaths: Send + Sync {
    /// Base directory the storage root lives under.
    fn data_dir(&self) -> Result<PathBuf>;

    /// Directory for process-scoped temp files.
    fn temp_dir(&self) -> Result<PathBuf>;
}

/// Paths taken verbatim from configuration.
#[derive(Debug, Clone)]
pub struct ConfiguredPaths {
    data_dir: PathBuf,
    temp_dir: PathBuf,
}

impl ConfiguredPaths {
    pub fn new(data_dir: impl Into<PathBuf>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            temp_dir: temp_dir.into(),
        }
    }
}

impl From<&StorageConfig> for ConfiguredPaths {
    fn from(config: &StorageConfig) -> Self {
        Self::new(config.data_dir.clone(), config.temp_dir.clone())
    }
}

impl AppPaths for ConfiguredPaths {
    fn data_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir.clone())
    }

    fn temp_dir(&self) -> Result<PathBuf> {
        Ok(self.temp_dir.clone())
    }
}

/// Overwrite the config's base directories with the resolver's answers.
pub fn apply_app_paths(config: &mut StorageConfig, paths: &dyn AppPaths) -> Result<()> {
    config.data_dir = paths.data_dir()?;
    config.temp_dir = paths.temp_dir()?;
    Ok(())
}

#[cfg(feature = "standalone")]
pub use tauri_paths::TauriPaths;

#[cfg(feature = "standalone")]
mod tauri_paths {
    use super::*;
    use crate::error::AppError;
    use tauri::Manager;

    /// Resolves through the Tauri path API (`app_data_dir`, `temp_dir`).
    pub struct TauriPaths<R: tauri::Runtime> {
        app: tauri::AppHandle<R>,
    }

    impl<R: tauri::Runtime> TauriPaths<R> {
        pub fn new(app: tauri::AppHandle<R>) -> Self {
            Self { app }
        }
    }

    impl<R: tauri::Runtime> AppPaths for TauriPaths<R> {
        fn data_dir(&self) -> Result<PathBuf> {
            self.app
                .path()
                .app_data_dir()
                .map_err(|e| AppError::config_error(format!("Failed to get app data dir: {}", e)))
        }

        fn temp_dir(&self) -> Result<PathBuf> {
            self.app
                .path()
                .temp_dir()
                .map(|dir| dir.join("FileStorage"))
                .map_err(|e| AppError::config_error(format!("Failed to get temp dir: {}", e)))
        }
    }
}
