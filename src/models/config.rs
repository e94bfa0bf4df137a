//! 配置模型
//!
//! 使用行业标准的 `config` crate 实现分层配置：
//! - 默认值 → 配置文件 (TOML/JSON) → 环境变量
//! - 环境变量前缀：`FILE_STORAGE_`，层级分隔符 `__`
//!   (例如 `FILE_STORAGE_STORAGE__COPY_TIMEOUT_SECS=60`)

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

pub const ENV_PREFIX: &str = "FILE_STORAGE";

/// 全局配置根结构
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[serde(default)]
    #[validate(nested)]
    pub storage: StorageConfig,

    #[serde(default)]
    #[validate(nested)]
    pub logging: LoggingConfig,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StorageConfig {
    /// Base directory supplied by the app-paths resolver. Not created here.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Storage root relative to `data_dir`.
    #[serde(default = "default_files_subdir")]
    #[validate(length(min = 1, max = 500))]
    pub files_subdir: String,

    /// Process-scoped directory for `create_temp_path`.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    #[serde(default = "default_hash_buffer_size")]
    #[validate(range(min = 1024, max = 16777216))]
    pub hash_buffer_size: usize,

    #[serde(default = "default_copy_buffer_size")]
    #[validate(range(min = 1024, max = 16777216))]
    pub copy_buffer_size: usize,

    /// Upper bound on one ingestion copy. Unset means no limit.
    #[serde(default)]
    #[validate(range(min = 1, max = 86400))]
    pub copy_timeout_secs: Option<u64>,

    /// Hold a per-digest lock across resolve+copy so concurrent uploads of
    /// identical content share one identity.
    #[serde(default)]
    pub serialize_identical_uploads: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    #[validate(length(min = 1, max = 100))]
    pub level: String,

    #[serde(default)]
    pub json: bool,

    /// Daily-rolling log files are written here when set.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("file-storage")
}

fn default_files_subdir() -> String {
    "Data/Files".to_string()
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("FileStorage")
}

fn default_hash_buffer_size() -> usize {
    8 * 1024
}

fn default_copy_buffer_size() -> usize {
    64 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            files_subdir: default_files_subdir(),
            temp_dir: default_temp_dir(),
            hash_buffer_size: default_hash_buffer_size(),
            copy_buffer_size: default_copy_buffer_size(),
            copy_timeout_secs: None,
            serialize_identical_uploads: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            log_dir: None,
        }
    }
}

impl StorageConfig {
    /// Storage config rooted at `data_dir`, with the temp directory beside it.
    /// Used by tests and embedders that want an isolated tree.
    pub fn rooted_at(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            temp_dir: data_dir.join("temp"),
            data_dir,
            ..Default::default()
        }
    }

    pub fn storage_root(&self) -> PathBuf {
        self.data_dir.join(&self.files_subdir)
    }
}

impl AppConfig {
    pub fn storage_root(&self) -> PathBuf {
        self.storage.storage_root()
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::config_error(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::io_error(
                    format!("Failed to create config directory: {}", e),
                    Some(parent.to_path_buf()),
                )
            })?;
        }
        std::fs::write(path, content).map_err(|e| {
            AppError::io_error(
                format!("Failed to write config: {}", e),
                Some(path.to_path_buf()),
            )
        })
    }
}

/// 配置加载器
#[derive(Debug, Clone)]
pub struct AppConfigLoader {
    config: AppConfig,
    source: Option<PathBuf>,
}

impl AppConfigLoader {
    /// Load defaults, then the optional file, then `FILE_STORAGE_*` env vars.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = path.as_deref() {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        tracing::debug!(
            source = ?path,
            storage_root = %config.storage_root().display(),
            "Loaded configuration"
        );

        Ok(Self {
            config,
            source: path,
        })
    }

    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    pub fn into_config(self) -> AppConfig {
        self.config
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
