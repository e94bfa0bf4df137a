pub mod config;
pub mod encoded;
pub mod file_record;

// 重新导出核心类型
pub use config::{AppConfig, AppConfigLoader, LoggingConfig, StorageConfig};
pub use encoded::{EncodedImage, FileContent};
pub use file_record::{basename, birth_time, extname, FileCategory, FileRecord};
