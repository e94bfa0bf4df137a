//! 日志初始化
//!
//! `RUST_LOG` takes precedence over the configured level when set.

use crate::error::{AppError, Result};
use crate::models::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "file-storage.log";

/// Install the global subscriber.
///
/// Returns the file writer guard when `log_dir` is set; dropping it flushes
/// and stops the background writer, so keep it alive for the whole process.
/// Calling this again after a subscriber is installed is a no-op.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| AppError::config_error(format!("Invalid log level '{}': {}", config.level, e)))?;

    let console = if config.json {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    };

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                AppError::io_error(
                    format!("Failed to create log directory: {}", e),
                    Some(dir.clone()),
                )
            })?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    if tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global subscriber already installed, keeping it");
        return Ok(None);
    }

    tracing::info!(
        level = %config.level,
        json = config.json,
        log_dir = ?config.log_dir,
        "Logging initialized"
    );
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_logging_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let config = LoggingConfig {
            level: "debug".to_string(),
            json: false,
            log_dir: Some(temp_dir.path().join("logs")),
        };

        let first = init_logging(&config);
        assert!(first.is_ok());
        assert!(init_logging(&config).unwrap().is_none());
        assert!(temp_dir.path().join("logs").is_dir());
    }

    #[test]
    fn test_invalid_level_is_config_error() {
        let config = LoggingConfig {
            level: "storage=loud".to_string(),
            ..Default::default()
        };

        // RUST_LOG would mask the configured level
        if std::env::var("RUST_LOG").is_err() {
            assert!(matches!(init_logging(&config), Err(AppError::Config(_))));
        }
    }
}
