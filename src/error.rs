use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/**
 * 应用错误类型 - 使用 miette 提供用户友好的错误诊断
 *
 * 存储核心的所有失败都以此类型同步返回给直接调用者，内部从不重试。
 */
#[derive(Error, Debug, Diagnostic)]
pub enum AppError {
    #[error("IO error: {message}")]
    #[diagnostic(code(app::io_error_detailed))]
    IoDetailed {
        message: String,
        path: Option<PathBuf>,
    },

    #[error("Not found: {0}")]
    #[diagnostic(
        code(app::not_found),
        help("The file may have been deleted or the storage directory cleared")
    )]
    NotFound(String),

    #[error("Validation error: {0}")]
    #[diagnostic(
        code(app::validation_error),
        help("Check that your input meets the required format and constraints")
    )]
    Validation(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(app::config_error))]
    Config(String),

    #[error("Timeout error: {0}")]
    #[diagnostic(code(app::timeout_error))]
    Timeout(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(app::internal_error))]
    Internal(String),
}

impl AppError {
    /**
     * 创建详细的IO错误
     */
    pub fn io_error(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        AppError::IoDetailed {
            message: message.into(),
            path,
        }
    }

    /**
     * 创建未找到错误
     */
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    /**
     * 创建验证错误
     */
    pub fn validation_error(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /**
     * 创建配置错误
     */
    pub fn config_error(message: impl Into<String>) -> Self {
        AppError::Config(message.into())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Config(format!("invalid configuration: {}", errors))
    }
}

/**
 * 统一结果类型
 */
pub type Result<T> = std::result::Result<T, AppError>;

/**
 * 内部结果类型 - 启动流程使用 eyre 进行错误传播
 */
pub type EyreResult<T> = eyre::Result<T>;
