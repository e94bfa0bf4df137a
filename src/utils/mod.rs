//! 通用工具函数模块

pub mod logging;

pub use logging::init_logging;
