//! Tauri 命令层
//!
//! 前端通过 `invoke` 调用的文件存储命令。

pub mod files;
