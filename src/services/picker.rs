//! 文件选择器
//!
//! 原生文件选择对话框被视为外部依赖：核心只关心它返回的绝对路径列表，
//! 取消和空选择都被视为 `None`。

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Extension filter shown in the dialog, e.g. `Images: png, jpg`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

/// Caller options merged over the defaults (single file, no filters).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickOptions {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub filters: Vec<PickFilter>,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub default_path: Option<PathBuf>,
}

impl PickOptions {
    pub fn multiple() -> Self {
        Self {
            multiple: true,
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, name: impl Into<String>, extensions: &[&str]) -> Self {
        self.filters.push(PickFilter {
            name: name.into(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        });
        self
    }
}

#[async_trait]
pub trait FilePicker: Send + Sync {
    /// Returns `None` when the user cancels.
    async fn pick(&self, options: &PickOptions) -> Result<Option<Vec<PathBuf>>>;
}

/// Picker with a fixed answer, for headless runs where no dialog can be shown.
#[derive(Debug, Clone, Default)]
pub struct PresetPicker {
    selection: Option<Vec<PathBuf>>,
}

impl PresetPicker {
    pub fn new(selection: Option<Vec<PathBuf>>) -> Self {
        Self { selection }
    }

    /// A picker that always reports cancellation.
    pub fn cancelled() -> Self {
        Self { selection: None }
    }
}

#[async_trait]
impl FilePicker for PresetPicker {
    async fn pick(&self, options: &PickOptions) -> Result<Option<Vec<PathBuf>>> {
        Ok(self.selection.as_ref().map(|paths| {
            if options.multiple {
                paths.clone()
            } else {
                paths.iter().take(1).cloned().collect()
            }
        }))
    }
}

#[cfg(feature = "standalone")]
pub use dialog::DialogPicker;

#[cfg(feature = "standalone")]
mod dialog {
    use super::*;
    use crate::error::AppError;
    use tauri_plugin_dialog::DialogExt;

    /// Native dialog via `tauri-plugin-dialog`.
    pub struct DialogPicker<R: tauri::Runtime> {
        app: tauri::AppHandle<R>,
    }

    impl<R: tauri::Runtime> DialogPicker<R> {
        pub fn new(app: tauri::AppHandle<R>) -> Self {
            Self { app }
        }
    }

    #[async_trait]
    impl<R: tauri::Runtime> FilePicker for DialogPicker<R> {
        async fn pick(&self, options: &PickOptions) -> Result<Option<Vec<PathBuf>>> {
            let mut builder = self.app.dialog().file();
            if let Some(title) = &options.title {
                builder = builder.set_title(title.clone());
            }
            for filter in &options.filters {
                let extensions: Vec<&str> = filter.extensions.iter().map(String::as_str).collect();
                builder = builder.add_filter(filter.name.clone(), &extensions);
            }
            if let Some(dir) = &options.default_path {
                builder = builder.set_directory(dir);
            }

            // blocking_* 会阻塞当前线程直到对话框关闭
            let multiple = options.multiple;
            let picked = tokio::task::spawn_blocking(move || {
                if multiple {
                    builder.blocking_pick_files()
                } else {
                    builder.blocking_pick_file().map(|file| vec![file])
                }
            })
            .await
            .map_err(|e| AppError::Internal(format!("File dialog task panicked: {}", e)))?;

            Ok(picked.map(|files| {
                files
                    .into_iter()
                    .filter_map(|file| file.into_path().ok())
                    .collect()
            }))
        }
    }
}
