//! 外部协作者
//!
//! 文件类型分类、文件选择对话框和应用目录解析。核心存储只通过这些 trait
//! 与宿主环境交互。

pub mod app_paths;
pub mod file_type;
pub mod picker;

pub use app_paths::{apply_app_paths, AppPaths, ConfiguredPaths};
pub use file_type::{ExtensionClassifier, FileTypeClassifier};
pub use picker::{FilePicker, PickFilter, PickOptions, PresetPicker};

#[cfg(feature = "standalone")]
pub use app_paths::TauriPaths;
#[cfg(feature = "standalone")]
pub use picker::DialogPicker;
