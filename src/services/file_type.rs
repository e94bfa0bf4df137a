//! 文件类型分类器
//!
//! 将扩展名映射为 [`FileCategory`]。分类是全函数：任何输入（包括空字符串、
//! 不带点的扩展名、大小写混合）都会得到一个类别，未知扩展名归为 `Other`。

use crate::models::FileCategory;

/// Maps an extension (with or without the leading dot) to a category.
pub trait FileTypeClassifier: Send + Sync {
    fn classify(&self, ext: &str) -> FileCategory;
}

const IMAGE_EXTS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "ico", "tif", "tiff", "avif", "heic",
];

const VIDEO_EXTS: &[&str] = &[
    "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v", "mpeg", "mpg", "3gp",
];

const AUDIO_EXTS: &[&str] = &["mp3", "wav", "ogg", "flac", "aac", "m4a", "wma", "opus"];

const DOCUMENT_EXTS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "rtf", "epub",
];

const TEXT_EXTS: &[&str] = &[
    "txt", "md", "markdown", "log", "csv", "tsv", "json", "yaml", "yml", "toml", "xml", "html",
    "htm", "css", "js", "ts", "tsx", "jsx", "py", "rs", "go", "java", "c", "h", "cpp", "hpp",
    "sh", "ini", "conf", "sql",
];

/// Static extension table classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionClassifier;

impl ExtensionClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl FileTypeClassifier for ExtensionClassifier {
    fn classify(&self, ext: &str) -> FileCategory {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        if ext.is_empty() {
            return FileCategory::Other;
        }

        let table: [(&[&str], FileCategory); 5] = [
            (IMAGE_EXTS, FileCategory::Image),
            (VIDEO_EXTS, FileCategory::Video),
            (AUDIO_EXTS, FileCategory::Audio),
            (DOCUMENT_EXTS, FileCategory::Document),
            (TEXT_EXTS, FileCategory::Text),
        ];

        table
            .iter()
            .find(|(exts, _)| exts.contains(&ext.as_str()))
            .map(|(_, category)| *category)
            .unwrap_or(FileCategory::Other)
    }
}
