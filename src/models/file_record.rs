use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/**
 * 文件类别
 *
 * 由文件类型分类器根据扩展名得出，未知扩展名（包括空扩展名）归为 `Other`。
 */
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    Document,
    Text,
    Other,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Video => "video",
            FileCategory::Audio => "audio",
            FileCategory::Document => "document",
            FileCategory::Text => "text",
            FileCategory::Other => "other",
        }
    }
}

/**
 * 文件记录
 *
 * A value snapshot of one file. For managed entries `name == id + ext` and
 * `path == storage_root/name`; transient records (picker results, `get_file`)
 * point at arbitrary paths and carry a throwaway id.
 *
 * `count` is 1 for a fresh ingestion and 2 when an upload resolved to an
 * existing entry. It is not a reference count.
 */
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileRecord {
    pub id: String,
    pub origin_name: String,
    pub name: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub size: u64,
    pub ext: String,
    #[serde(rename = "type")]
    pub file_type: FileCategory,
    pub count: u32,
}

impl FileRecord {
    /// Build a record from already-fetched metadata.
    #[allow(clippy::too_many_arguments)]
    pub fn from_metadata(
        id: impl Into<String>,
        origin_name: impl Into<String>,
        name: impl Into<String>,
        path: PathBuf,
        metadata: &Metadata,
        ext: impl Into<String>,
        file_type: FileCategory,
        count: u32,
    ) -> Self {
        Self {
            id: id.into(),
            origin_name: origin_name.into(),
            name: name.into(),
            path,
            created_at: birth_time(metadata),
            size: metadata.len(),
            ext: ext.into(),
            file_type,
            count,
        }
    }

    /// Whether this record resolved to a pre-existing stored file.
    pub fn is_duplicate(&self) -> bool {
        self.count > 1
    }
}

/// Filesystem birth time, falling back to mtime where the platform or
/// filesystem does not record creation.
pub fn birth_time(metadata: &Metadata) -> DateTime<Utc> {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

/// Extension of the last path component including the leading dot.
///
/// Case is kept verbatim. A leading dot alone does not count as an
/// extension (`.bashrc` -> `""`), a trailing dot does (`a.` -> `"."`).
pub fn extname(path: &Path) -> String {
    let Some(file_name) = path.file_name() else {
        return String::new();
    };
    let file_name = file_name.to_string_lossy();
    match file_name.rfind('.') {
        Some(0) | None => String::new(),
        Some(idx) => file_name[idx..].to_string(),
    }
}

/// Last path component as a string, empty for paths like `/` or `..`.
pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
