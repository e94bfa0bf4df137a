//! Retrieval & Encoding
//!
//! Reads, deletes and encodes managed entries by id, builds transient records
//! for arbitrary paths, and hands out collision-free temp paths outside the
//! storage root.
//!
//! An id is either the bare UUID or the stored name `<uuid><ext>`.

use crate::error::{AppError, Result};
use crate::models::{basename, extname, EncodedImage, FileCategory, FileRecord};
use crate::services::FileTypeClassifier;
use crate::storage::root::StorageRoot;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

pub const TEMP_FILE_PREFIX: &str = "temp_file_";

#[derive(Clone)]
pub struct Retrieval {
    root: StorageRoot,
    temp_dir: PathBuf,
    classifier: Arc<dyn FileTypeClassifier>,
}

impl Retrieval {
    pub fn new(
        root: StorageRoot,
        temp_dir: impl Into<PathBuf>,
        classifier: Arc<dyn FileTypeClassifier>,
    ) -> Self {
        Self {
            root,
            temp_dir: temp_dir.into(),
            classifier,
        }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Transient record for any path, `None` if nothing exists there.
    pub async fn get_file(&self, path: &Path) -> Result<Option<FileRecord>> {
        let e = match fs::metadata(path).await {
            Ok(metadata) => return Ok(Some(self.transient_record(path, &metadata))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => e,
        };

        if blocked_by_file(path).await {
            debug!(path = %path.display(), error = %e, "Path runs through a regular file");
            return Ok(None);
        }

        Err(AppError::io_error(
            format!("Failed to stat file: {}", e),
            Some(path.to_path_buf()),
        ))
    }

    /// Transient record for a path that must exist.
    pub async fn stat_file(&self, path: &Path) -> Result<FileRecord> {
        let metadata = fs::metadata(path).await.map_err(|e| {
            AppError::io_error(
                format!("Failed to stat selected file: {}", e),
                Some(path.to_path_buf()),
            )
        })?;
        Ok(self.transient_record(path, &metadata))
    }

    fn transient_record(&self, path: &Path, metadata: &std::fs::Metadata) -> FileRecord {
        let name = basename(path);
        let ext = extname(path);
        let file_type = self.classifier.classify(&ext);
        FileRecord::from_metadata(
            Uuid::new_v4().to_string(),
            name.clone(),
            name,
            path.to_path_buf(),
            metadata,
            ext,
            file_type,
            1,
        )
    }

    /// Backing path of a managed entry.
    ///
    /// Exact stored names hit directly; bare ids are matched against the
    /// file stem of each entry in the root.
    pub async fn resolve(&self, id: &str) -> Result<PathBuf> {
        if !StorageRoot::is_flat_name(id) || StorageRoot::is_partial(id) {
            return Err(AppError::not_found(format!("No stored file for id: {}", id)));
        }

        let direct = self.root.entry_path(id);
        if fs::metadata(&direct)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            return Ok(direct);
        }

        self.root
            .list_entries()
            .await?
            .into_iter()
            .find(|entry| {
                let ext = extname(&entry.path);
                entry.name.len() > ext.len() && entry.name[..entry.name.len() - ext.len()] == *id
            })
            .map(|entry| entry.path)
            .ok_or_else(|| AppError::not_found(format!("No stored file for id: {}", id)))
    }

    pub async fn read_bytes(&self, id: &str) -> Result<Vec<u8>> {
        let path = self.resolve(id).await?;
        Self::read_resolved(id, path).await
    }

    async fn read_resolved(id: &str, path: PathBuf) -> Result<Vec<u8>> {
        fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("No stored file for id: {}", id))
            } else {
                AppError::io_error(format!("Failed to read stored file: {}", e), Some(path))
            }
        })
    }

    /// Stored content as text. Invalid UTF-8 sequences become U+FFFD.
    pub async fn read_text(&self, id: &str) -> Result<String> {
        let bytes = self.read_bytes(id).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn delete_file(&self, id: &str) -> Result<()> {
        let path = self.resolve(id).await?;
        fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("No stored file for id: {}", id))
            } else {
                AppError::io_error(format!("Failed to delete stored file: {}", e), Some(path.clone()))
            }
        })?;

        info!(id = %id, path = %path.display(), "Deleted stored file");
        Ok(())
    }

    /// Base64 and `data:` URI form of a stored image.
    ///
    /// Only valid for entries whose extension classifies as an image; other
    /// categories are rejected rather than mis-typed. The MIME type comes from
    /// the extension, falling back to `image/<ext>`.
    pub async fn base64_image(&self, id: &str) -> Result<EncodedImage> {
        let path = self.resolve(id).await?;
        let ext = extname(&path);
        let category = self.classifier.classify(&ext);
        if category != FileCategory::Image {
            return Err(AppError::validation_error(format!(
                "base64 encoding requires an image, got {} ({})",
                category.as_str(),
                if ext.is_empty() { "no extension" } else { ext.as_str() }
            )));
        }

        let bytes = Self::read_resolved(id, path).await?;
        let mime = image_mime(&ext);
        debug!(id = %id, mime = %mime, size = bytes.len(), "Encoding stored image");

        Ok(EncodedImage::new(mime, STANDARD.encode(bytes)))
    }

    /// Reserve a unique path in the temp directory. The file itself is not
    /// created; the directory is.
    pub async fn create_temp_path(&self, name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.temp_dir).await.map_err(|e| {
            AppError::io_error(
                format!("Failed to create temp directory: {}", e),
                Some(self.temp_dir.clone()),
            )
        })?;

        let name = sanitize_filename::sanitize(name);
        Ok(self
            .temp_dir
            .join(format!("{}{}_{}", TEMP_FILE_PREFIX, Uuid::new_v4(), name)))
    }

    /// Create or overwrite `path` with `data`.
    pub async fn write_file(&self, path: &Path, data: impl AsRef<[u8]>) -> Result<()> {
        fs::write(path, data.as_ref()).await.map_err(|e| {
            AppError::io_error(
                format!("Failed to write file: {}", e),
                Some(path.to_path_buf()),
            )
        })
    }
}

/// Whether some ancestor of `path` is a regular file, so `path` cannot exist.
async fn blocked_by_file(path: &Path) -> bool {
    for ancestor in path.ancestors().skip(1) {
        if let Ok(metadata) = fs::metadata(ancestor).await {
            return !metadata.is_dir();
        }
    }
    false
}

fn image_mime(ext: &str) -> String {
    let subtype = ext.trim_start_matches('.').to_ascii_lowercase();
    mime_guess::from_ext(&subtype)
        .iter()
        .find(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| format!("image/{}", subtype))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ExtensionClassifier;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, StorageRoot, Retrieval) {
        let temp_dir = TempDir::new().unwrap();
        let root = StorageRoot::new(temp_dir.path().join("Files"));
        root.ensure().await.unwrap();
        let retrieval = Retrieval::new(
            root.clone(),
            temp_dir.path().join("temp"),
            Arc::new(ExtensionClassifier::new()),
        );
        (temp_dir, root, retrieval)
    }

    #[tokio::test]
    async fn test_get_file_nonexistent_is_none() {
        let (_temp_dir, _root, retrieval) = setup().await;
        let record = retrieval
            .get_file(Path::new("/nonexistent/x.png"))
            .await
            .unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_get_file_under_regular_file_is_none() {
        let (temp_dir, _root, retrieval) = setup().await;
        let plain = temp_dir.path().join("plain.txt");
        fs::write(&plain, b"not a directory").await.unwrap();

        let record = retrieval.get_file(&plain.join("x.png")).await.unwrap();
        assert!(record.is_none());

        let deeper = retrieval
            .get_file(&plain.join("nested").join("y.png"))
            .await
            .unwrap();
        assert!(deeper.is_none());
    }

    #[tokio::test]
    async fn test_get_file_builds_transient_record() {
        let (temp_dir, _root, retrieval) = setup().await;
        let path = temp_dir.path().join("notes.md");
        fs::write(&path, b"# hi").await.unwrap();

        let record = retrieval.get_file(&path).await.unwrap().unwrap();
        assert_eq!(record.name, "notes.md");
        assert_eq!(record.origin_name, "notes.md");
        assert_eq!(record.path, path);
        assert_eq!(record.size, 4);
        assert_eq!(record.file_type, FileCategory::Text);
        assert_eq!(record.count, 1);
    }

    #[tokio::test]
    async fn test_resolve_by_stem_and_by_name() {
        let (_temp_dir, root, retrieval) = setup().await;
        fs::write(root.entry_path("abc-123.txt"), b"text").await.unwrap();

        assert_eq!(retrieval.read_text("abc-123").await.unwrap(), "text");
        assert_eq!(retrieval.read_text("abc-123.txt").await.unwrap(), "text");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let (_temp_dir, _root, retrieval) = setup().await;
        let result = retrieval.read_text("missing").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_path_escape_is_not_found() {
        let (_temp_dir, _root, retrieval) = setup().await;
        let result = retrieval.read_bytes("../temp").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_read_text_replaces_invalid_utf8() {
        let (_temp_dir, root, retrieval) = setup().await;
        fs::write(root.entry_path("latin1.txt"), b"caf\xe9")
            .await
            .unwrap();

        let text = retrieval.read_text("latin1").await.unwrap();
        assert_eq!(text, "caf\u{FFFD}");
    }

    #[tokio::test]
    async fn test_delete_then_delete_again() {
        let (_temp_dir, root, retrieval) = setup().await;
        fs::write(root.entry_path("gone.txt"), b"x").await.unwrap();

        retrieval.delete_file("gone").await.unwrap();
        assert!(!root.entry_path("gone.txt").exists());

        let again = retrieval.delete_file("gone").await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_base64_image() {
        let (_temp_dir, root, retrieval) = setup().await;
        let bytes = [0x89, b'P', b'N', b'G', 0x0d, 0x0a];
        fs::write(root.entry_path("img.png"), bytes).await.unwrap();

        let encoded = retrieval.base64_image("img").await.unwrap();
        assert_eq!(encoded.mime, "image/png");
        assert_eq!(STANDARD.decode(&encoded.base64).unwrap(), bytes);
        assert_eq!(
            encoded.data,
            format!("data:image/png;base64,{}", encoded.base64)
        );
    }

    #[tokio::test]
    async fn test_base64_rejects_non_image() {
        let (_temp_dir, root, retrieval) = setup().await;
        fs::write(root.entry_path("doc.pdf"), b"%PDF").await.unwrap();

        let result = retrieval.base64_image("doc").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_image_mime() {
        assert_eq!(image_mime(".PNG"), "image/png");
        assert_eq!(image_mime(".jpg"), "image/jpeg");
        assert_eq!(image_mime(".svg"), "image/svg+xml");
    }

    #[tokio::test]
    async fn test_create_temp_path_is_unique_and_not_created() {
        let (temp_dir, root, retrieval) = setup().await;

        let a = retrieval.create_temp_path("out.txt").await.unwrap();
        let b = retrieval.create_temp_path("out.txt").await.unwrap();

        assert_ne!(a, b);
        assert!(!a.exists());
        assert!(a.parent().unwrap().is_dir());
        assert!(a.starts_with(temp_dir.path().join("temp")));
        assert!(!a.starts_with(root.path()));
        let file_name = a.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file_name.starts_with(TEMP_FILE_PREFIX));
        assert!(file_name.ends_with("_out.txt"));
    }

    #[tokio::test]
    async fn test_create_temp_path_sanitizes_name() {
        let (temp_dir, _root, retrieval) = setup().await;
        let path = retrieval.create_temp_path("../../etc/passwd").await.unwrap();
        assert_eq!(path.parent().unwrap(), temp_dir.path().join("temp"));
    }

    #[tokio::test]
    async fn test_write_file_overwrites() {
        let (temp_dir, _root, retrieval) = setup().await;
        let path = temp_dir.path().join("w.txt");

        retrieval.write_file(&path, "first").await.unwrap();
        retrieval.write_file(&path, b"second").await.unwrap();

        assert_eq!(fs::read_to_string(&path).await.unwrap(), "second");
    }
}
