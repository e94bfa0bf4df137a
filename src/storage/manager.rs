//! 文件管理器门面
//!
//! Wires the storage root, ingestion pipeline and retrieval together behind
//! one handle that the command layer shares through `Arc`.
//!
//! Every operation holds the root lock for reading; `clear` takes it for
//! writing so a wipe never interleaves with an upload or a read.

use crate::error::Result;
use crate::models::{EncodedImage, FileRecord, StorageConfig};
use crate::services::{ExtensionClassifier, FilePicker, FileTypeClassifier, PickOptions, PresetPicker};
use crate::storage::hasher::ContentHasher;
use crate::storage::ingest::{IngestOptions, IngestionPipeline};
use crate::storage::retrieval::Retrieval;
use crate::storage::root::StorageRoot;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

pub struct FileManager {
    root: StorageRoot,
    hasher: ContentHasher,
    retrieval: Retrieval,
    pipeline: IngestionPipeline,
    picker: Arc<dyn FilePicker>,
    lock: RwLock<()>,
}

impl FileManager {
    /// Manager with the default classifier and no dialog attached.
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        Self::with_collaborators(
            config,
            Arc::new(ExtensionClassifier::new()),
            Arc::new(PresetPicker::cancelled()),
        )
        .await
    }

    /// Build the manager and make sure the storage root exists.
    pub async fn with_collaborators(
        config: &StorageConfig,
        classifier: Arc<dyn FileTypeClassifier>,
        picker: Arc<dyn FilePicker>,
    ) -> Result<Self> {
        let root = StorageRoot::new(config.storage_root());
        root.ensure().await?;

        let hasher = ContentHasher::new(config.hash_buffer_size);
        let options = IngestOptions {
            copy_buffer_size: config.copy_buffer_size,
            copy_timeout: config.copy_timeout_secs.map(Duration::from_secs),
            serialize_identical_uploads: config.serialize_identical_uploads,
        };
        let pipeline = IngestionPipeline::new(root.clone(), hasher, classifier.clone(), options);
        let retrieval = Retrieval::new(root.clone(), config.temp_dir.clone(), classifier);

        info!(
            root = %root.path().display(),
            temp_dir = %config.temp_dir.display(),
            serialize_identical_uploads = config.serialize_identical_uploads,
            "File manager initialized"
        );

        Ok(Self {
            root,
            hasher,
            retrieval,
            pipeline,
            picker,
            lock: RwLock::new(()),
        })
    }

    pub fn storage_root(&self) -> &Path {
        self.root.path()
    }

    pub fn temp_dir(&self) -> &Path {
        self.retrieval.temp_dir()
    }

    pub async fn find_duplicate(&self, candidate: &Path) -> Result<Option<FileRecord>> {
        let _guard = self.lock.read().await;
        self.pipeline.resolver().find_duplicate(candidate).await
    }

    /// Show the picker and describe whatever was chosen. Nothing is stored.
    ///
    /// Cancellation and an empty selection both come back as `None`.
    pub async fn select_file(&self, options: PickOptions) -> Result<Option<Vec<FileRecord>>> {
        let paths = match self.picker.pick(&options).await? {
            Some(paths) if !paths.is_empty() => paths,
            _ => {
                debug!("File selection cancelled");
                return Ok(None);
            }
        };

        let records = futures::future::try_join_all(
            paths.iter().map(|path| self.retrieval.stat_file(path)),
        )
        .await?;

        debug!(count = records.len(), "Files selected");
        Ok(Some(records))
    }

    /// Ingest the file at `source`, deduplicating against the root.
    pub async fn upload(&self, source: &Path) -> Result<FileRecord> {
        let _guard = self.lock.read().await;
        self.pipeline.upload(source).await
    }

    /// Ingest a record previously returned by [`select_file`](Self::select_file).
    pub async fn upload_file(&self, record: &FileRecord) -> Result<FileRecord> {
        self.upload(&record.path).await
    }

    pub async fn get_file(&self, path: &Path) -> Result<Option<FileRecord>> {
        let _guard = self.lock.read().await;
        self.retrieval.get_file(path).await
    }

    pub async fn read_text(&self, id: &str) -> Result<String> {
        let _guard = self.lock.read().await;
        self.retrieval.read_text(id).await
    }

    pub async fn read_bytes(&self, id: &str) -> Result<Vec<u8>> {
        let _guard = self.lock.read().await;
        self.retrieval.read_bytes(id).await
    }

    pub async fn delete_file(&self, id: &str) -> Result<()> {
        let _guard = self.lock.read().await;
        self.retrieval.delete_file(id).await
    }

    pub async fn base64_image(&self, id: &str) -> Result<EncodedImage> {
        let _guard = self.lock.read().await;
        self.retrieval.base64_image(id).await
    }

    pub async fn create_temp_path(&self, name: &str) -> Result<PathBuf> {
        self.retrieval.create_temp_path(name).await
    }

    pub async fn write_file(&self, path: &Path, data: impl AsRef<[u8]>) -> Result<()> {
        self.retrieval.write_file(path, data).await
    }

    /// Delete every stored file and recreate the empty root.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.lock.write().await;
        self.root.clear().await
    }

    /// Total bytes currently stored.
    pub async fn storage_size(&self) -> Result<u64> {
        let _guard = self.lock.read().await;
        self.root.storage_size().await
    }

    /// Content digest of any file, as used for deduplication.
    pub async fn hash_file(&self, path: &Path) -> Result<String> {
        self.hasher.compute_hash_incremental(path).await
    }
}
