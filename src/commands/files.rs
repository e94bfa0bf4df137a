//! 文件存储命令
//!
//! Thin wrappers over [`FileManager`]; errors cross the IPC boundary as
//! strings.

use std::path::PathBuf;
use std::sync::Arc;

use tauri::{command, State};

use crate::models::{EncodedImage, FileContent, FileRecord};
use crate::services::PickOptions;
use crate::storage::FileManager;

type ManagerState<'a> = State<'a, Arc<FileManager>>;

#[command]
pub async fn select_file(
    manager: ManagerState<'_>,
    options: Option<PickOptions>,
) -> Result<Option<Vec<FileRecord>>, String> {
    manager
        .select_file(options.unwrap_or_default())
        .await
        .map_err(|e| e.to_string())
}

#[command]
pub async fn upload_file(manager: ManagerState<'_>, file: FileRecord) -> Result<FileRecord, String> {
    manager.upload_file(&file).await.map_err(|e| e.to_string())
}

#[command]
pub async fn get_file(manager: ManagerState<'_>, path: PathBuf) -> Result<Option<FileRecord>, String> {
    manager.get_file(&path).await.map_err(|e| e.to_string())
}

#[command]
pub async fn read_file(manager: ManagerState<'_>, id: String) -> Result<String, String> {
    manager.read_text(&id).await.map_err(|e| e.to_string())
}

#[command]
pub async fn delete_file(manager: ManagerState<'_>, id: String) -> Result<(), String> {
    manager.delete_file(&id).await.map_err(|e| e.to_string())
}

#[command]
pub async fn base64_image(manager: ManagerState<'_>, id: String) -> Result<EncodedImage, String> {
    manager.base64_image(&id).await.map_err(|e| e.to_string())
}

#[command]
pub async fn create_temp_file(manager: ManagerState<'_>, name: String) -> Result<PathBuf, String> {
    manager
        .create_temp_path(&name)
        .await
        .map_err(|e| e.to_string())
}

#[command]
pub async fn write_file(
    manager: ManagerState<'_>,
    path: PathBuf,
    content: FileContent,
) -> Result<(), String> {
    manager
        .write_file(&path, content)
        .await
        .map_err(|e| e.to_string())
}

#[command]
pub async fn clear_storage(manager: ManagerState<'_>) -> Result<(), String> {
    manager.clear().await.map_err(|e| e.to_string())
}

#[command]
pub async fn storage_size(manager: ManagerState<'_>) -> Result<u64, String> {
    manager.storage_size().await.map_err(|e| e.to_string())
}
