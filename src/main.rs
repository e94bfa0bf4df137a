//! 文件存储 - 主入口
//!
//! 负责：
//! - 解析应用目录并加载配置
//! - 初始化日志系统
//! - 创建共享的 FileManager 并注册命令

use std::sync::{Arc, Mutex};

use color_eyre::eyre::WrapErr;
use file_storage::commands::files::*;
use file_storage::error::EyreResult;
use file_storage::models::AppConfigLoader;
use file_storage::services::{apply_app_paths, DialogPicker, ExtensionClassifier, TauriPaths};
use file_storage::storage::FileManager;
use file_storage::utils::init_logging;
use tauri::Manager;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

/// Keeps the log file writer alive for the lifetime of the app.
struct LogGuard(#[allow(dead_code)] Mutex<Option<WorkerGuard>>);

fn main() -> EyreResult<()> {
    color_eyre::install()?;

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            // config.toml 不存在时使用默认值 + 环境变量
            let config_path = app
                .path()
                .app_config_dir()
                .ok()
                .map(|dir| dir.join("config.toml"))
                .filter(|path| path.exists());
            let mut config = AppConfigLoader::load(config_path)?.into_config();

            apply_app_paths(&mut config.storage, &TauriPaths::new(app.handle().clone()))?;

            let guard = init_logging(&config.logging)?;
            app.manage(LogGuard(Mutex::new(guard)));

            info!("File Storage v{} - starting", env!("CARGO_PKG_VERSION"));

            let manager = tauri::async_runtime::block_on(FileManager::with_collaborators(
                &config.storage,
                Arc::new(ExtensionClassifier::new()),
                Arc::new(DialogPicker::new(app.handle().clone())),
            ))?;
            app.manage(Arc::new(manager));

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            select_file,
            upload_file,
            get_file,
            read_file,
            delete_file,
            base64_image,
            create_temp_file,
            write_file,
            clear_storage,
            storage_size,
        ])
        .run(tauri::generate_context!())
        .wrap_err("error while running tauri application")?;

    Ok(())
}
