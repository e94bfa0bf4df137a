//! 存储集成测试
//!
//! End-to-end behaviour of `FileManager` against a real temporary tree:
//! deduplication, identity naming, round trips and root lifecycle.


use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use file_storage::error::AppError;
use file_storage::models::{FileCategory, FileContent};
use file_storage::storage::DUPLICATE_COUNT;
use rstest::*;
use storage_test_helpers::create_storage_workspace;

#[tokio::test]
async fn test_dedup_idempotence() {
    let workspace = create_storage_workspace().await.unwrap();
    let first = workspace.write_source("one.bin", b"identical bytes").unwrap();
    let second = workspace.write_source("two.bin", b"identical bytes").unwrap();

    let a = workspace.manager.upload(&first).await.unwrap();
    let b = workspace.manager.upload(&second).await.unwrap();

    assert_eq!(a.count, 1);
    assert_eq!(b.count, DUPLICATE_COUNT);
    assert_eq!(a.id, b.id);
    assert_eq!(a.path, b.path);
    assert_eq!(workspace.root_entries().unwrap(), vec![a.name.clone()]);
}

#[tokio::test]
async fn test_same_size_different_content_not_deduplicated() {
    let workspace = create_storage_workspace().await.unwrap();
    let first = workspace.write_source("a.txt", b"0123456789").unwrap();
    let second = workspace.write_source("b.txt", b"9876543210").unwrap();

    let a = workspace.manager.upload(&first).await.unwrap();
    let b = workspace.manager.upload(&second).await.unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(b.count, 1);
    assert_eq!(workspace.root_entries().unwrap().len(), 2);
}

#[rstest]
#[case("photo.png", ".png", FileCategory::Image)]
#[case("clip.MP4", ".MP4", FileCategory::Video)]
#[case("archive.tar.gz", ".gz", FileCategory::Other)]
#[case("notes.md", ".md", FileCategory::Text)]
#[case("Makefile", "", FileCategory::Other)]
#[case(".bashrc", "", FileCategory::Other)]
#[case("trailing.", ".", FileCategory::Other)]
#[tokio::test]
async fn test_name_is_id_plus_ext(
    #[case] source_name: &str,
    #[case] expected_ext: &str,
    #[case] expected_type: FileCategory,
) {
    let workspace = create_storage_workspace().await.unwrap();
    let source = workspace
        .write_source(source_name, source_name.as_bytes())
        .unwrap();

    let record = workspace.manager.upload(&source).await.unwrap();

    assert_eq!(record.ext, expected_ext);
    assert_eq!(record.name, format!("{}{}", record.id, record.ext));
    assert_eq!(record.path, workspace.root().join(&record.name));
    assert_eq!(record.origin_name, source_name);
    assert_eq!(record.file_type, expected_type);
    assert!(record.path.is_file());
}

#[tokio::test]
async fn test_write_then_read_text_round_trip() {
    let workspace = create_storage_workspace().await.unwrap();
    let temp_path = workspace.manager.create_temp_path("draft.txt").await.unwrap();
    let text = "line one\nline two ✓\n";

    workspace
        .manager
        .write_file(&temp_path, FileContent::from(text))
        .await
        .unwrap();
    let record = workspace.manager.upload(&temp_path).await.unwrap();

    assert_eq!(workspace.manager.read_text(&record.id).await.unwrap(), text);
    assert_eq!(
        workspace.manager.read_text(&record.name).await.unwrap(),
        text
    );
}

#[tokio::test]
async fn test_write_then_base64_round_trip() {
    let workspace = create_storage_workspace().await.unwrap();
    let temp_path = workspace.manager.create_temp_path("pixel.gif").await.unwrap();
    let bytes: Vec<u8> = (0..=255u8).collect();

    workspace
        .manager
        .write_file(&temp_path, FileContent::Bytes(bytes.clone()))
        .await
        .unwrap();
    let record = workspace.manager.upload(&temp_path).await.unwrap();
    let encoded = workspace.manager.base64_image(&record.id).await.unwrap();

    assert_eq!(encoded.mime, "image/gif");
    assert_eq!(STANDARD.decode(&encoded.base64).unwrap(), bytes);
    assert!(encoded.data.starts_with("data:image/gif;base64,"));
}

#[tokio::test]
async fn test_clear_wipes_and_resets() {
    let workspace = create_storage_workspace().await.unwrap();
    let mut paths = Vec::new();
    for i in 0..3 {
        let source = workspace
            .write_source(&format!("f{}.txt", i), format!("content {}", i).as_bytes())
            .unwrap();
        paths.push(workspace.manager.upload(&source).await.unwrap().path);
    }

    workspace.manager.clear().await.unwrap();

    assert!(workspace.root().is_dir());
    assert!(workspace.root_entries().unwrap().is_empty());
    assert!(paths.iter().all(|p| !p.exists()));
}

#[tokio::test]
async fn test_report_scenario() {
    let workspace = create_storage_workspace().await.unwrap();
    let content: Vec<u8> = (0..500).map(|i| (i % 97) as u8).collect();
    let report = workspace.write_source("report.pdf", &content).unwrap();
    let copy = workspace.write_source("report-copy.pdf", &content).unwrap();

    let a = workspace.manager.upload(&report).await.unwrap();
    assert_eq!(a.count, 1);
    assert_eq!(a.ext, ".pdf");
    assert_eq!(a.size, 500);
    assert_eq!(a.file_type, FileCategory::Document);

    let b = workspace.manager.upload(&copy).await.unwrap();
    assert_eq!(b.id, a.id);
    assert_eq!(b.path, a.path);
    assert_eq!(b.count, DUPLICATE_COUNT);
    assert!(copy.exists());

    workspace.manager.delete_file(&a.id).await.unwrap();
    let result = workspace.manager.read_text(&a.id).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_get_file_nonexistent_is_none() {
    let workspace = create_storage_workspace().await.unwrap();
    let record = workspace
        .manager
        .get_file(std::path::Path::new("/nonexistent/x.png"))
        .await
        .unwrap();
    assert!(record.is_none());
}

#[tokio::test]
async fn test_get_file_through_regular_file_is_none() {
    let workspace = create_storage_workspace().await.unwrap();
    let plain = workspace.write_source("plain.txt", b"just a file").unwrap();

    let record = workspace
        .manager
        .get_file(&plain.join("x.png"))
        .await
        .unwrap();
    assert!(record.is_none());
}

#[tokio::test]
async fn test_read_text_decodes_lossily() {
    let workspace = create_storage_workspace().await.unwrap();
    let source = workspace.write_source("menu.txt", b"caf\xe9").unwrap();

    let record = workspace.manager.upload(&source).await.unwrap();
    let text = workspace.manager.read_text(&record.id).await.unwrap();

    assert_eq!(text, "caf\u{FFFD}");
    assert_eq!(
        workspace.manager.read_bytes(&record.id).await.unwrap(),
        b"caf\xe9"
    );
}

#[tokio::test]
async fn test_upload_after_delete_mints_new_identity() {
    let workspace = create_storage_workspace().await.unwrap();
    let source = workspace.write_source("again.txt", b"again").unwrap();

    let first = workspace.manager.upload(&source).await.unwrap();
    workspace.manager.delete_file(&first.id).await.unwrap();
    let second = workspace.manager.upload(&source).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(second.count, 1);
}

#[tokio::test]
async fn test_upload_directory_fails_without_residue() {
    let workspace = create_storage_workspace().await.unwrap();

    let result = workspace.manager.upload(&workspace.source_dir).await;

    assert!(matches!(result, Err(AppError::IoDetailed { .. })));
    assert!(workspace.root_entries().unwrap().is_empty());
}

#[tokio::test]
async fn test_storage_size_counts_distinct_content_once() {
    let workspace = create_storage_workspace().await.unwrap();
    let a = workspace.write_source("a.bin", &[1u8; 300]).unwrap();
    let b = workspace.write_source("b.bin", &[1u8; 300]).unwrap();
    let c = workspace.write_source("c.bin", &[2u8; 200]).unwrap();

    for source in [&a, &b, &c] {
        workspace.manager.upload(source).await.unwrap();
    }

    assert_eq!(workspace.manager.storage_size().await.unwrap(), 500);
}
