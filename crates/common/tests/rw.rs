//! Integration tests for reading, writing and copying file contents

mod common;

use ::common::fs::{FsConfig, FsError, NameMatching};
use futures::TryStreamExt;

#[tokio::test]
async fn test_write_and_cat() {
    let (mut fs, remote) = common::setup_test_env().await;

    let info = fs.write("/hello.txt", "hello world", false).await.unwrap();
    assert_eq!(info.size, 11);
    assert_eq!(remote.calls().upload, 1);

    assert_eq!(fs.cat("/hello.txt").await.unwrap(), "hello world");
    assert_eq!(fs.cat_range("/hello.txt", 6..11).await.unwrap(), "world");
}

#[tokio::test]
async fn test_open_read_streams_contents() {
    let (mut fs, _remote) = common::setup_test_env().await;
    fs.write("/data.bin", vec![1u8, 2, 3], false).await.unwrap();

    let chunks: Vec<_> = fs
        .open_read("/data.bin")
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    let data: Vec<u8> = chunks.concat();
    assert_eq!(data, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_overwrite_keeps_identifier() {
    let (mut fs, remote) = common::setup_test_env().await;

    let first = fs.write("/doc.txt", "v1", false).await.unwrap();
    let second = fs.write("/doc.txt", "version two", true).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(remote.calls().upload_version, 1);
    assert_eq!(fs.cat("/doc.txt").await.unwrap(), "version two");
}

#[tokio::test]
async fn test_write_without_overwrite_fails() {
    let (mut fs, _remote) = common::setup_test_env().await;
    fs.write("/doc.txt", "v1", false).await.unwrap();

    let result = fs.write("/doc.txt", "v2", false).await;
    assert!(matches!(result, Err(FsError::AlreadyExists(_))));
    assert_eq!(fs.cat("/doc.txt").await.unwrap(), "v1");
}

#[tokio::test]
async fn test_write_into_missing_folder_fails() {
    let (mut fs, remote) = common::setup_test_env().await;

    let result = fs.write("/nope/doc.txt", "v1", false).await;
    assert!(matches!(result, Err(FsError::NotFound(_))));
    assert_eq!(remote.calls().upload, 0);
}

#[tokio::test]
async fn test_write_over_folder_fails() {
    let (mut fs, _remote) = common::setup_test_env().await;
    fs.mkdir("/dir", false).await.unwrap();

    let result = fs.write("/dir", "x", true).await;
    assert!(matches!(result, Err(FsError::IsADirectory(_))));
}

#[tokio::test]
async fn test_cat_folder_fails() {
    let (mut fs, _remote) = common::setup_test_env().await;
    fs.mkdir("/dir", false).await.unwrap();

    assert!(matches!(
        fs.cat("/dir").await,
        Err(FsError::IsADirectory(_))
    ));
}

#[tokio::test]
async fn test_touch_creates_but_never_truncates() {
    let (mut fs, _remote) = common::setup_test_env().await;

    fs.touch("/empty.txt").await.unwrap();
    assert_eq!(fs.info("/empty.txt").await.unwrap().size, 0);

    fs.write("/full.txt", "keep me", false).await.unwrap();
    fs.touch("/full.txt").await.unwrap();
    assert_eq!(fs.cat("/full.txt").await.unwrap(), "keep me");
}

#[tokio::test]
async fn test_cp_file() {
    let (mut fs, remote) = common::setup_test_env().await;
    fs.write("/a.txt", "payload", false).await.unwrap();
    remote.reset_calls();

    let copy = fs.cp_file("/a.txt", "/b.txt").await.unwrap();
    assert_eq!(remote.calls().copy_object, 1);

    // The copy is cached under its new path with a fresh identifier
    remote.reset_calls();
    assert_eq!(fs.resolve("/b.txt").await.unwrap(), copy);
    assert_eq!(remote.calls().total(), 0);
    assert_ne!(copy, fs.resolve("/a.txt").await.unwrap());
    assert_eq!(fs.cat("/b.txt").await.unwrap(), "payload");
}

#[tokio::test]
async fn test_cp_folder() {
    let (mut fs, _remote) = common::setup_test_env().await;
    fs.makedirs("/src/inner", false).await.unwrap();
    fs.write("/src/inner/f.txt", "f", false).await.unwrap();

    fs.cp_file("/src", "/dst").await.unwrap();

    assert_eq!(fs.cat("/dst/inner/f.txt").await.unwrap(), "f");
    assert_eq!(fs.cat("/src/inner/f.txt").await.unwrap(), "f");
}

#[tokio::test]
async fn test_cp_refuses_to_overwrite() {
    let (mut fs, remote) = common::setup_test_env().await;
    fs.write("/a.txt", "a", false).await.unwrap();
    fs.write("/b.txt", "b", false).await.unwrap();
    remote.reset_calls();

    let result = fs.cp_file("/a.txt", "/b.txt").await;
    assert!(matches!(result, Err(FsError::AlreadyExists(_))));
    assert_eq!(remote.calls().copy_object, 0);
}

#[tokio::test]
async fn test_cp_into_self_with_other_casing_fails() {
    let config = FsConfig::default().with_name_matching(NameMatching::CaseInsensitive);
    let (mut fs, remote) = common::setup_with_config(config).await;
    fs.makedirs("/Src/inner", false).await.unwrap();
    remote.reset_calls();

    let result = fs.cp_file("/Src", "/src/inner/copy").await;
    assert!(matches!(result, Err(FsError::MoveIntoSelf { .. })));
    assert_eq!(remote.calls().total(), 0);

    // the same folder under another spelling already exists
    let result = fs.cp_file("/Src", "/SRC").await;
    assert!(matches!(result, Err(FsError::MoveIntoSelf { .. })));
}

#[tokio::test]
async fn test_sign() {
    let (mut fs, _remote) = common::setup_test_env().await;
    let info = fs.write("/a.txt", "a", false).await.unwrap();

    let url = fs.sign("/a.txt").await.unwrap();
    assert!(url.contains(info.id.as_str()));

    fs.mkdir("/dir", false).await.unwrap();
    assert!(matches!(
        fs.sign("/dir").await,
        Err(FsError::IsADirectory(_))
    ));
}
