//! Integration tests for BoxFs rm / rm_file / rmdir operations

mod common;

use ::common::fs::{CanonicalPath, FsError};

#[tokio::test]
async fn test_rm_file() {
    let (mut fs, remote) = common::setup_test_env().await;

    fs.write("/file.txt", "data", false).await.unwrap();
    let file = fs.resolve("/file.txt").await.unwrap();

    fs.rm_file("/file.txt").await.unwrap();

    assert!(!remote.contains(&file.id));
    assert!(!fs.exists("/file.txt").await.unwrap());
    assert!(fs.cache().is_empty());
}

#[tokio::test]
async fn test_rm_file_on_folder_fails() {
    let (mut fs, remote) = common::setup_test_env().await;
    fs.mkdir("/dir", false).await.unwrap();
    remote.reset_calls();

    let result = fs.rm_file("/dir").await;
    assert!(matches!(result, Err(FsError::IsADirectory(_))));
    assert_eq!(remote.calls().delete_object, 0);
}

#[tokio::test]
async fn test_rmdir_on_file_fails() {
    let (mut fs, _remote) = common::setup_test_env().await;
    fs.write("/file.txt", "data", false).await.unwrap();

    let result = fs.rmdir("/file.txt").await;
    assert!(matches!(result, Err(FsError::NotADirectory(_))));
    assert!(fs.exists("/file.txt").await.unwrap());
}

#[tokio::test]
async fn test_rmdir_drops_cached_subtree() {
    let (mut fs, remote) = common::setup_test_env().await;
    let [_, reports, ..] = common::seed_reports(&remote);
    let other = remote.insert_folder(&common::root_id(), "Other").unwrap();

    fs.resolve("Documents/Reports/q1.pdf").await.unwrap();
    fs.resolve("Documents/Reports/q2.pdf").await.unwrap();
    fs.resolve("Other").await.unwrap();

    fs.rmdir("Documents").await.unwrap();

    let docs = CanonicalPath::from_segments(["Documents"]);
    let entries = fs.cache().entries();
    assert!(entries.iter().all(|entry| !entry.path.starts_with(&docs)));
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].object, other);

    // The whole subtree is gone remotely
    assert!(!remote.contains(&reports.id));
}

#[tokio::test]
async fn test_rm_removes_either_kind() {
    let (mut fs, _remote) = common::setup_test_env().await;
    fs.makedirs("/a/b", false).await.unwrap();
    fs.write("/a/b/c.txt", "c", false).await.unwrap();

    fs.rm("/a/b/c.txt").await.unwrap();
    assert!(!fs.exists("/a/b/c.txt").await.unwrap());

    fs.rm("/a").await.unwrap();
    assert!(!fs.exists("/a").await.unwrap());
    assert!(!fs.exists("/a/b").await.unwrap());
}

#[tokio::test]
async fn test_rm_root_fails() {
    let (mut fs, remote) = common::setup_test_env().await;

    let result = fs.rm("/").await;
    assert!(matches!(result, Err(FsError::RootOperation(_))));
    assert_eq!(remote.calls().total(), 0);
}

#[tokio::test]
async fn test_rm_missing_fails() {
    let (mut fs, _remote) = common::setup_test_env().await;

    let result = fs.rm("/ghost").await;
    assert!(matches!(result, Err(FsError::NotFound(_))));
}

#[tokio::test]
async fn test_failed_remote_delete_keeps_cache() {
    let (mut fs, remote) = common::setup_test_env().await;
    fs.write("/file.txt", "data", false).await.unwrap();
    let file = fs.resolve("/file.txt").await.unwrap();

    // Deleted elsewhere: the remote call fails and the stale entry stays put
    remote.remove(&file.id).unwrap();
    let result = fs.rm_file("/file.txt").await;
    assert!(matches!(
        result,
        Err(FsError::Remote(::common::remote::RemoteError::NotFound(_)))
    ));
    assert_eq!(
        fs.cache().get(&CanonicalPath::from_segments(["file.txt"])),
        Some(file)
    );
}
