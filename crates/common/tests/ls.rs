//! Integration tests for BoxFs ls / ls_deep / info operations

mod common;

use ::common::fs::{CanonicalPath, FsError};
use ::common::remote::ObjectKind;

#[tokio::test]
async fn test_ls_root() {
    let (mut fs, remote) = common::setup_test_env().await;
    common::seed_reports(&remote);
    remote
        .insert_file(&common::root_id(), "readme.md", "hello")
        .unwrap();

    let items = fs.ls("/").await.unwrap();
    let names: Vec<&str> = items.values().map(|info| info.name.as_str()).collect();
    assert_eq!(names, vec!["Documents", "readme.md"]);

    let readme = &items[&CanonicalPath::from_segments(["readme.md"])];
    assert_eq!(readme.kind, ObjectKind::File);
    assert_eq!(readme.size, 5);
    assert!(items[&CanonicalPath::from_segments(["Documents"])].is_dir());
}

#[tokio::test]
async fn test_ls_caches_children() {
    let (mut fs, remote) = common::setup_test_env().await;
    let [_, _, q1, _] = common::seed_reports(&remote);

    fs.ls("Documents/Reports").await.unwrap();
    remote.reset_calls();

    assert_eq!(fs.resolve("Documents/Reports/q1.pdf").await.unwrap(), q1);
    assert_eq!(remote.calls().total(), 0);
}

#[tokio::test]
async fn test_ls_drops_children_gone_remotely() {
    let (mut fs, remote) = common::setup_test_env().await;
    fs.makedirs("/a/sub/deeper", false).await.unwrap();
    fs.write("/a/keep.txt", "k", false).await.unwrap();
    let sub = fs.resolve("/a/sub").await.unwrap();

    remote.remove(&sub.id).unwrap();
    let items = fs.ls("/a").await.unwrap();
    assert_eq!(items.len(), 1);

    let cache = fs.cache();
    assert!(cache.get(&CanonicalPath::from_segments(["a", "sub"])).is_none());
    assert!(cache
        .get(&CanonicalPath::from_segments(["a", "sub", "deeper"]))
        .is_none());
    assert!(cache
        .get(&CanonicalPath::from_segments(["a", "keep.txt"]))
        .is_some());

    assert!(matches!(
        fs.resolve("/a/sub").await,
        Err(FsError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_ls_replaces_respawned_child() {
    let (mut fs, remote) = common::setup_test_env().await;
    fs.makedirs("/a/sub/deeper", false).await.unwrap();
    let a = fs.resolve("/a").await.unwrap();
    let sub = fs.resolve("/a/sub").await.unwrap();

    // replaced elsewhere by a new folder of the same name
    remote.remove(&sub.id).unwrap();
    let fresh = remote.insert_folder(&a.id, "sub").unwrap();

    fs.ls("/a").await.unwrap();
    let cache = fs.cache();
    assert_eq!(
        cache.get(&CanonicalPath::from_segments(["a", "sub"])),
        Some(fresh)
    );
    assert!(cache
        .get(&CanonicalPath::from_segments(["a", "sub", "deeper"]))
        .is_none());
}

#[tokio::test]
async fn test_ls_file_lists_itself() {
    let (mut fs, remote) = common::setup_test_env().await;
    common::seed_reports(&remote);

    let items = fs.ls("Documents/Reports/q2.pdf").await.unwrap();
    assert_eq!(items.len(), 1);
    let info = items.values().next().unwrap();
    assert_eq!(info.name, "q2.pdf");
    assert_eq!(info.path.to_string(), "Documents/Reports/q2.pdf");
}

#[tokio::test]
async fn test_ls_empty_folder() {
    let (mut fs, _remote) = common::setup_test_env().await;
    fs.mkdir("/empty", false).await.unwrap();

    assert!(fs.ls("/empty").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ls_missing_fails() {
    let (mut fs, _remote) = common::setup_test_env().await;

    let result = fs.ls("/ghost").await;
    assert!(matches!(result, Err(FsError::NotFound(_))));
}

#[tokio::test]
async fn test_ls_deep() {
    let (mut fs, remote) = common::setup_test_env().await;
    common::seed_reports(&remote);
    fs.write("Documents/notes.txt", "n", false).await.unwrap();

    let items = fs.ls_deep("/").await.unwrap();
    let paths: Vec<String> = items.keys().map(|path| path.to_string()).collect();
    assert_eq!(
        paths,
        vec![
            "Documents",
            "Documents/Reports",
            "Documents/Reports/q1.pdf",
            "Documents/Reports/q2.pdf",
            "Documents/notes.txt",
        ]
    );
}

#[tokio::test]
async fn test_info_and_timestamps() {
    let (mut fs, remote) = common::setup_test_env().await;
    let [_, _, q1, _] = common::seed_reports(&remote);

    let info = fs.info("Documents/Reports/q1.pdf").await.unwrap();
    assert_eq!(info.id, q1.id);
    assert_eq!(info.size, "q1 numbers".len() as u64);
    assert!(!info.is_dir());

    assert!(fs.created("Documents/Reports/q1.pdf").await.unwrap().is_some());
    assert!(fs.modified("Documents/Reports/q1.pdf").await.unwrap().is_some());
}

#[tokio::test]
async fn test_info_root() {
    let (mut fs, _remote) = common::setup_test_env().await;

    let info = fs.info("/").await.unwrap();
    assert!(info.is_dir());
    assert!(info.path.is_root());
    assert_eq!(info.id.as_str(), "0");
}

#[tokio::test]
async fn test_entry_info_serializes_path_as_string() {
    let (mut fs, remote) = common::setup_test_env().await;
    common::seed_reports(&remote);

    let info = fs.info("Documents/Reports").await.unwrap();
    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["path"], "Documents/Reports");
    assert_eq!(json["kind"], "folder");
}
