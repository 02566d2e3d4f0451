//! Shared test utilities for filesystem integration tests
#![allow(dead_code)]

use common::fs::{BoxFs, FsConfig};
use common::remote::{MemoryRemote, ObjectId, RemoteObjectRef};

/// Set up a filesystem over an empty in-memory store.
///
/// The returned remote is a second handle onto the same store, for
///  inspecting call counts and making changes behind the filesystem's back.
pub async fn setup_test_env() -> (BoxFs<MemoryRemote>, MemoryRemote) {
    setup_with_config(FsConfig::default()).await
}

pub async fn setup_with_config(config: FsConfig) -> (BoxFs<MemoryRemote>, MemoryRemote) {
    let remote = MemoryRemote::new();
    let fs = BoxFs::new(remote.clone(), config).await.unwrap();
    remote.reset_calls();
    (fs, remote)
}

pub fn root_id() -> ObjectId {
    ObjectId::from("0")
}

/// Build `Documents/Reports/q1.pdf` and `Documents/Reports/q2.pdf` directly
///  in the store. Returns the refs of Documents, Reports, q1 and q2.
pub fn seed_reports(remote: &MemoryRemote) -> [RemoteObjectRef; 4] {
    let docs = remote.insert_folder(&root_id(), "Documents").unwrap();
    let reports = remote.insert_folder(&docs.id, "Reports").unwrap();
    let q1 = remote.insert_file(&reports.id, "q1.pdf", "q1 numbers").unwrap();
    let q2 = remote.insert_file(&reports.id, "q2.pdf", "q2 numbers").unwrap();
    [docs, reports, q1, q2]
}
