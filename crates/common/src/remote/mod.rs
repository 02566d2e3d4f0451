//! Capability interface over an ID-addressed remote store
//!
//! The rest of the crate never talks to the network directly. Every
//! path-based operation is translated into calls against a [`RemoteClient`],
//! addressed purely by [`ObjectId`]. Any concrete SDK adapter (the Box REST
//! client in the `boxfs` binary, or the in-process [`MemoryRemote`]) plugs in
//! here.

mod memory;

use std::fmt;
use std::ops::Range;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};

pub use memory::{CallCounts, MemoryRemote};

/// Opaque identifier of an object in the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind tag carried alongside every identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    File,
    Folder,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::File => f.write_str("file"),
            ObjectKind::Folder => f.write_str("folder"),
        }
    }
}

/// An identifier plus its kind.
///
/// Identifiers survive renames and moves, and become invalid once the
/// object is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteObjectRef {
    pub id: ObjectId,
    pub kind: ObjectKind,
}

impl RemoteObjectRef {
    pub fn new(id: impl Into<ObjectId>, kind: ObjectKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn file(id: impl Into<ObjectId>) -> Self {
        Self::new(id, ObjectKind::File)
    }

    pub fn folder(id: impl Into<ObjectId>) -> Self {
        Self::new(id, ObjectKind::Folder)
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ObjectKind::Folder
    }

    pub fn is_file(&self) -> bool {
        self.kind == ObjectKind::File
    }
}

impl fmt::Display for RemoteObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// A single child entry as reported by the remote store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    pub object: RemoteObjectRef,
    pub size: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Byte stream handed out by [`RemoteClient::open_read`]
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, RemoteError>> + Send>>;

/// Errors originating from the remote store.
///
/// These surface to callers unchanged; nothing in this crate retries them.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("remote object not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("name already in use: {0}")]
    Conflict(String),
    #[error("rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("operation not supported by this client: {0}")]
    Unsupported(&'static str),
    #[error("default error: {0}")]
    Default(#[from] anyhow::Error),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }
}

#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Identifier of the store's default root folder
    fn default_root(&self) -> ObjectId;

    /// Fetch metadata for a single object
    async fn stat(&self, id: &ObjectId) -> Result<RemoteEntry, RemoteError>;

    /// Names of the folders between the default root (exclusive) and
    ///  `id` (inclusive). Empty for the default root itself.
    async fn path_of(&self, id: &ObjectId) -> Result<Vec<String>, RemoteError>;

    /// List the direct children of a folder.
    ///
    /// Fails with [`RemoteError::NotFound`] if the folder no longer exists.
    async fn list_children(&self, folder: &ObjectId) -> Result<Vec<RemoteEntry>, RemoteError>;

    async fn create_folder(&self, parent: &ObjectId, name: &str)
        -> Result<RemoteEntry, RemoteError>;

    /// Delete a file, or a folder together with everything under it
    async fn delete_object(&self, object: &RemoteObjectRef) -> Result<(), RemoteError>;

    async fn move_object(
        &self,
        object: &RemoteObjectRef,
        new_parent: &ObjectId,
        new_name: &str,
    ) -> Result<RemoteEntry, RemoteError>;

    async fn copy_object(
        &self,
        object: &RemoteObjectRef,
        new_parent: &ObjectId,
        new_name: &str,
    ) -> Result<RemoteEntry, RemoteError>;

    /// Open a read stream over a file, optionally restricted to a byte range
    async fn open_read(
        &self,
        file: &ObjectId,
        range: Option<Range<u64>>,
    ) -> Result<ByteStream, RemoteError>;

    /// Upload a new file under `parent`
    async fn upload(
        &self,
        parent: &ObjectId,
        name: &str,
        data: Bytes,
    ) -> Result<RemoteEntry, RemoteError>;

    /// Replace the contents of an existing file, keeping its identifier
    async fn upload_version(&self, file: &ObjectId, data: Bytes)
        -> Result<RemoteEntry, RemoteError>;

    /// A URL from which the file can be fetched without further auth
    async fn download_url(&self, _file: &ObjectId) -> Result<String, RemoteError> {
        Err(RemoteError::Unsupported("download_url"))
    }
}

#[async_trait]
impl<T: RemoteClient + ?Sized> RemoteClient for std::sync::Arc<T> {
    fn default_root(&self) -> ObjectId {
        (**self).default_root()
    }

    async fn stat(&self, id: &ObjectId) -> Result<RemoteEntry, RemoteError> {
        (**self).stat(id).await
    }

    async fn path_of(&self, id: &ObjectId) -> Result<Vec<String>, RemoteError> {
        (**self).path_of(id).await
    }

    async fn list_children(&self, folder: &ObjectId) -> Result<Vec<RemoteEntry>, RemoteError> {
        (**self).list_children(folder).await
    }

    async fn create_folder(
        &self,
        parent: &ObjectId,
        name: &str,
    ) -> Result<RemoteEntry, RemoteError> {
        (**self).create_folder(parent, name).await
    }

    async fn delete_object(&self, object: &RemoteObjectRef) -> Result<(), RemoteError> {
        (**self).delete_object(object).await
    }

    async fn move_object(
        &self,
        object: &RemoteObjectRef,
        new_parent: &ObjectId,
        new_name: &str,
    ) -> Result<RemoteEntry, RemoteError> {
        (**self).move_object(object, new_parent, new_name).await
    }

    async fn copy_object(
        &self,
        object: &RemoteObjectRef,
        new_parent: &ObjectId,
        new_name: &str,
    ) -> Result<RemoteEntry, RemoteError> {
        (**self).copy_object(object, new_parent, new_name).await
    }

    async fn open_read(
        &self,
        file: &ObjectId,
        range: Option<Range<u64>>,
    ) -> Result<ByteStream, RemoteError> {
        (**self).open_read(file, range).await
    }

    async fn upload(
        &self,
        parent: &ObjectId,
        name: &str,
        data: Bytes,
    ) -> Result<RemoteEntry, RemoteError> {
        (**self).upload(parent, name, data).await
    }

    async fn upload_version(
        &self,
        file: &ObjectId,
        data: Bytes,
    ) -> Result<RemoteEntry, RemoteError> {
        (**self).upload_version(file, data).await
    }

    async fn download_url(&self, file: &ObjectId) -> Result<String, RemoteError> {
        (**self).download_url(file).await
    }
}
