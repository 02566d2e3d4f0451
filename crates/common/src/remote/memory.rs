use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{future, stream};
use parking_lot::RwLock;

use super::{
    ByteStream, ObjectId, ObjectKind, RemoteClient, RemoteEntry, RemoteError, RemoteObjectRef,
};

const ROOT_ID: &str = "0";
const ROOT_NAME: &str = "All Files";

/// Number of calls made against a [`MemoryRemote`], per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub stat: usize,
    pub path_of: usize,
    pub list_children: usize,
    pub create_folder: usize,
    pub delete_object: usize,
    pub move_object: usize,
    pub copy_object: usize,
    pub open_read: usize,
    pub upload: usize,
    pub upload_version: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.stat
            + self.path_of
            + self.list_children
            + self.create_folder
            + self.delete_object
            + self.move_object
            + self.copy_object
            + self.open_read
            + self.upload
            + self.upload_version
    }
}

/// In-memory remote store.
///
/// Cloning yields another handle onto the same store, so a test can keep
///  one handle to mutate the store "externally" while a filesystem owns
///  the other.
#[derive(Debug, Clone)]
pub struct MemoryRemote {
    inner: Arc<RwLock<MemoryRemoteInner>>,
}

#[derive(Debug)]
struct MemoryRemoteInner {
    objects: HashMap<ObjectId, MemoryObject>,
    next_id: u64,
    calls: CallCounts,
}

#[derive(Debug, Clone)]
struct MemoryObject {
    name: String,
    parent: Option<ObjectId>,
    kind: ObjectKind,
    data: Bytes,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl MemoryObject {
    fn entry(&self, id: &ObjectId) -> RemoteEntry {
        RemoteEntry {
            name: self.name.clone(),
            object: RemoteObjectRef::new(id.clone(), self.kind),
            size: self.data.len() as u64,
            created_at: Some(self.created_at),
            modified_at: Some(self.modified_at),
        }
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    /// Create an empty store holding only the default root folder
    pub fn new() -> Self {
        let now = Utc::now();
        let mut objects = HashMap::new();
        objects.insert(
            ObjectId::from(ROOT_ID),
            MemoryObject {
                name: ROOT_NAME.to_string(),
                parent: None,
                kind: ObjectKind::Folder,
                data: Bytes::new(),
                created_at: now,
                modified_at: now,
            },
        );
        Self {
            inner: Arc::new(RwLock::new(MemoryRemoteInner {
                objects,
                next_id: 1,
                calls: CallCounts::default(),
            })),
        }
    }

    /// Snapshot of the calls made through the [`RemoteClient`] interface
    pub fn calls(&self) -> CallCounts {
        self.inner.read().calls
    }

    pub fn reset_calls(&self) {
        self.inner.write().calls = CallCounts::default();
    }

    /// Add a folder behind the filesystem's back. Not counted as a call.
    pub fn insert_folder(
        &self,
        parent: &ObjectId,
        name: &str,
    ) -> Result<RemoteObjectRef, RemoteError> {
        let mut inner = self.inner.write();
        inner
            .insert(parent, name, ObjectKind::Folder, Bytes::new())
            .map(|entry| entry.object)
    }

    /// Add a file behind the filesystem's back. Not counted as a call.
    pub fn insert_file(
        &self,
        parent: &ObjectId,
        name: &str,
        data: impl Into<Bytes>,
    ) -> Result<RemoteObjectRef, RemoteError> {
        let mut inner = self.inner.write();
        inner
            .insert(parent, name, ObjectKind::File, data.into())
            .map(|entry| entry.object)
    }

    /// Remove an object (and its subtree) behind the filesystem's back
    pub fn remove(&self, id: &ObjectId) -> Result<(), RemoteError> {
        let mut inner = self.inner.write();
        inner.remove_tree(id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.inner.read().objects.contains_key(id)
    }

    /// Raw contents of a file, bypassing the call counters
    pub fn contents(&self, id: &ObjectId) -> Option<Bytes> {
        self.inner
            .read()
            .objects
            .get(id)
            .filter(|object| object.kind == ObjectKind::File)
            .map(|object| object.data.clone())
    }
}

impl MemoryRemoteInner {
    fn object(&self, id: &ObjectId) -> Result<&MemoryObject, RemoteError> {
        self.objects
            .get(id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }

    fn object_of_kind(&self, id: &ObjectId, kind: ObjectKind) -> Result<&MemoryObject, RemoteError> {
        self.object(id)
            .ok()
            .filter(|object| object.kind == kind)
            .ok_or_else(|| RemoteError::NotFound(format!("{} {}", kind, id)))
    }

    fn children(&self, parent: &ObjectId) -> impl Iterator<Item = (&ObjectId, &MemoryObject)> {
        let parent = parent.clone();
        self.objects
            .iter()
            .filter(move |(_, object)| object.parent.as_ref() == Some(&parent))
    }

    fn check_name_free(
        &self,
        parent: &ObjectId,
        name: &str,
        except: Option<&ObjectId>,
    ) -> Result<(), RemoteError> {
        let taken = self
            .children(parent)
            .any(|(id, object)| object.name == name && Some(id) != except);
        if taken {
            return Err(RemoteError::Conflict(name.to_string()));
        }
        Ok(())
    }

    fn next_id(&mut self) -> ObjectId {
        let id = ObjectId::new(self.next_id.to_string());
        self.next_id += 1;
        id
    }

    fn insert(
        &mut self,
        parent: &ObjectId,
        name: &str,
        kind: ObjectKind,
        data: Bytes,
    ) -> Result<RemoteEntry, RemoteError> {
        self.object_of_kind(parent, ObjectKind::Folder)?;
        self.check_name_free(parent, name, None)?;

        let now = Utc::now();
        let id = self.next_id();
        let object = MemoryObject {
            name: name.to_string(),
            parent: Some(parent.clone()),
            kind,
            data,
            created_at: now,
            modified_at: now,
        };
        let entry = object.entry(&id);
        self.objects.insert(id, object);
        Ok(entry)
    }

    fn is_descendant(&self, id: &ObjectId, ancestor: &ObjectId) -> bool {
        let mut cursor = Some(id.clone());
        while let Some(current) = cursor {
            if &current == ancestor {
                return true;
            }
            cursor = self.objects.get(&current).and_then(|o| o.parent.clone());
        }
        false
    }

    fn remove_tree(&mut self, id: &ObjectId) -> Result<(), RemoteError> {
        self.object(id)?;
        let children: Vec<ObjectId> = self.children(id).map(|(child, _)| child.clone()).collect();
        for child in children {
            self.remove_tree(&child)?;
        }
        self.objects.remove(id);
        Ok(())
    }

    fn copy_tree(
        &mut self,
        source: &ObjectId,
        parent: &ObjectId,
        name: &str,
    ) -> Result<RemoteEntry, RemoteError> {
        let object = self.object(source)?.clone();
        let entry = self.insert(parent, name, object.kind, object.data)?;
        if object.kind == ObjectKind::Folder {
            let children: Vec<(ObjectId, String)> = self
                .children(source)
                .map(|(id, child)| (id.clone(), child.name.clone()))
                .collect();
            for (child, child_name) in children {
                self.copy_tree(&child, &entry.object.id, &child_name)?;
            }
        }
        Ok(entry)
    }
}

#[async_trait]
impl RemoteClient for MemoryRemote {
    fn default_root(&self) -> ObjectId {
        ObjectId::from(ROOT_ID)
    }

    async fn stat(&self, id: &ObjectId) -> Result<RemoteEntry, RemoteError> {
        let mut inner = self.inner.write();
        inner.calls.stat += 1;
        inner.object(id).map(|object| object.entry(id))
    }

    async fn path_of(&self, id: &ObjectId) -> Result<Vec<String>, RemoteError> {
        let mut inner = self.inner.write();
        inner.calls.path_of += 1;

        let mut names = Vec::new();
        let mut cursor = id.clone();
        loop {
            let object = inner.object(&cursor)?;
            let Some(parent) = object.parent.clone() else {
                break;
            };
            names.push(object.name.clone());
            cursor = parent;
        }
        names.reverse();
        Ok(names)
    }

    async fn list_children(&self, folder: &ObjectId) -> Result<Vec<RemoteEntry>, RemoteError> {
        let mut inner = self.inner.write();
        inner.calls.list_children += 1;
        inner.object_of_kind(folder, ObjectKind::Folder)?;

        let mut entries: Vec<RemoteEntry> = inner
            .children(folder)
            .map(|(id, object)| object.entry(id))
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn create_folder(
        &self,
        parent: &ObjectId,
        name: &str,
    ) -> Result<RemoteEntry, RemoteError> {
        let mut inner = self.inner.write();
        inner.calls.create_folder += 1;
        inner.insert(parent, name, ObjectKind::Folder, Bytes::new())
    }

    async fn delete_object(&self, object: &RemoteObjectRef) -> Result<(), RemoteError> {
        let mut inner = self.inner.write();
        inner.calls.delete_object += 1;
        if object.id.as_str() == ROOT_ID {
            return Err(RemoteError::PermissionDenied(
                "the root folder cannot be deleted".to_string(),
            ));
        }
        inner.object_of_kind(&object.id, object.kind)?;
        inner.remove_tree(&object.id)
    }

    async fn move_object(
        &self,
        object: &RemoteObjectRef,
        new_parent: &ObjectId,
        new_name: &str,
    ) -> Result<RemoteEntry, RemoteError> {
        let mut inner = self.inner.write();
        inner.calls.move_object += 1;
        inner.object_of_kind(&object.id, object.kind)?;
        inner.object_of_kind(new_parent, ObjectKind::Folder)?;
        if inner.is_descendant(new_parent, &object.id) {
            return Err(RemoteError::Default(anyhow!(
                "cannot move {} into its own subtree",
                object.id
            )));
        }
        inner.check_name_free(new_parent, new_name, Some(&object.id))?;

        let now = Utc::now();
        let moved = inner
            .objects
            .get_mut(&object.id)
            .ok_or_else(|| RemoteError::NotFound(object.id.to_string()))?;
        moved.parent = Some(new_parent.clone());
        moved.name = new_name.to_string();
        moved.modified_at = now;
        Ok(moved.entry(&object.id))
    }

    async fn copy_object(
        &self,
        object: &RemoteObjectRef,
        new_parent: &ObjectId,
        new_name: &str,
    ) -> Result<RemoteEntry, RemoteError> {
        let mut inner = self.inner.write();
        inner.calls.copy_object += 1;
        inner.object_of_kind(&object.id, object.kind)?;
        inner.object_of_kind(new_parent, ObjectKind::Folder)?;
        if inner.is_descendant(new_parent, &object.id) {
            return Err(RemoteError::Default(anyhow!(
                "cannot copy {} into its own subtree",
                object.id
            )));
        }
        inner.copy_tree(&object.id, new_parent, new_name)
    }

    async fn open_read(
        &self,
        file: &ObjectId,
        range: Option<Range<u64>>,
    ) -> Result<ByteStream, RemoteError> {
        let mut inner = self.inner.write();
        inner.calls.open_read += 1;
        let data = inner.object_of_kind(file, ObjectKind::File)?.data.clone();

        let data = match range {
            Some(range) => {
                let len = data.len();
                let start = (range.start as usize).min(len);
                let end = (range.end as usize).clamp(start, len);
                data.slice(start..end)
            }
            None => data,
        };
        Ok(Box::pin(stream::once(future::ready(Ok(data)))))
    }

    async fn upload(
        &self,
        parent: &ObjectId,
        name: &str,
        data: Bytes,
    ) -> Result<RemoteEntry, RemoteError> {
        let mut inner = self.inner.write();
        inner.calls.upload += 1;
        inner.insert(parent, name, ObjectKind::File, data)
    }

    async fn upload_version(
        &self,
        file: &ObjectId,
        data: Bytes,
    ) -> Result<RemoteEntry, RemoteError> {
        let mut inner = self.inner.write();
        inner.calls.upload_version += 1;
        inner.object_of_kind(file, ObjectKind::File)?;

        let updated = inner
            .objects
            .get_mut(file)
            .ok_or_else(|| RemoteError::NotFound(file.to_string()))?;
        updated.data = data;
        updated.modified_at = Utc::now();
        Ok(updated.entry(file))
    }

    async fn download_url(&self, file: &ObjectId) -> Result<String, RemoteError> {
        let inner = self.inner.read();
        inner.object_of_kind(file, ObjectKind::File)?;
        Ok(format!("memory://files/{}/content", file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_list_counts_calls() {
        let remote = MemoryRemote::new();
        let root = remote.default_root();
        remote.insert_folder(&root, "Documents").unwrap();
        remote.insert_file(&root, "a.txt", "data").unwrap();

        let children = remote.list_children(&root).await.unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name, "Documents");
        assert_eq!(children[1].name, "a.txt");
        assert_eq!(remote.calls().list_children, 1);
        assert_eq!(remote.calls().total(), 1);
    }

    #[tokio::test]
    async fn test_name_conflict() {
        let remote = MemoryRemote::new();
        let root = remote.default_root();
        remote.create_folder(&root, "dup").await.unwrap();
        let result = remote.create_folder(&root, "dup").await;
        assert!(matches!(result, Err(RemoteError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_path_of() {
        let remote = MemoryRemote::new();
        let root = remote.default_root();
        let a = remote.insert_folder(&root, "a").unwrap();
        let b = remote.insert_folder(&a.id, "b").unwrap();

        assert!(remote.path_of(&root).await.unwrap().is_empty());
        assert_eq!(remote.path_of(&b.id).await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_delete_is_recursive() {
        let remote = MemoryRemote::new();
        let root = remote.default_root();
        let a = remote.insert_folder(&root, "a").unwrap();
        let f = remote.insert_file(&a.id, "f.txt", "x").unwrap();

        remote.delete_object(&a).await.unwrap();
        assert!(!remote.contains(&a.id));
        assert!(!remote.contains(&f.id));
    }

    #[tokio::test]
    async fn test_delete_wrong_kind_is_not_found() {
        let remote = MemoryRemote::new();
        let root = remote.default_root();
        let a = remote.insert_folder(&root, "a").unwrap();

        let result = remote.delete_object(&RemoteObjectRef::file(a.id.clone())).await;
        assert!(matches!(result, Err(RemoteError::NotFound(_))));
        assert!(remote.contains(&a.id));
    }

    #[tokio::test]
    async fn test_move_into_self_rejected() {
        let remote = MemoryRemote::new();
        let root = remote.default_root();
        let a = remote.insert_folder(&root, "a").unwrap();
        let b = remote.insert_folder(&a.id, "b").unwrap();

        let result = remote.move_object(&a, &b.id, "a").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_read_range() {
        let remote = MemoryRemote::new();
        let root = remote.default_root();
        let f = remote.insert_file(&root, "f.txt", "hello world").unwrap();

        let chunks: Vec<Bytes> = remote
            .open_read(&f.id, Some(6..11))
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks.concat(), b"world");
    }

    #[tokio::test]
    async fn test_copy_folder_is_deep() {
        let remote = MemoryRemote::new();
        let root = remote.default_root();
        let a = remote.insert_folder(&root, "a").unwrap();
        remote.insert_file(&a.id, "f.txt", "x").unwrap();

        let copy = remote.copy_object(&a, &root, "b").await.unwrap();
        assert_ne!(copy.object.id, a.id);
        let children = remote.list_children(&copy.object.id).await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "f.txt");
    }
}
