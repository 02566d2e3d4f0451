use std::collections::BTreeMap;
use std::ops::Range;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use serde::Serialize;

use super::cache::IdentifierCache;
use super::config::FsConfig;
use super::error::FsError;
use super::mutation::Coordinator;
use super::path::{CanonicalPath, PathNormalizer};
use super::resolver::Resolver;
use crate::remote::{
    ByteStream, ObjectId, ObjectKind, RemoteClient, RemoteEntry, RemoteError, RemoteObjectRef,
};

/// Metadata for a single file or folder, keyed by its root-relative path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryInfo {
    pub path: CanonicalPath,
    pub name: String,
    pub kind: ObjectKind,
    pub id: ObjectId,
    pub size: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl EntryInfo {
    fn new(path: CanonicalPath, entry: RemoteEntry) -> Self {
        Self {
            path,
            name: entry.name,
            kind: entry.object.kind,
            id: entry.object.id,
            size: entry.size,
            created_at: entry.created_at,
            modified_at: entry.modified_at,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == ObjectKind::Folder
    }
}

/// Path-based view over an ID-addressed remote store.
///
/// Every raw path is normalized at the boundary; everything underneath
///  works on [`CanonicalPath`]s. Methods take `&mut self` because even
///  reads may grow the identifier cache.
pub struct BoxFs<C> {
    normalizer: PathNormalizer,
    coordinator: Coordinator<C>,
}

impl<C: RemoteClient> BoxFs<C> {
    /// Build a filesystem handle over `client`.
    ///
    /// The root is picked from `config`: an explicit root id wins (its path
    ///  is looked up from the store), otherwise a root path is resolved from
    ///  the store's default root, otherwise the default root itself is used.
    ///  The configured path map is seeded into the cache afterwards.
    pub async fn new(client: C, config: FsConfig) -> Result<Self, FsError> {
        let matching = config.name_matching;
        let default_root = RemoteObjectRef::folder(client.default_root());

        let (client, root, root_path) = match (config.root_id, config.root_path) {
            (Some(id), _) => {
                let names = client.path_of(&id).await?;
                (client, RemoteObjectRef::folder(id), CanonicalPath::from_segments(names))
            }
            (None, Some(raw)) => {
                let root_path = PathNormalizer::new(CanonicalPath::root(), matching).normalize(&raw)?;
                let mut lookup = Resolver::new(client, default_root, matching);
                let root = lookup.resolve_folder(&root_path).await?;
                (lookup.into_client(), root, root_path)
            }
            (None, None) => (client, default_root, CanonicalPath::root()),
        };
        tracing::debug!("filesystem root is '{}' ({})", root_path, root.id);

        let normalizer = PathNormalizer::new(root_path, matching);
        let mut resolver = Resolver::new(client, root, matching);
        for (raw, target) in &config.path_map {
            let path = normalizer.normalize(raw)?;
            resolver.seed(path, target.to_ref());
        }

        Ok(Self {
            normalizer,
            coordinator: Coordinator::new(resolver),
        })
    }

    pub fn normalize(&self, raw: &str) -> Result<CanonicalPath, FsError> {
        Ok(self.normalizer.normalize(raw)?)
    }

    pub fn root(&self) -> &RemoteObjectRef {
        self.coordinator.resolver().root()
    }

    /// Where the root lives, relative to the store's default root
    pub fn root_path(&self) -> &CanonicalPath {
        self.normalizer.root_prefix()
    }

    pub fn client(&self) -> &C {
        self.coordinator.resolver().client()
    }

    pub fn cache(&self) -> &IdentifierCache {
        self.coordinator.resolver().cache()
    }

    /// Forget every cached mapping, e.g. after external changes
    pub fn invalidate_cache(&mut self) {
        self.resolver().cache_mut().clear();
    }

    fn resolver(&mut self) -> &mut Resolver<C> {
        self.coordinator.resolver_mut()
    }

    pub async fn resolve(&mut self, raw: &str) -> Result<RemoteObjectRef, FsError> {
        let path = self.normalize(raw)?;
        self.resolver().resolve(&path).await
    }

    pub async fn exists(&mut self, raw: &str) -> Result<bool, FsError> {
        let path = self.normalize(raw)?;
        self.exists_path(&path).await
    }

    async fn exists_path(&mut self, path: &CanonicalPath) -> Result<bool, FsError> {
        match self.resolver().resolve(path).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_missing() => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub async fn info(&mut self, raw: &str) -> Result<EntryInfo, FsError> {
        let path = self.normalize(raw)?;
        let object = self.resolver().resolve(&path).await?;
        let entry = self.client().stat(&object.id).await?;
        Ok(EntryInfo::new(path, entry))
    }

    /// List a folder. Listing a file yields just that file.
    pub async fn ls(&mut self, raw: &str) -> Result<BTreeMap<CanonicalPath, EntryInfo>, FsError> {
        let path = self.normalize(raw)?;
        self.ls_path(&path).await
    }

    async fn ls_path(
        &mut self,
        path: &CanonicalPath,
    ) -> Result<BTreeMap<CanonicalPath, EntryInfo>, FsError> {
        let object = self.resolver().resolve(path).await?;

        if object.is_file() {
            let entry = self.client().stat(&object.id).await?;
            return Ok(BTreeMap::from([(path.clone(), EntryInfo::new(path.clone(), entry))]));
        }

        let children = self.client().list_children(&object.id).await?;
        self.resolver().record_listing(path, &children);

        Ok(children
            .into_iter()
            .map(|child| {
                let child_path = path.join(child.name.clone());
                (child_path.clone(), EntryInfo::new(child_path, child))
            })
            .collect())
    }

    /// List everything below a folder, recursively
    pub async fn ls_deep(
        &mut self,
        raw: &str,
    ) -> Result<BTreeMap<CanonicalPath, EntryInfo>, FsError> {
        let path = self.normalize(raw)?;
        let mut all = BTreeMap::new();
        let mut pending = vec![path];

        while let Some(folder) = pending.pop() {
            for (child_path, info) in self.ls_path(&folder).await? {
                if info.is_dir() && child_path != folder {
                    pending.push(child_path.clone());
                }
                all.insert(child_path, info);
            }
        }
        Ok(all)
    }

    /// Create a folder. Existing folders are left alone; missing parents
    ///  are created only if `create_parents` is set.
    pub async fn mkdir(&mut self, raw: &str, create_parents: bool) -> Result<(), FsError> {
        let path = self.normalize(raw)?;

        // once one level is missing every deeper level is too
        let mut missing = false;
        for depth in 1..=path.len() {
            let prefix = path.prefix(depth);
            let is_target = depth == path.len();

            if !missing {
                match self.resolver().resolve(&prefix).await {
                    Ok(object) if object.is_folder() => continue,
                    Ok(_) if is_target => return Err(FsError::AlreadyExists(prefix)),
                    Ok(_) => return Err(FsError::NotADirectory(prefix)),
                    Err(FsError::NotFound(_)) => missing = true,
                    Err(err) => return Err(err),
                }
            }

            if !is_target && !create_parents {
                return Err(FsError::NotFound(prefix));
            }
            self.coordinator.create_folder(&prefix).await?;
        }
        Ok(())
    }

    pub async fn makedirs(&mut self, raw: &str, exist_ok: bool) -> Result<(), FsError> {
        let path = self.normalize(raw)?;
        if self.exists_path(&path).await? {
            if exist_ok {
                return Ok(());
            }
            return Err(FsError::AlreadyExists(path));
        }
        self.mkdir(raw, true).await
    }

    /// Remove a single file
    pub async fn rm_file(&mut self, raw: &str) -> Result<(), FsError> {
        let path = self.normalize(raw)?;
        let object = self.resolver().resolve(&path).await?;
        if object.is_folder() {
            return Err(FsError::IsADirectory(path));
        }
        self.coordinator.delete(&path).await?;
        Ok(())
    }

    /// Remove a folder and everything in it
    pub async fn rmdir(&mut self, raw: &str) -> Result<(), FsError> {
        let path = self.normalize(raw)?;
        let object = self.resolver().resolve(&path).await?;
        if object.is_file() {
            return Err(FsError::NotADirectory(path));
        }
        self.coordinator.delete(&path).await?;
        Ok(())
    }

    /// Remove whatever lives at the path
    pub async fn rm(&mut self, raw: &str) -> Result<(), FsError> {
        let path = self.normalize(raw)?;
        self.coordinator.delete(&path).await?;
        Ok(())
    }

    /// Move or rename. The destination must not exist yet.
    pub async fn mv(&mut self, from: &str, to: &str) -> Result<RemoteObjectRef, FsError> {
        let from = self.normalize(from)?;
        let to = self.normalize(to)?;
        // inside-self and respelled destinations are left to the coordinator
        let matching = self.normalizer.matching();
        if !matching.within(&to, &from) && self.exists_path(&to).await? {
            return Err(FsError::AlreadyExists(to));
        }
        self.coordinator.rename(&from, &to).await
    }

    /// Copy a file or folder. Refuses to overwrite an existing destination,
    ///  since replacing it remotely could drop its version history.
    pub async fn cp_file(&mut self, from: &str, to: &str) -> Result<RemoteObjectRef, FsError> {
        let from = self.normalize(from)?;
        let to = self.normalize(to)?;
        if !self.normalizer.matching().within(&to, &from) && self.exists_path(&to).await? {
            return Err(FsError::AlreadyExists(to));
        }
        self.coordinator.copy(&from, &to).await
    }

    /// Open a read stream over a file's contents
    pub async fn open_read(&mut self, raw: &str) -> Result<ByteStream, FsError> {
        self.open_range(raw, None).await
    }

    async fn open_range(
        &mut self,
        raw: &str,
        range: Option<Range<u64>>,
    ) -> Result<ByteStream, FsError> {
        let path = self.normalize(raw)?;
        let object = self.resolver().resolve(&path).await?;
        if object.is_folder() {
            return Err(FsError::IsADirectory(path));
        }
        Ok(self.client().open_read(&object.id, range).await?)
    }

    pub async fn cat(&mut self, raw: &str) -> Result<Bytes, FsError> {
        let stream = self.open_range(raw, None).await?;
        Ok(collect(stream).await?)
    }

    pub async fn cat_range(&mut self, raw: &str, range: Range<u64>) -> Result<Bytes, FsError> {
        let stream = self.open_range(raw, Some(range)).await?;
        Ok(collect(stream).await?)
    }

    /// Write a whole file. With `overwrite`, an existing file gets a new
    ///  version; without it, an existing file is an error.
    pub async fn write(
        &mut self,
        raw: &str,
        data: impl Into<Bytes>,
        overwrite: bool,
    ) -> Result<EntryInfo, FsError> {
        let path = self.normalize(raw)?;
        let entry = self
            .coordinator
            .write_file(&path, data.into(), overwrite)
            .await?;
        Ok(EntryInfo::new(path, entry))
    }

    /// Create an empty file if nothing exists at the path. Never truncates.
    pub async fn touch(&mut self, raw: &str) -> Result<(), FsError> {
        let path = self.normalize(raw)?;
        if self.exists_path(&path).await? {
            return Ok(());
        }
        self.coordinator
            .write_file(&path, Bytes::new(), false)
            .await?;
        Ok(())
    }

    pub async fn created(&mut self, raw: &str) -> Result<Option<DateTime<Utc>>, FsError> {
        Ok(self.info(raw).await?.created_at)
    }

    pub async fn modified(&mut self, raw: &str) -> Result<Option<DateTime<Utc>>, FsError> {
        Ok(self.info(raw).await?.modified_at)
    }

    /// A URL the file's contents can be downloaded from
    pub async fn sign(&mut self, raw: &str) -> Result<String, FsError> {
        let path = self.normalize(raw)?;
        let object = self.resolver().resolve(&path).await?;
        if object.is_folder() {
            return Err(FsError::IsADirectory(path));
        }
        Ok(self.client().download_url(&object.id).await?)
    }
}

async fn collect(stream: ByteStream) -> Result<Bytes, RemoteError> {
    let buf = stream
        .try_fold(Vec::new(), |mut buf, chunk| async move {
            buf.extend_from_slice(&chunk);
            Ok(buf)
        })
        .await?;
    Ok(Bytes::from(buf))
}
