use bytes::Bytes;

use super::error::FsError;
use super::path::CanonicalPath;
use super::resolver::Resolver;
use crate::remote::{RemoteClient, RemoteEntry, RemoteObjectRef};

/// Applies structural changes to the remote store and mirrors them in the
///  resolver's cache.
///
/// Every operation resolves what it needs first, then calls the remote
///  client, and only touches the cache once that call has succeeded. A
///  failed remote call leaves the cache exactly as it was.
pub struct Coordinator<C> {
    resolver: Resolver<C>,
}

impl<C: RemoteClient> Coordinator<C> {
    pub fn new(resolver: Resolver<C>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &Resolver<C> {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut Resolver<C> {
        &mut self.resolver
    }

    /// Split a non-root path into its parent and final name
    fn split<'a>(
        path: &'a CanonicalPath,
        op: &'static str,
    ) -> Result<(CanonicalPath, &'a str), FsError> {
        match (path.parent(), path.name()) {
            (Some(parent), Some(name)) => Ok((parent, name)),
            _ => Err(FsError::RootOperation(op)),
        }
    }

    pub async fn create_folder(&mut self, path: &CanonicalPath) -> Result<RemoteObjectRef, FsError> {
        let (parent_path, name) = Self::split(path, "create")?;
        let parent = self.resolver.resolve_folder(&parent_path).await?;

        let entry = self.resolver.client().create_folder(&parent.id, name).await?;

        tracing::info!("created folder {} ({})", path, entry.object.id);
        self.resolver.cache_mut().put(path.clone(), entry.object.clone());
        Ok(entry.object)
    }

    /// Delete the object at `path`. Returns the reference that was removed.
    pub async fn delete(&mut self, path: &CanonicalPath) -> Result<RemoteObjectRef, FsError> {
        if path.is_root() {
            return Err(FsError::RootOperation("delete"));
        }
        let target = self.resolver.resolve(path).await?;

        self.resolver.client().delete_object(&target).await?;

        let cache = self.resolver.cache_mut();
        if target.is_folder() {
            let dropped = cache.invalidate_subtree(path);
            tracing::debug!("dropped {} cached entries under {}", dropped, path);
        } else {
            cache.invalidate(path);
        }
        tracing::info!("deleted {} ({})", path, target);
        Ok(target)
    }

    /// Move and/or rename `from` to `to`.
    ///
    /// The destination's parent must already exist as a folder. Identifiers
    ///  survive the move, so the cached subtree is relabeled rather than
    ///  dropped.
    pub async fn rename(
        &mut self,
        from: &CanonicalPath,
        to: &CanonicalPath,
    ) -> Result<RemoteObjectRef, FsError> {
        if from.is_root() {
            return Err(FsError::RootOperation("move"));
        }
        // a case-only rename under case-insensitive matching is fine
        let matching = self.resolver.matching();
        if !matching.is_respelling(from, to) && matching.within(to, from) {
            return Err(FsError::MoveIntoSelf {
                from: from.clone(),
                to: to.clone(),
            });
        }
        let (parent_path, name) = Self::split(to, "move")?;

        let source = self.resolver.resolve(from).await?;
        let parent = self.resolver.resolve_folder(&parent_path).await?;

        let entry = self
            .resolver
            .client()
            .move_object(&source, &parent.id, name)
            .await?;

        let cache = self.resolver.cache_mut();
        let relocated = cache.relocate(from, to);
        if entry.object != source {
            tracing::warn!(
                "remote store reported a new reference for moved object: {} -> {}",
                source,
                entry.object
            );
            cache.put(to.clone(), entry.object.clone());
        }
        tracing::info!("moved {} -> {} ({} cached entries)", from, to, relocated);
        Ok(entry.object)
    }

    /// Copy `from` to `to`. The copy gets fresh identifiers, so only its
    ///  top-level reference is cached.
    pub async fn copy(
        &mut self,
        from: &CanonicalPath,
        to: &CanonicalPath,
    ) -> Result<RemoteObjectRef, FsError> {
        if from.is_root() {
            return Err(FsError::RootOperation("copy"));
        }
        if self.resolver.matching().within(to, from) {
            return Err(FsError::MoveIntoSelf {
                from: from.clone(),
                to: to.clone(),
            });
        }
        let (parent_path, name) = Self::split(to, "copy")?;

        let source = self.resolver.resolve(from).await?;
        let parent = self.resolver.resolve_folder(&parent_path).await?;

        let entry = self
            .resolver
            .client()
            .copy_object(&source, &parent.id, name)
            .await?;

        tracing::info!("copied {} -> {} ({})", from, to, entry.object.id);
        let cache = self.resolver.cache_mut();
        cache.invalidate_subtree(to);
        cache.put(to.clone(), entry.object.clone());
        Ok(entry.object)
    }

    /// Write `data` as the contents of the file at `path`.
    ///
    /// An existing file gets a new version under the same identifier;
    ///  otherwise a new file is uploaded into the parent folder.
    pub async fn write_file(
        &mut self,
        path: &CanonicalPath,
        data: Bytes,
        overwrite: bool,
    ) -> Result<RemoteEntry, FsError> {
        let (parent_path, name) = Self::split(path, "write")?;
        let parent = self.resolver.resolve_folder(&parent_path).await?;

        let existing = match self.resolver.resolve(path).await {
            Ok(object) => Some(object),
            Err(FsError::NotFound(_)) => None,
            Err(err) => return Err(err),
        };

        let client = self.resolver.client();
        let entry = match existing {
            Some(object) if object.is_folder() => return Err(FsError::IsADirectory(path.clone())),
            Some(_) if !overwrite => return Err(FsError::AlreadyExists(path.clone())),
            Some(object) => client.upload_version(&object.id, data).await?,
            None => client.upload(&parent.id, name, data).await?,
        };

        tracing::info!(
            "wrote {} bytes to {} ({})",
            entry.size,
            path,
            entry.object.id
        );
        self.resolver
            .cache_mut()
            .put(path.clone(), entry.object.clone());
        Ok(entry)
    }
}
