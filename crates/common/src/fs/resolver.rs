use std::collections::HashSet;

use super::cache::IdentifierCache;
use super::error::FsError;
use super::path::{CanonicalPath, NameMatching};
use crate::remote::{RemoteClient, RemoteEntry, RemoteObjectRef};

/// Maps canonical paths to remote references.
///
/// Resolution starts from the deepest cached prefix of the requested path
///  and walks the remaining segments with one `list_children` call each,
///  so repeated lookups under a shared ancestor only pay for segments that
///  have never been seen.
///
/// Owns its cache outright. Not safe for unsynchronized concurrent use.
pub struct Resolver<C> {
    client: C,
    root: RemoteObjectRef,
    cache: IdentifierCache,
}

impl<C: RemoteClient> Resolver<C> {
    pub fn new(client: C, root: RemoteObjectRef, matching: NameMatching) -> Self {
        Self {
            client,
            root,
            cache: IdentifierCache::new(matching),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_client(self) -> C {
        self.client
    }

    pub fn root(&self) -> &RemoteObjectRef {
        &self.root
    }

    pub fn cache(&self) -> &IdentifierCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut IdentifierCache {
        &mut self.cache
    }

    pub fn matching(&self) -> NameMatching {
        self.cache.matching()
    }

    /// Pre-seed a known mapping. Inserted verbatim, never verified.
    pub fn seed(&mut self, path: CanonicalPath, object: RemoteObjectRef) {
        if path.is_root() {
            tracing::warn!("ignoring seed for the root path ({})", object);
            return;
        }
        tracing::debug!("seeding {} -> {}", path, object);
        self.cache.put(path, object);
    }

    /// Resolve `path` to its remote reference.
    ///
    /// Segments discovered along the way are committed to the cache only
    ///  once the whole path resolves, so a failed resolution leaves the
    ///  cache untouched. Misses are never cached.
    pub async fn resolve(&mut self, path: &CanonicalPath) -> Result<RemoteObjectRef, FsError> {
        if path.is_root() {
            return Ok(self.root.clone());
        }

        let (start, mut current) = match self.cache.deepest_cached(path) {
            Some((depth, object)) if depth == path.len() => {
                tracing::trace!("cache hit for {}", path);
                return Ok(object);
            }
            Some((depth, object)) => (depth, object),
            None => (0, self.root.clone()),
        };

        let mut discovered = Vec::with_capacity(path.len() - start);
        for depth in start..path.len() {
            let walked = path.prefix(depth);
            if !current.is_folder() {
                return Err(FsError::NotADirectory(walked));
            }

            let segment = &path.segments()[depth];
            tracing::debug!("listing {} ({}) to find {:?}", walked, current.id, segment);
            let children = self.client.list_children(&current.id).await?;

            let matching = self.matching();
            let found = children
                .into_iter()
                .find(|child| matching.matches(&child.name, segment))
                .ok_or_else(|| FsError::NotFound(path.prefix(depth + 1)))?;

            current = found.object;
            discovered.push((path.prefix(depth + 1), current.clone()));
        }

        for (prefix, object) in discovered {
            self.cache.put(prefix, object);
        }
        Ok(current)
    }

    /// Resolve `path` and require it to be a folder
    pub async fn resolve_folder(
        &mut self,
        path: &CanonicalPath,
    ) -> Result<RemoteObjectRef, FsError> {
        let object = self.resolve(path).await?;
        if !object.is_folder() {
            return Err(FsError::NotADirectory(path.clone()));
        }
        Ok(object)
    }

    /// Bring the cached children of `folder` in line with a successful
    ///  listing of it.
    ///
    /// Cached children the listing no longer contains are dropped along with
    ///  their subtrees, as are subtrees whose top-level reference changed.
    pub fn record_listing(&mut self, folder: &CanonicalPath, children: &[RemoteEntry]) {
        let matching = self.matching();
        let listed: HashSet<CanonicalPath> = children
            .iter()
            .map(|child| matching.fold(&folder.join(child.name.clone())))
            .collect();

        for cached in self.cache.children(folder) {
            if !listed.contains(&matching.fold(&cached)) {
                let dropped = self.cache.invalidate_subtree(&cached);
                tracing::debug!("{} is gone remotely, dropped {} cached entries", cached, dropped);
            }
        }

        for child in children {
            let path = folder.join(child.name.clone());
            if self.cache.get(&path).is_some_and(|known| known != child.object) {
                self.cache.invalidate_subtree(&path);
            }
            self.cache.put(path, child.object.clone());
        }
    }
}
