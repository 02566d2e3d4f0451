//! Path to identifier mapping
//!
//! The remote store addresses objects by ID, callers address them by path.
//! This cache remembers the last known mapping between the two so that a
//! resolution only has to ask the remote store about segments it has not
//! seen yet. It is a performance aid, not a source of truth.
//!
//! Not safe for unsynchronized concurrent mutation: callers sharing one
//! cache across tasks must wrap it in their own lock.

use std::collections::HashMap;

use super::path::{CanonicalPath, NameMatching};
use crate::remote::RemoteObjectRef;

/// One cached association, with the path as it was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub path: CanonicalPath,
    pub object: RemoteObjectRef,
}

#[derive(Debug, Clone, Default)]
pub struct IdentifierCache {
    // keyed by the folded path, so lookups honour the name matching policy
    entries: HashMap<CanonicalPath, CacheEntry>,
    matching: NameMatching,
}

impl IdentifierCache {
    pub fn new(matching: NameMatching) -> Self {
        Self {
            entries: HashMap::new(),
            matching,
        }
    }

    pub fn matching(&self) -> NameMatching {
        self.matching
    }

    pub fn get(&self, path: &CanonicalPath) -> Option<RemoteObjectRef> {
        self.entries
            .get(&self.matching.fold(path))
            .map(|entry| entry.object.clone())
    }

    /// Insert or overwrite. Returns the previous reference, if any.
    pub fn put(&mut self, path: CanonicalPath, object: RemoteObjectRef) -> Option<RemoteObjectRef> {
        let key = self.matching.fold(&path);
        self.entries
            .insert(key, CacheEntry { path, object })
            .map(|previous| previous.object)
    }

    /// Drop the entry for exactly `path`; descendants are left alone
    pub fn invalidate(&mut self, path: &CanonicalPath) -> Option<RemoteObjectRef> {
        self.entries
            .remove(&self.matching.fold(path))
            .map(|entry| entry.object)
    }

    /// Drop `path` and every entry below it. Returns how many were removed.
    pub fn invalidate_subtree(&mut self, path: &CanonicalPath) -> usize {
        let key = self.matching.fold(path);
        let before = self.entries.len();
        self.entries.retain(|cached, _| !cached.starts_with(&key));
        before - self.entries.len()
    }

    /// Move every entry at or below `old` to the same suffix below `new`,
    ///  keeping identifiers unchanged.
    ///
    /// Whatever was cached at or below `new` is replaced wholesale.
    ///  Returns how many entries were relocated.
    pub fn relocate(&mut self, old: &CanonicalPath, new: &CanonicalPath) -> usize {
        let old_key = self.matching.fold(old);
        let moved_keys: Vec<CanonicalPath> = self
            .entries
            .keys()
            .filter(|cached| cached.starts_with(&old_key))
            .cloned()
            .collect();

        let moved: Vec<CacheEntry> = moved_keys
            .iter()
            .filter_map(|key| self.entries.remove(key))
            .collect();

        self.invalidate_subtree(new);

        let mut relocated = 0;
        for entry in moved {
            let written_old = entry.path.prefix(old.len());
            if let Some(path) = entry.path.rebase(&written_old, new) {
                self.put(path, entry.object);
                relocated += 1;
            }
        }
        relocated
    }

    /// The deepest cached prefix of `path`, including `path` itself.
    ///  Returns the prefix depth along with its reference.
    pub fn deepest_cached(&self, path: &CanonicalPath) -> Option<(usize, RemoteObjectRef)> {
        (1..=path.len())
            .rev()
            .find_map(|depth| self.get(&path.prefix(depth)).map(|object| (depth, object)))
    }

    /// Cached direct children of `folder`, as written
    pub fn children(&self, folder: &CanonicalPath) -> Vec<CanonicalPath> {
        let key = self.matching.fold(folder);
        self.entries
            .iter()
            .filter(|(cached, _)| cached.parent().as_ref() == Some(&key))
            .map(|(_, entry)| entry.path.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Snapshot of all entries, ordered by path
    pub fn entries(&self) -> Vec<CacheEntry> {
        let mut entries: Vec<CacheEntry> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }
}
