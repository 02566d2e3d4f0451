use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::path::NameMatching;
use crate::remote::{ObjectId, ObjectKind, RemoteObjectRef};

/// Target of a pre-seeded path mapping.
///
/// A bare identifier is taken to be a folder, since seeding exists to
///  shortcut directory navigation. Files need the explicit form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathMapTarget {
    Id(ObjectId),
    Object { id: ObjectId, kind: ObjectKind },
}

impl PathMapTarget {
    pub fn to_ref(&self) -> RemoteObjectRef {
        match self {
            PathMapTarget::Id(id) => RemoteObjectRef::folder(id.clone()),
            PathMapTarget::Object { id, kind } => RemoteObjectRef::new(id.clone(), *kind),
        }
    }
}

/// Configuration for a [`BoxFs`](super::BoxFs) handle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsConfig {
    /// Identifier of the folder the filesystem is rooted at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_id: Option<ObjectId>,
    /// Path of the root folder, relative to the store's default root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_path: Option<String>,
    /// Known path -> identifier mappings, relative to the filesystem root
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub path_map: BTreeMap<String, PathMapTarget>,
    /// How child names are matched while resolving paths
    #[serde(default)]
    pub name_matching: NameMatching,
}

impl FsConfig {
    pub fn with_root_id(mut self, id: impl Into<ObjectId>) -> Self {
        self.root_id = Some(id.into());
        self
    }

    pub fn with_root_path(mut self, path: impl Into<String>) -> Self {
        self.root_path = Some(path.into());
        self
    }

    pub fn with_path_map_entry(mut self, path: impl Into<String>, target: PathMapTarget) -> Self {
        self.path_map.insert(path.into(), target);
        self
    }

    pub fn with_name_matching(mut self, matching: NameMatching) -> Self {
        self.name_matching = matching;
        self
    }
}
