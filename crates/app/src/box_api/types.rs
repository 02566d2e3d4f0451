use chrono::{DateTime, Utc};
use common::remote::{ObjectKind, RemoteEntry, RemoteObjectRef};
use serde::{Deserialize, Serialize};

/// Identifier of the "All Files" folder every Box account has
pub const ROOT_FOLDER_ID: &str = "0";

/// Fields requested for every item, so listings carry enough to build entries
pub const ITEM_FIELDS: &str = "type,id,name,size,created_at,modified_at,path_collection";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    File,
    Folder,
    WebLink,
}

/// A file, folder or web link as returned by the API
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub path_collection: Option<PathCollection>,
}

impl Item {
    pub fn kind(&self) -> Option<ObjectKind> {
        match self.item_type {
            ItemType::File => Some(ObjectKind::File),
            ItemType::Folder => Some(ObjectKind::Folder),
            ItemType::WebLink => None,
        }
    }

    /// Web links have no filesystem counterpart and map to `None`
    pub fn to_entry(&self) -> Option<RemoteEntry> {
        let kind = self.kind()?;
        Some(RemoteEntry {
            name: self.name.clone(),
            object: RemoteObjectRef::new(self.id.as_str(), kind),
            size: self.size.unwrap_or(0),
            created_at: self.created_at,
            modified_at: self.modified_at,
        })
    }

    /// Folder names from below "All Files" down to this item
    pub fn path_names(&self) -> Vec<String> {
        if self.id == ROOT_FOLDER_ID {
            return Vec::new();
        }
        let mut names: Vec<String> = self
            .path_collection
            .iter()
            .flat_map(|collection| collection.entries.iter())
            .filter(|ancestor| ancestor.id != ROOT_FOLDER_ID)
            .map(|ancestor| ancestor.name.clone())
            .collect();
        names.push(self.name.clone());
        names
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathCollection {
    #[serde(default)]
    pub entries: Vec<PathItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// One page of folder items, or the result of an upload
#[derive(Debug, Clone, Deserialize)]
pub struct ItemCollection {
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub entries: Vec<Item>,
}

/// Error body Box sends with non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// A readable message from a raw error body, falling back to the body itself
    pub fn describe(raw: &str) -> String {
        match serde_json::from_str::<ErrorBody>(raw) {
            Ok(ErrorBody {
                code: Some(code),
                message: Some(message),
            }) => format!("{}: {}", code, message),
            Ok(ErrorBody {
                message: Some(message),
                ..
            }) => message,
            _ => raw.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParentRef<'a> {
    pub id: &'a str,
}

/// Body for creating, moving, copying and uploading: a name plus a parent
#[derive(Debug, Clone, Serialize)]
pub struct NamedInParent<'a> {
    pub name: &'a str,
    pub parent: ParentRef<'a>,
}

impl<'a> NamedInParent<'a> {
    pub fn new(name: &'a str, parent: &'a str) -> Self {
        Self {
            name,
            parent: ParentRef { id: parent },
        }
    }
}

/// Request body opening an upload session, for a new file or a new version
#[derive(Debug, Clone, Serialize)]
pub struct NewUploadSession<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<&'a str>,
    pub file_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadSession {
    pub id: String,
    pub part_size: u64,
    #[serde(default)]
    pub total_parts: Option<u64>,
}

/// A part the server has accepted; echoed back verbatim on commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadPart {
    pub part_id: String,
    pub offset: u64,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadedPart {
    pub part: UploadPart,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitSession<'a> {
    pub parts: &'a [UploadPart],
}
