use super::path::{CanonicalPath, PathError};
use crate::remote::RemoteError;

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("default error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),
    #[error("path not found: {0}")]
    NotFound(CanonicalPath),
    #[error("not a directory: {0}")]
    NotADirectory(CanonicalPath),
    #[error("is a directory: {0}")]
    IsADirectory(CanonicalPath),
    #[error("path already exists: {0}")]
    AlreadyExists(CanonicalPath),
    #[error("cannot move '{from}' to '{to}': destination is inside source")]
    MoveIntoSelf {
        from: CanonicalPath,
        to: CanonicalPath,
    },
    #[error("cannot {0} the filesystem root")]
    RootOperation(&'static str),
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),
}

impl FsError {
    /// True for the errors that mean "nothing usable lives at this path"
    pub fn is_missing(&self) -> bool {
        matches!(self, FsError::NotFound(_) | FsError::NotADirectory(_))
    }
}
