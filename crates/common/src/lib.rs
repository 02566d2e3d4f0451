/**
 * Path-addressed filesystem layered over an
 *  ID-addressed remote store.
 * Normalizes paths, caches path -> identifier
 *  mappings and keeps them consistent across
 *  structural changes.
 */
pub mod fs;
/**
 * Capability interface over the remote store,
 *  plus an in-memory implementation for tests
 *  and offline use.
 */
pub mod remote;

pub mod prelude {
    pub use crate::fs::{BoxFs, CanonicalPath, EntryInfo, FsConfig, FsError, NameMatching};
    pub use crate::remote::{
        MemoryRemote, ObjectId, ObjectKind, RemoteClient, RemoteError, RemoteObjectRef,
    };
}
