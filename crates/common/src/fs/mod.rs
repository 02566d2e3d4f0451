//! Path-addressed view over an ID-addressed remote store
//!
//! Remote stores like Box address every object by an opaque identifier;
//! there is no "open this path" call. This module layers a conventional
//! path namespace on top:
//!
//! - **[`PathNormalizer`]**: turns raw user paths into [`CanonicalPath`]s
//! - **[`IdentifierCache`]**: remembers which identifier lives at which path
//! - **[`Resolver`]**: walks the remote tree to translate a path, paying one
//!   listing per segment the cache has not seen yet
//! - **[`Coordinator`]**: applies structural changes remotely and keeps the
//!   cache consistent with them
//! - **[`BoxFs`]**: the filesystem-style surface built from the pieces above
//!
//! # Cache consistency
//!
//! The cache is only ever updated after the remote call it reflects has
//! succeeded, and negative lookups are never recorded. Changes made to the
//! store by anyone else are invisible until the affected paths are
//! invalidated (see [`BoxFs::invalidate_cache`]).
//!
//! ```text
//!   "box://Docs\\a.txt"
//!          |
//!     PathNormalizer --> ["Docs", "a.txt"]
//!          |
//!       Resolver  <--->  IdentifierCache
//!          |
//!     RemoteClient (list_children per uncached segment)
//! ```

mod cache;
mod config;
mod error;
mod filesystem;
mod mutation;
mod path;
mod resolver;

pub use cache::{CacheEntry, IdentifierCache};
pub use config::{FsConfig, PathMapTarget};
pub use error::FsError;
pub use filesystem::{BoxFs, EntryInfo};
pub use mutation::Coordinator;
pub use path::{CanonicalPath, NameMatching, PathError, PathNormalizer, PROTOCOL};
pub use resolver::Resolver;
