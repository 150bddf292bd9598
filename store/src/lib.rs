//! Cache namespace storage for Larder.
//!
//! A store holds named namespaces; each namespace maps a request key to
//! a stored response snapshot. Namespace names carry version tokens, so
//! invalidation is "bump the token, prune the old names" rather than
//! per-entry expiry.
//!
//! Two backends are provided: [`MemoryCacheStore`], the reference
//! implementation (and the one tests inject), and [`FsCacheStore`],
//! which persists one directory per namespace with a metadata/body file
//! pair per entry.

mod fs;
mod key;
mod memory;
mod response;

pub use fs::FsCacheStore;
pub use key::RequestKey;
pub use memory::MemoryCacheStore;
pub use response::StoredResponse;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Storage backend error.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Underlying I/O failure.
    #[error("storage i/o error: {0}")]
    Io(String),
    /// Namespace name is not usable by this backend.
    #[error("invalid namespace name: {0}")]
    InvalidName(String),
    /// Stored entry metadata could not be decoded.
    #[error("corrupt cache entry: {0}")]
    Corrupt(String),
}

/// A named mapping from request keys to stored response snapshots.
///
/// Entries are immutable once written; storing under an existing key
/// replaces the previous snapshot as a whole.
#[async_trait]
pub trait Namespace: Send + Sync {
    /// The namespace name this handle is bound to.
    fn name(&self) -> &str;

    /// Look up a snapshot by key. A miss is `Ok(None)`.
    async fn lookup(&self, key: &RequestKey) -> Result<Option<StoredResponse>, StoreError>;

    /// Store a snapshot under a key, replacing any previous entry.
    async fn store(&self, key: &RequestKey, response: StoredResponse) -> Result<(), StoreError>;

    /// Remove an entry. Returns whether it existed.
    async fn remove(&self, key: &RequestKey) -> Result<bool, StoreError>;

    /// All keys currently present, in key order.
    async fn keys(&self) -> Result<Vec<RequestKey>, StoreError>;

    /// Number of entries.
    async fn len(&self) -> Result<usize, StoreError>;

    /// Whether the namespace has no entries.
    async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len().await? == 0)
    }
}

/// A collection of named namespaces.
///
/// The engine owns exactly two live namespaces (precache and runtime)
/// but the store itself is name-agnostic: older versions linger here
/// until a prune sweeps them out.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Open a namespace, creating it if absent.
    async fn open(&self, name: &str) -> Result<Arc<dyn Namespace>, StoreError>;

    /// Whether a namespace exists.
    async fn has(&self, name: &str) -> Result<bool, StoreError>;

    /// Delete a namespace and everything in it. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool, StoreError>;

    /// Names of all namespaces, in sorted order.
    async fn list_names(&self) -> Result<Vec<String>, StoreError>;
}
