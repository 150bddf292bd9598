//! In-Memory Store Backend
//!
//! BTree maps behind async locks. The reference backend: every other
//! backend must be observationally equivalent to this one, and tests
//! inject it wherever a store is needed.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{CacheStore, Namespace, RequestKey, StoreError, StoredResponse};

/// A single in-memory namespace.
pub struct MemoryNamespace {
    /// Namespace name.
    name: String,
    /// key → snapshot.
    entries: RwLock<BTreeMap<RequestKey, StoredResponse>>,
}

impl MemoryNamespace {
    fn new(name: &str) -> Self {
        Self {
            name: String::from(name),
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

#[async_trait]
impl Namespace for MemoryNamespace {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, key: &RequestKey) -> Result<Option<StoredResponse>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn store(&self, key: &RequestKey, response: StoredResponse) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.clone(), response);
        Ok(())
    }

    async fn remove(&self, key: &RequestKey) -> Result<bool, StoreError> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn keys(&self) -> Result<Vec<RequestKey>, StoreError> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.read().await.len())
    }
}

/// In-memory cache store.
///
/// `open` hands out shared handles: two opens of the same name see the
/// same entries. A handle obtained before `delete` keeps its detached
/// entries alive, which is why the engine reopens by name per request.
#[derive(Default)]
pub struct MemoryCacheStore {
    /// name → namespace.
    namespaces: RwLock<BTreeMap<String, Arc<MemoryNamespace>>>,
}

impl MemoryCacheStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn open(&self, name: &str) -> Result<Arc<dyn Namespace>, StoreError> {
        let mut namespaces = self.namespaces.write().await;
        let namespace = namespaces
            .entry(String::from(name))
            .or_insert_with(|| Arc::new(MemoryNamespace::new(name)));
        Ok(Arc::clone(namespace) as Arc<dyn Namespace>)
    }

    async fn has(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.namespaces.read().await.contains_key(name))
    }

    async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.namespaces.write().await.remove(name).is_some())
    }

    async fn list_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.namespaces.read().await.keys().cloned().collect())
    }
}
