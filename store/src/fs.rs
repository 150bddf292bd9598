//! Filesystem Store Backend
//!
//! Persists namespaces under a root directory:
//!
//!   - `{root}/{namespace}/{hash}.meta.json`: key, status, headers
//!   - `{root}/{namespace}/{hash}.body`: raw body bytes
//!
//! `{hash}` is the SHA-256 hex digest of `"{method}\n{url}"`, so entry
//! file names stay valid no matter what characters the URL contains.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::sync::Mutex;

use crate::{CacheStore, Namespace, RequestKey, StoreError, StoredResponse};

const META_SUFFIX: &str = ".meta.json";
const BODY_SUFFIX: &str = ".body";

/// On-disk metadata for one entry. The key is stored in full so
/// `keys()` can be reconstructed from the directory alone.
#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    method: String,
    url: String,
    status: u16,
    headers: BTreeMap<String, String>,
}

fn entry_hash(key: &RequestKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.method.as_bytes());
    hasher.update(b"\n");
    hasher.update(key.url.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn io_err(err: io::Error) -> StoreError {
    StoreError::Io(err.to_string())
}

fn check_name(name: &str) -> Result<(), StoreError> {
    // Names become single path components under the root.
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\\')
    {
        return Err(StoreError::InvalidName(String::from(name)));
    }
    Ok(())
}

/// A namespace backed by one directory.
pub struct FsNamespace {
    name: String,
    dir: PathBuf,
    /// Serializes the meta/body file pair for a key.
    write_lock: Mutex<()>,
}

impl FsNamespace {
    fn meta_path(&self, hash: &str) -> PathBuf {
        self.dir.join(format!("{hash}{META_SUFFIX}"))
    }

    fn body_path(&self, hash: &str) -> PathBuf {
        self.dir.join(format!("{hash}{BODY_SUFFIX}"))
    }
}

#[async_trait]
impl Namespace for FsNamespace {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, key: &RequestKey) -> Result<Option<StoredResponse>, StoreError> {
        let hash = entry_hash(key);
        let raw = match fs::read(self.meta_path(&hash)).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_err(err)),
        };
        let meta: EntryMeta = serde_json::from_slice(&raw)
            .map_err(|err| StoreError::Corrupt(format!("{}: {}", key, err)))?;

        let body = match fs::read(self.body_path(&hash)).await {
            Ok(body) => body,
            // A missing body half counts as a miss, not corruption.
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_err(err)),
        };

        Ok(Some(StoredResponse::new(meta.status, meta.headers, body)))
    }

    async fn store(&self, key: &RequestKey, response: StoredResponse) -> Result<(), StoreError> {
        let hash = entry_hash(key);
        let meta = EntryMeta {
            method: key.method.clone(),
            url: key.url.clone(),
            status: response.status,
            headers: response.headers,
        };
        let meta_json = serde_json::to_vec(&meta)
            .map_err(|err| StoreError::Corrupt(format!("{}: {}", key, err)))?;

        let _guard = self.write_lock.lock().await;
        // Body first; the key becomes visible once its meta file lands.
        fs::write(self.body_path(&hash), &response.body)
            .await
            .map_err(io_err)?;
        fs::write(self.meta_path(&hash), &meta_json)
            .await
            .map_err(io_err)?;
        Ok(())
    }

    async fn remove(&self, key: &RequestKey) -> Result<bool, StoreError> {
        let hash = entry_hash(key);
        let _guard = self.write_lock.lock().await;

        let existed = match fs::remove_file(self.meta_path(&hash)).await {
            Ok(()) => true,
            Err(err) if err.kind() == io::ErrorKind::NotFound => false,
            Err(err) => return Err(io_err(err)),
        };
        match fs::remove_file(self.body_path(&hash)).await {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(io_err(err)),
        }
        Ok(existed)
    }

    async fn keys(&self) -> Result<Vec<RequestKey>, StoreError> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await.map_err(io_err)?;
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !name.ends_with(META_SUFFIX) {
                continue;
            }
            let raw = fs::read(entry.path()).await.map_err(io_err)?;
            match serde_json::from_slice::<EntryMeta>(&raw) {
                Ok(meta) => keys.push(RequestKey::new(meta.method, meta.url)),
                Err(err) => {
                    log::warn!("[Store] skipping corrupt entry `{}`: {}", name, err);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn len(&self) -> Result<usize, StoreError> {
        let mut count = 0;
        let mut entries = fs::read_dir(&self.dir).await.map_err(io_err)?;
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            if entry.file_name().to_str().is_some_and(|n| n.ends_with(META_SUFFIX)) {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Filesystem-backed cache store.
pub struct FsCacheStore {
    root: PathBuf,
}

impl FsCacheStore {
    /// Create a store over a root directory. The directory is created
    /// lazily on the first `open`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl CacheStore for FsCacheStore {
    async fn open(&self, name: &str) -> Result<Arc<dyn Namespace>, StoreError> {
        check_name(name)?;
        let dir = self.root.join(name);
        fs::create_dir_all(&dir).await.map_err(io_err)?;
        Ok(Arc::new(FsNamespace {
            name: String::from(name),
            dir,
            write_lock: Mutex::new(()),
        }))
    }

    async fn has(&self, name: &str) -> Result<bool, StoreError> {
        check_name(name)?;
        match fs::metadata(self.root.join(name)).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(io_err(err)),
        }
    }

    async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        check_name(name)?;
        match fs::remove_dir_all(self.root.join(name)).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(io_err(err)),
        }
    }

    async fn list_names(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_err(err)),
        };
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let is_dir = entry.file_type().await.map_err(io_err)?.is_dir();
            if !is_dir {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(String::from(name));
            }
        }
        names.sort();
        Ok(names)
    }
}
