//! Shared fixtures for the end-to-end journeys.
//!
//! Models the world outside the engine: a scriptable origin server, a
//! store with injectable faults, and a client registry that records
//! claims.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use larder_engine::{
    ClientRegistry, Engine, EngineConfig, Network, NetworkError, Request, Response,
};
use larder_store::{CacheStore, MemoryCacheStore, Namespace, StoreError};

// ── Scripted origin ─────────────────────────────────────────

/// An origin server scripted per absolute URL.
///
/// Unrouted URLs fail as unreachable, which doubles as the offline
/// simulation: [`ScriptedNetwork::go_offline`] drops every route.
pub struct ScriptedNetwork {
    routes: Mutex<BTreeMap<String, Result<Response, NetworkError>>>,
    calls: AtomicUsize,
    last_url: Mutex<Option<String>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(BTreeMap::new()),
            calls: AtomicUsize::new(0),
            last_url: Mutex::new(None),
        }
    }

    fn script(&self, url: &str, outcome: Result<Response, NetworkError>) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(String::from(url), outcome);
    }

    /// Route a URL to a 200 response with the given body.
    pub fn ok(self, url: &str, body: &[u8]) -> Self {
        self.set_ok(url, body);
        self
    }

    /// Route a URL to an arbitrary response.
    pub fn respond(self, url: &str, response: Response) -> Self {
        self.script(url, Ok(response));
        self
    }

    /// Re-script a URL mid-journey.
    pub fn set_ok(&self, url: &str, body: &[u8]) {
        self.script(url, Ok(Response::new(200).with_body(body)));
    }

    /// Make a URL fail with the given error from now on.
    pub fn set_fail(&self, url: &str, error: NetworkError) {
        self.script(url, Err(error));
    }

    /// Drop every route; all further fetches fail as unreachable.
    pub fn go_offline(&self) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Fetches attempted so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// URL of the most recent fetch.
    pub fn last_url(&self) -> Option<String> {
        self.last_url
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_url
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(request.url.clone());
        let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        match routes.get(&request.url) {
            Some(scripted) => scripted.clone(),
            None => Err(NetworkError::Unreachable),
        }
    }
}

// ── Faulty store ────────────────────────────────────────────

/// A memory store whose `delete` fails for scripted namespace names.
/// Everything else delegates to [`MemoryCacheStore`].
pub struct FailingStore {
    inner: MemoryCacheStore,
    failing_deletes: BTreeSet<String>,
}

impl FailingStore {
    pub fn failing_deletes(names: &[&str]) -> Self {
        Self {
            inner: MemoryCacheStore::new(),
            failing_deletes: names.iter().map(|name| String::from(*name)).collect(),
        }
    }
}

#[async_trait]
impl CacheStore for FailingStore {
    async fn open(&self, name: &str) -> Result<Arc<dyn Namespace>, StoreError> {
        self.inner.open(name).await
    }

    async fn has(&self, name: &str) -> Result<bool, StoreError> {
        self.inner.has(name).await
    }

    async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        if self.failing_deletes.contains(name) {
            return Err(StoreError::Io(String::from("scripted delete failure")));
        }
        self.inner.delete(name).await
    }

    async fn list_names(&self) -> Result<Vec<String>, StoreError> {
        self.inner.list_names().await
    }
}

// ── Client registry ─────────────────────────────────────────

/// A registry with a fixed number of connected clients that counts
/// how often it was claimed.
pub struct RecordingClients {
    connected: usize,
    claims: AtomicUsize,
}

impl RecordingClients {
    pub fn new(connected: usize) -> Self {
        Self {
            connected,
            claims: AtomicUsize::new(0),
        }
    }

    /// How many times `claim` ran.
    pub fn claims(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientRegistry for RecordingClients {
    async fn claim(&self) -> usize {
        self.claims.fetch_add(1, Ordering::SeqCst);
        self.connected
    }
}

// ── Site under test ─────────────────────────────────────────

/// Configuration every journey starts from: one origin, a four-entry
/// manifest, and the default dynamic patterns.
pub fn test_config() -> EngineConfig {
    EngineConfig {
        origin: String::from("https://app.test"),
        manifest: vec![
            String::from("/"),
            String::from("/index.html"),
            String::from("/app.js"),
            String::from("/app.css"),
        ],
        ..EngineConfig::default()
    }
}

/// A network scripted with every page of the test site.
pub fn online_site() -> ScriptedNetwork {
    ScriptedNetwork::new()
        .ok("https://app.test/", b"<html>root</html>")
        .ok("https://app.test/index.html", b"<html>shell</html>")
        .ok("https://app.test/app.js", b"console.log('app')")
        .ok("https://app.test/app.css", b"body{margin:0}")
}

/// Build an engine over the given store and network.
pub fn build_engine(
    config: EngineConfig,
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
) -> Engine {
    Engine::new(config, store, network).expect("fixture config must validate")
}
