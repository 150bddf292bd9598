//! Fetch Strategies
//!
//! One strategy per request class. All of them degrade instead of
//! failing: a store fault during a lookup counts as a miss, and the
//! worst case a client sees is a synthetic 503. The only exception is
//! the navigation shell fetch, whose failure surfaces as
//! [`FetchOutcome::Failed`].

use std::sync::Arc;

use url::Url;

use larder_store::{CacheStore, Namespace, RequestKey, StoredResponse};

use crate::config::EngineConfig;
use crate::fetch::{FetchOutcome, Request, Response, ResponseSource};
use crate::network::Network;

// ── Helpers ─────────────────────────────────────────────────

/// Open a namespace, degrading backend faults to `None`.
async fn open_namespace(store: &Arc<dyn CacheStore>, name: &str) -> Option<Arc<dyn Namespace>> {
    match store.open(name).await {
        Ok(namespace) => Some(namespace),
        Err(err) => {
            log::warn!("[Strategy] open of `{}` failed: {}", name, err);
            None
        }
    }
}

/// Look a key up, degrading backend faults to a miss.
async fn lookup(namespace: &Arc<dyn Namespace>, key: &RequestKey) -> Option<StoredResponse> {
    match namespace.lookup(key).await {
        Ok(hit) => hit,
        Err(err) => {
            log::warn!("[Strategy] lookup in `{}` failed: {}", namespace.name(), err);
            None
        }
    }
}

/// Content negotiation for the terminal offline response: JSON when
/// the client asked for JSON, plain text otherwise.
fn offline_fallback(request: &Request) -> Response {
    let wants_json = request
        .header("accept")
        .is_some_and(|v| v.to_ascii_lowercase().contains("application/json"));
    if wants_json {
        Response::offline_json()
    } else {
        Response::offline_text()
    }
}

// ── Strategies ──────────────────────────────────────────────

/// Store-first, for assets: a precache hit wins outright, the network
/// covers misses, and a synthetic 503 covers both being unavailable.
/// A hit is never revalidated; only a version bump refreshes assets.
pub(crate) async fn store_first(
    store: &Arc<dyn CacheStore>,
    network: &Arc<dyn Network>,
    config: &EngineConfig,
    request: &Request,
    url: &Url,
) -> Response {
    let key = RequestKey::get(url.as_str());
    let precache_name = config.precache_name();

    if let Some(namespace) = open_namespace(store, &precache_name).await {
        if let Some(hit) = lookup(&namespace, &key).await {
            return Response::from_stored(hit, ResponseSource::Precache);
        }
    }

    // The network sees the canonical absolute URL, not the raw text
    // the client issued.
    let mut live_request = request.clone();
    live_request.url = String::from(url.as_str());

    match network.fetch(&live_request).await {
        Ok(response) => {
            if config.cache_asset_fetches && response.ok() {
                if let Some(namespace) = open_namespace(store, &precache_name).await {
                    if let Err(err) = namespace.store(&key, response.to_stored()).await {
                        log::warn!("[Strategy] asset write of {} failed: {}", key, err);
                    }
                }
            }
            response
        }
        Err(err) => {
            log::debug!("[Strategy] asset fetch of {} failed: {}", url, err);
            Response::offline_text()
        }
    }
}

/// Network-first, for dynamic endpoints: the live response wins and a
/// plain 200 is snapshotted into the runtime namespace; on network
/// failure the last snapshot answers; with neither, a content-
/// negotiated 503.
pub(crate) async fn network_first(
    store: &Arc<dyn CacheStore>,
    network: &Arc<dyn Network>,
    config: &EngineConfig,
    request: &Request,
    url: &Url,
) -> Response {
    let key = RequestKey::get(url.as_str());
    let runtime_name = config.runtime_name();

    let mut live_request = request.clone();
    live_request.url = String::from(url.as_str());

    match network.fetch(&live_request).await {
        Ok(response) => {
            // Snapshot only plain 200s. Error responses are never
            // cached and never shadow an older working snapshot.
            if response.status == 200 {
                let store = Arc::clone(store);
                let snapshot = response.to_stored();
                let write_key = key.clone();
                // Spawned so caller cancellation cannot drop a write
                // in flight.
                let write = tokio::spawn(async move {
                    match store.open(&runtime_name).await {
                        Ok(namespace) => {
                            if let Err(err) = namespace.store(&write_key, snapshot).await {
                                log::warn!(
                                    "[Strategy] runtime write of {} failed: {}",
                                    write_key,
                                    err
                                );
                            }
                        }
                        Err(err) => {
                            log::warn!("[Strategy] open of `{}` failed: {}", runtime_name, err);
                        }
                    }
                });
                if write.await.is_err() {
                    log::warn!("[Strategy] runtime write task aborted");
                }
            }
            response
        }
        Err(err) => {
            log::debug!("[Strategy] dynamic fetch of {} failed: {}", url, err);
            if let Some(namespace) = open_namespace(store, &runtime_name).await {
                if let Some(hit) = lookup(&namespace, &key).await {
                    return Response::from_stored(hit, ResponseSource::RuntimeCache);
                }
            }
            offline_fallback(request)
        }
    }
}

/// Navigation fallback: every navigation conflates onto the app shell.
/// The shell is looked up in the precache; on a miss the shell URL
/// itself is fetched, never the original navigation URL.
pub(crate) async fn navigation(
    store: &Arc<dyn CacheStore>,
    network: &Arc<dyn Network>,
    config: &EngineConfig,
    shell_url: &Url,
) -> FetchOutcome {
    let key = RequestKey::get(shell_url.as_str());

    if let Some(namespace) = open_namespace(store, &config.precache_name()).await {
        if let Some(hit) = lookup(&namespace, &key).await {
            return FetchOutcome::Respond(Response::from_stored(hit, ResponseSource::Precache));
        }
    }

    let shell_request = Request::get(shell_url.as_str());
    match network.fetch(&shell_request).await {
        Ok(response) => FetchOutcome::Respond(response),
        Err(err) => {
            log::warn!("[Strategy] shell fetch of {} failed: {}", shell_url, err);
            FetchOutcome::Failed(err)
        }
    }
}

// ── Tests ───────────────────────────────────────────────────
