//! Fetch strategies driven through the engine facade.
//!
//! Requests go through `Engine::handle`, so classification and
//! strategy dispatch are exercised together with the store.

use std::sync::Arc;

use larder_engine::{Engine, NetworkError, Request, Response, ResponseSource};
use larder_store::{CacheStore, MemoryCacheStore, Namespace, RequestKey};

use larder_e2e_tests::fixtures::{build_engine, online_site, test_config, ScriptedNetwork};

/// A populated and pruned engine over the scripted test site.
async fn ready_engine() -> (Engine, Arc<MemoryCacheStore>, Arc<ScriptedNetwork>) {
    let store = Arc::new(MemoryCacheStore::new());
    let network = Arc::new(online_site());
    let engine = build_engine(test_config(), store.clone(), network.clone());
    engine.populate().await.unwrap();
    engine.prune().await.unwrap();
    (engine, store, network)
}

#[tokio::test]
async fn test_asset_served_from_precache_without_network() {
    let (engine, _store, network) = ready_engine().await;
    let populate_calls = network.calls();

    let outcome = engine.handle(&Request::get("/app.css")).await;

    let response = outcome.into_response().unwrap();
    assert_eq!(response.body, b"body{margin:0}");
    assert_eq!(response.source, ResponseSource::Precache);
    assert_eq!(network.calls(), populate_calls);
}

#[tokio::test]
async fn test_asset_miss_fetches_without_persisting() {
    let (engine, store, network) = ready_engine().await;
    network.set_ok("https://app.test/logo.svg", b"<svg/>");
    let populate_calls = network.calls();

    let outcome = engine.handle(&Request::get("/logo.svg")).await;

    let response = outcome.into_response().unwrap();
    assert_eq!(response.body, b"<svg/>");
    assert_eq!(response.source, ResponseSource::Network);
    assert_eq!(network.calls(), populate_calls + 1);

    let precache = store.open("app-precache-v1").await.unwrap();
    let hit = precache
        .lookup(&RequestKey::get("https://app.test/logo.svg"))
        .await
        .unwrap();
    assert!(hit.is_none());
}

#[tokio::test]
async fn test_precache_wins_over_fresher_network_content() {
    let (engine, _store, network) = ready_engine().await;
    network.set_ok("https://app.test/app.js", b"console.log('app v2')");

    let outcome = engine.handle(&Request::get("/app.js")).await;

    // Only a version bump refreshes assets.
    let response = outcome.into_response().unwrap();
    assert_eq!(response.body, b"console.log('app')");
    assert_eq!(response.source, ResponseSource::Precache);
}

#[tokio::test]
async fn test_dynamic_snapshot_serves_after_outage() {
    let (engine, _store, network) = ready_engine().await;
    network.set_ok("https://app.test/api/lecturas", b"[21.5,22.0]");

    let live = engine.handle(&Request::get("/api/lecturas")).await;
    assert_eq!(live.into_response().unwrap().source, ResponseSource::Network);

    network.go_offline();
    let cached = engine.handle(&Request::get("/api/lecturas")).await;
    let cached = cached.into_response().unwrap();
    assert_eq!(cached.body, b"[21.5,22.0]");
    assert_eq!(cached.source, ResponseSource::RuntimeCache);
}

#[tokio::test]
async fn test_dynamic_snapshot_survives_timeouts() {
    let (engine, _store, network) = ready_engine().await;
    network.set_ok("https://app.test/api/lecturas", b"[21.5]");
    engine.handle(&Request::get("/api/lecturas")).await;

    network.set_fail("https://app.test/api/lecturas", NetworkError::Timeout);
    let outcome = engine.handle(&Request::get("/api/lecturas")).await;

    let response = outcome.into_response().unwrap();
    assert_eq!(response.body, b"[21.5]");
    assert_eq!(response.source, ResponseSource::RuntimeCache);
}

#[tokio::test]
async fn test_dynamic_error_responses_are_not_snapshotted() {
    let store = Arc::new(MemoryCacheStore::new());
    let network =
        Arc::new(online_site().respond("https://app.test/api/temperatura", Response::new(500)));
    let engine = build_engine(test_config(), store.clone(), network.clone());
    engine.populate().await.unwrap();
    engine.prune().await.unwrap();

    // The 500 reaches the client untouched.
    let live = engine.handle(&Request::get("/api/temperatura")).await;
    assert_eq!(live.into_response().unwrap().status, 500);

    // But it never shadowed anything: offline there is no snapshot.
    network.go_offline();
    let offline = engine.handle(&Request::get("/api/temperatura")).await;
    let offline = offline.into_response().unwrap();
    assert_eq!(offline.status, 503);
    assert_eq!(offline.source, ResponseSource::Synthetic);
}

#[tokio::test]
async fn test_offline_dynamic_responses_negotiate_content() {
    let (engine, _store, network) = ready_engine().await;
    network.go_offline();

    let plain = engine.handle(&Request::get("/api/lecturas")).await;
    let plain = plain.into_response().unwrap();
    assert_eq!(plain.status, 503);
    assert_eq!(plain.status_text, "Offline");
    assert_eq!(plain.body, b"Offline");

    let json = engine
        .handle(&Request::get("/api/lecturas").with_header("Accept", "application/json"))
        .await;
    let json = json.into_response().unwrap();
    assert_eq!(json.status, 503);
    assert_eq!(json.headers.get("Content-Type").map(String::as_str), Some("application/json"));
    let value: serde_json::Value = serde_json::from_slice(&json.body).unwrap();
    assert_eq!(value["error"], "offline");
}
