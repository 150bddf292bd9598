//! Larder Engine
//!
//! An intercepting caching proxy between a web client and the network:
//! each request is classified, then answered from a versioned cache
//! namespace, from the network, or from a layered fallback, so the
//! application keeps working (fully or degraded) without connectivity.
//!
//! A host drives three entry points on [`Engine`]:
//!
//! - [`Engine::populate`] (install): fetch the manifest into the
//!   precache namespace, all-or-nothing.
//! - [`Engine::prune`] (activate): delete namespaces from older
//!   versions, then claim open clients.
//! - [`Engine::handle`] (per request): dispatch to the strategy for
//!   the request's class (store-first for assets, network-first for
//!   dynamic endpoints, app-shell fallback for navigations).
//!
//! Storage and network are seams ([`larder_store::CacheStore`],
//! [`Network`]); hosts inject their own backends.

mod classify;
mod config;
mod engine;
mod fetch;
mod lifecycle;
mod network;
mod strategy;

pub use classify::{Classification, PathPattern, RequestClassifier};
pub use config::{ConfigError, EngineConfig};
pub use engine::Engine;
pub use fetch::{FetchOutcome, Method, Request, RequestMode, Response, ResponseSource};
pub use lifecycle::{
    ClientRegistry, EngineState, Lifecycle, LifecycleError, NoopClients, PopulateError,
    PruneError, PruneReport,
};
pub use network::{Network, NetworkError, OfflineNetwork};
