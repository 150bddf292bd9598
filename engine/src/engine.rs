//! Engine Facade
//!
//! One [`Engine`] per served origin. It owns the classifier, the cache
//! store, the network seam, and the lifecycle, and exposes the three
//! entry points a host drives: `populate` (install), `prune`
//! (activate), and `handle` (per request).

use std::sync::Arc;

use url::Url;

use larder_store::{CacheStore, RequestKey};

use crate::classify::{Classification, RequestClassifier};
use crate::config::{ConfigError, EngineConfig};
use crate::fetch::{FetchOutcome, Request};
use crate::lifecycle::{
    ClientRegistry, EngineState, Lifecycle, LifecycleError, NoopClients, PopulateError,
    PruneError, PruneReport,
};
use crate::network::Network;
use crate::strategy;

/// The offline-first engine.
pub struct Engine {
    config: EngineConfig,
    classifier: RequestClassifier,
    shell_url: Url,
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    clients: Arc<dyn ClientRegistry>,
    lifecycle: Lifecycle,
}

impl Engine {
    /// Create an engine over a store and a network. Fails when the
    /// configuration does not validate.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn CacheStore>,
        network: Arc<dyn Network>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let origin = config.origin_url()?;
        let shell_url = config.shell_url()?;
        let classifier = RequestClassifier::new(origin, config.dynamic_patterns.clone());
        let lifecycle = Lifecycle::new(config.activate_immediately);

        Ok(Self {
            classifier,
            shell_url,
            store,
            network,
            clients: Arc::new(NoopClients),
            lifecycle,
            config,
        })
    }

    /// Use a client registry instead of the no-op default.
    pub fn with_clients(mut self, clients: Arc<dyn ClientRegistry>) -> Self {
        self.clients = clients;
        self
    }

    /// The configuration this engine runs with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.lifecycle.state()
    }

    /// Whether populate has completed for the current version set.
    pub fn is_ready(&self) -> bool {
        matches!(
            self.state(),
            EngineState::Waiting | EngineState::Pruning | EngineState::Active
        )
    }

    /// Whether prune has completed (older versions are gone).
    pub fn is_active(&self) -> bool {
        self.state() == EngineState::Active
    }

    /// Open the release gate when `activate_immediately` is off.
    pub fn release(&self) {
        self.lifecycle.release();
    }

    /// Install phase: fetch every manifest entry and store the
    /// snapshots into the precache namespace.
    ///
    /// All-or-nothing: snapshots are written only after every fetch
    /// came back OK, so a failed populate leaves no partial precache.
    /// On failure the engine settles back into the state it started
    /// from and the whole phase can be retried.
    pub async fn populate(&self) -> Result<(), PopulateError> {
        let prior = self.lifecycle.transition(EngineState::Populating)?;
        match self.populate_inner().await {
            Ok(()) => {
                self.lifecycle.settle(EngineState::Waiting);
                log::info!(
                    "[Lifecycle] populate complete: {} manifest entries in `{}`",
                    self.config.manifest.len(),
                    self.config.precache_name()
                );
                Ok(())
            }
            Err(err) => {
                self.lifecycle.settle(prior);
                log::warn!("[Lifecycle] populate failed: {}", err);
                Err(err)
            }
        }
    }

    async fn populate_inner(&self) -> Result<(), PopulateError> {
        // Fetch everything first; write nothing until the whole
        // manifest came back OK.
        let mut snapshots = Vec::with_capacity(self.config.manifest.len());
        for entry in &self.config.manifest {
            let url = self
                .classifier
                .resolve(entry)
                .ok_or_else(|| PopulateError::InvalidEntry(entry.clone()))?;
            let request = Request::get(url.as_str());
            let response =
                self.network
                    .fetch(&request)
                    .await
                    .map_err(|source| PopulateError::Fetch {
                        url: url.to_string(),
                        source,
                    })?;
            if !response.ok() {
                return Err(PopulateError::BadStatus {
                    url: url.to_string(),
                    status: response.status,
                });
            }
            snapshots.push((RequestKey::get(url.as_str()), response.to_stored()));
        }

        let precache = self.store.open(&self.config.precache_name()).await?;
        for (key, snapshot) in snapshots {
            precache.store(&key, snapshot).await?;
        }
        Ok(())
    }

    /// Activate phase: delete namespaces outside the current version
    /// set, then claim open clients when configured.
    ///
    /// Individual deletion failures land in the report and stop
    /// neither the sweep nor the claim step; only a failed namespace
    /// enumeration aborts the phase.
    pub async fn prune(&self) -> Result<PruneReport, PruneError> {
        if !self.lifecycle.is_released() {
            return Err(PruneError::Lifecycle(LifecycleError::GateClosed));
        }
        self.lifecycle.transition(EngineState::Pruning)?;

        let names = match self.store.list_names().await {
            Ok(names) => names,
            Err(err) => {
                self.lifecycle.settle(EngineState::Waiting);
                return Err(PruneError::List(err));
            }
        };

        let current = self.config.version_set();
        let mut report = PruneReport::default();
        for name in names {
            if current.contains(&name) {
                continue;
            }
            match self.store.delete(&name).await {
                Ok(_) => {
                    log::debug!("[Lifecycle] pruned `{}`", name);
                    report.deleted.push(name);
                }
                Err(err) => {
                    log::warn!("[Lifecycle] prune of `{}` failed: {}", name, err);
                    report.failures.push((name, err));
                }
            }
        }

        // The current set must exist once the engine is active, so a
        // post-prune enumeration matches the version set exactly.
        for name in &current {
            if let Err(err) = self.store.open(name).await {
                log::warn!("[Lifecycle] open of `{}` failed: {}", name, err);
            }
        }

        if self.config.claim_existing_clients {
            report.clients_claimed = self.clients.claim().await;
        }

        self.lifecycle.settle(EngineState::Active);
        log::info!(
            "[Lifecycle] prune complete: {} deleted, {} failed, {} clients claimed",
            report.deleted.len(),
            report.failures.len(),
            report.clients_claimed
        );
        Ok(report)
    }

    /// Route one intercepted request.
    ///
    /// Never fails: unmanaged requests come back as `Passthrough`, and
    /// a cache-and-network double miss produces a synthetic 503. The
    /// only `Failed` outcome is a navigation whose shell is neither
    /// cached nor fetchable.
    pub async fn handle(&self, request: &Request) -> FetchOutcome {
        let resolved = self.classifier.resolve(&request.url);
        let class = self.classifier.classify(request, resolved.as_ref());
        log::debug!(
            "[Engine] {} {} -> {:?}",
            request.method.as_str(),
            request.url,
            class
        );

        match (class, resolved) {
            (Classification::Navigation, _) => {
                strategy::navigation(&self.store, &self.network, &self.config, &self.shell_url)
                    .await
            }
            (Classification::Dynamic, Some(url)) => FetchOutcome::Respond(
                strategy::network_first(&self.store, &self.network, &self.config, request, &url)
                    .await,
            ),
            (Classification::Asset, Some(url)) => FetchOutcome::Respond(
                strategy::store_first(&self.store, &self.network, &self.config, request, &url)
                    .await,
            ),
            _ => FetchOutcome::Passthrough,
        }
    }
}
