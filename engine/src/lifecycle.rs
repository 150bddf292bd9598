//! Cache Lifecycle
//!
//! State machine for the two phases an engine instance goes through:
//! populate fills the precache namespace from the manifest (install),
//! prune deletes namespaces from older versions and claims open
//! clients (activate). The machine exists so a host cannot, say, prune
//! an engine that never populated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use thiserror::Error;

use larder_store::StoreError;

use crate::network::NetworkError;

/// Engine lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Created; nothing cached yet.
    Idle,
    /// Populate running.
    Populating,
    /// Populated; older versions not pruned yet.
    Waiting,
    /// Prune running.
    Pruning,
    /// Pruned; the current version set is authoritative.
    Active,
}

impl Default for EngineState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Check if a state transition is valid.
fn is_valid_transition(from: EngineState, to: EngineState) -> bool {
    use EngineState::*;

    matches!(
        (from, to),
        // Install: populate may run first, or again for a new version
        (Idle, Populating) |
        (Waiting, Populating) |
        (Active, Populating) |
        (Populating, Waiting) |
        (Populating, Idle) |    // populate failed
        (Populating, Active) |  // populate failed, old version stays live
        // Activate: prune requires a completed populate
        (Waiting, Pruning) |
        (Pruning, Active) |
        (Pruning, Waiting)      // enumeration failed, nothing deleted
    )
}

/// Lifecycle errors.
#[derive(Debug, Clone, Error)]
pub enum LifecycleError {
    /// The requested phase cannot run from the current state.
    #[error("invalid lifecycle transition: {from:?} -> {to:?}")]
    InvalidTransition { from: EngineState, to: EngineState },
    /// The release gate is closed: the previous instance has not
    /// finished and `activate_immediately` is off.
    #[error("release gate closed: previous instance still draining")]
    GateClosed,
}

/// Tracks the lifecycle state and the release gate.
pub struct Lifecycle {
    /// Current state.
    state: Mutex<EngineState>,
    /// Whether prune may run. Opened at construction when
    /// `activate_immediately` is set, otherwise by [`Lifecycle::release`].
    released: AtomicBool,
}

impl Lifecycle {
    pub fn new(activate_immediately: bool) -> Self {
        Self {
            state: Mutex::new(EngineState::Idle),
            released: AtomicBool::new(activate_immediately),
        }
    }

    /// Current state.
    pub fn state(&self) -> EngineState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enter a phase, failing on an invalid transition. Returns the
    /// state the machine left, so a failed phase can settle back to it.
    pub fn transition(&self, to: EngineState) -> Result<EngineState, LifecycleError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let from = *state;
        if !is_valid_transition(from, to) {
            return Err(LifecycleError::InvalidTransition { from, to });
        }
        log::debug!("[Lifecycle] {:?} -> {:?}", from, to);
        *state = to;
        Ok(from)
    }

    /// Exit a phase. Only the phase that entered calls this, with a
    /// target the transition table already covers.
    pub(crate) fn settle(&self, to: EngineState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        log::debug!("[Lifecycle] {:?} -> {:?}", *state, to);
        *state = to;
    }

    /// Open the release gate: the previous instance has finished.
    pub fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
        log::debug!("[Lifecycle] release gate opened");
    }

    /// Whether prune may run.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

/// Why populate failed. Nothing was written to the precache namespace
/// unless the error is [`PopulateError::Store`], and the engine did
/// not become ready either way.
#[derive(Debug, Error)]
pub enum PopulateError {
    /// A manifest entry is not a resolvable URL.
    #[error("manifest entry `{0}` is not a resolvable URL")]
    InvalidEntry(String),
    /// A manifest fetch failed outright.
    #[error("fetch of `{url}` failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: NetworkError,
    },
    /// A manifest fetch returned a non-OK status.
    #[error("fetch of `{url}` returned status {status}")]
    BadStatus { url: String, status: u16 },
    /// The store rejected a write.
    #[error("precache write failed: {0}")]
    Store(#[from] StoreError),
    /// Populate is not valid from the current state.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Why prune failed outright. Individual deletion failures never land
/// here; they are collected in [`PruneReport::failures`].
#[derive(Debug, Error)]
pub enum PruneError {
    /// Namespace enumeration failed; nothing was deleted.
    #[error("namespace enumeration failed: {0}")]
    List(#[from] StoreError),
    /// Prune is not valid now (wrong state, or the gate is closed).
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// What a prune did.
#[derive(Debug, Default)]
pub struct PruneReport {
    /// Namespace names deleted.
    pub deleted: Vec<String>,
    /// Deletions that failed, with the backend error. Non-fatal: the
    /// remaining deletions and the claim step still ran.
    pub failures: Vec<(String, StoreError)>,
    /// Clients claimed after the sweep, when claiming is configured.
    pub clients_claimed: usize,
}

/// Open clients that can be switched over to this engine instance.
///
/// The default is [`NoopClients`]; hosts that track open documents
/// plug their registry in via [`Engine::with_clients`].
///
/// [`Engine::with_clients`]: crate::Engine::with_clients
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// Take control of every open client. Returns how many switched.
    async fn claim(&self) -> usize;
}

/// Registry for hosts without client tracking.
pub struct NoopClients;

#[async_trait]
impl ClientRegistry for NoopClients {
    async fn claim(&self) -> usize {
        0
    }
}
