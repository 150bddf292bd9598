//! Network Seam
//!
//! The engine performs live fetches through this trait; hosts plug in
//! their HTTP client. [`OfflineNetwork`] is the in-crate implementation
//! for hosts with no connectivity at all, and doubles as a test double.

use async_trait::async_trait;
use thiserror::Error;

use crate::fetch::{Request, Response};

/// A failed network fetch.
///
/// The engine treats every variant the same way: fall back to cache,
/// then to a synthetic offline response. The distinction exists for
/// logs and for hosts that want to react differently.
#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    /// No route to the origin (offline, DNS failure, refused).
    #[error("network unreachable")]
    Unreachable,
    /// The fetch did not complete in time. The engine itself imposes
    /// no deadline; this comes from the host's client.
    #[error("network timeout")]
    Timeout,
    /// The origin misbehaved at the protocol level.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Performs live fetches on behalf of the engine.
///
/// Requests arrive with their URL already resolved against the
/// configured origin, so implementations always see an absolute URL.
#[async_trait]
pub trait Network: Send + Sync {
    /// Fetch a request from the network.
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

/// A network that is always unreachable.
pub struct OfflineNetwork;

#[async_trait]
impl Network for OfflineNetwork {
    async fn fetch(&self, _request: &Request) -> Result<Response, NetworkError> {
        Err(NetworkError::Unreachable)
    }
}
