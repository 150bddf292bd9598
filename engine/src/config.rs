//! Engine Configuration
//!
//! Everything variable about an engine instance: origin, namespace
//! naming, the precache manifest, routing patterns, and the lifecycle
//! flags. Loadable from JSON; unspecified fields take the defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::classify::PathPattern;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Origin is not an absolute base URL.
    #[error("invalid origin `{origin}`: {reason}")]
    InvalidOrigin { origin: String, reason: String },
    /// The app shell does not resolve against the origin.
    #[error("invalid app shell `{shell}`: {reason}")]
    InvalidShell { shell: String, reason: String },
    /// A namespace name component is empty or contains a separator.
    #[error("invalid name component `{0}`")]
    InvalidName(String),
    /// JSON config text could not be parsed.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Engine configuration.
///
/// The two live namespace names derive from `cache_prefix` and the
/// version tokens; bumping a token is the only invalidation mechanism
/// the engine has.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Origin this engine serves, e.g. `https://app.example`.
    pub origin: String,
    /// Prefix shared by this engine's namespace names.
    pub cache_prefix: String,
    /// Version token of the precache namespace.
    pub precache_version: String,
    /// Version token of the runtime namespace.
    pub runtime_version: String,
    /// URLs fetched and stored during populate, relative to the origin.
    pub manifest: Vec<String>,
    /// Document served for every navigation.
    pub app_shell: String,
    /// Patterns marking dynamic (network-first) endpoints.
    pub dynamic_patterns: Vec<PathPattern>,
    /// Open the release gate at construction instead of waiting for
    /// the previous engine instance to finish.
    pub activate_immediately: bool,
    /// Claim already-open clients once pruning completes.
    pub claim_existing_clients: bool,
    /// Store OK network responses fetched on asset-cache misses back
    /// into the precache namespace. Off by default: assets normally
    /// enter the precache through populate alone.
    pub cache_asset_fetches: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            origin: String::from("http://localhost:8080"),
            cache_prefix: String::from("app"),
            precache_version: String::from("v1"),
            runtime_version: String::from("v1"),
            manifest: vec![String::from("/"), String::from("/index.html")],
            app_shell: String::from("/index.html"),
            dynamic_patterns: vec![
                PathPattern::Prefix(String::from("/api/")),
                PathPattern::Contains(String::from("/lecturas")),
                PathPattern::Contains(String::from("/temperatura")),
            ],
            activate_immediately: true,
            claim_existing_clients: true,
            cache_asset_fetches: false,
        }
    }
}

impl EngineConfig {
    /// Name of the precache namespace.
    pub fn precache_name(&self) -> String {
        format!("{}-precache-{}", self.cache_prefix, self.precache_version)
    }

    /// Name of the runtime namespace.
    pub fn runtime_name(&self) -> String {
        format!("{}-runtime-{}", self.cache_prefix, self.runtime_version)
    }

    /// The namespace names current for this configuration. Prune
    /// deletes every name outside this set.
    pub fn version_set(&self) -> Vec<String> {
        vec![self.precache_name(), self.runtime_name()]
    }

    /// Parse and validate a config from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// The origin as a parsed URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin).map_err(|err| ConfigError::InvalidOrigin {
            origin: self.origin.clone(),
            reason: err.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidOrigin {
                origin: self.origin.clone(),
                reason: String::from("not a base URL"),
            });
        }
        Ok(url)
    }

    /// The app shell resolved against the origin.
    pub fn shell_url(&self) -> Result<Url, ConfigError> {
        self.origin_url()?
            .join(&self.app_shell)
            .map_err(|err| ConfigError::InvalidShell {
                shell: self.app_shell.clone(),
                reason: err.to_string(),
            })
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shell_url()?;
        for part in [
            &self.cache_prefix,
            &self.precache_version,
            &self.runtime_version,
        ] {
            if part.is_empty() || part.contains('/') || part.contains('\\') {
                return Err(ConfigError::InvalidName(part.clone()));
            }
        }
        if !self.manifest.iter().any(|entry| entry == &self.app_shell) {
            log::warn!(
                "[Config] app shell {} is not in the manifest; navigations will need the network",
                self.app_shell
            );
        }
        Ok(())
    }
}
