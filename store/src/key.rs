//! Request Keys
//!
//! The identity of a cacheable request: method plus canonical absolute
//! URL text. Relative references are resolved to their absolute form
//! before a key is built, so a manifest entry and the live request for
//! the same resource produce identical keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Cache entry key.
///
/// Ordered so namespaces can keep entries in BTree maps; the ordering
/// itself carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    /// HTTP method, uppercase.
    pub method: String,
    /// Canonical absolute URL text.
    pub url: String,
}

impl RequestKey {
    /// Create a key for an arbitrary method.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        let method: String = method.into();
        Self {
            method: method.to_ascii_uppercase(),
            url: url.into(),
        }
    }

    /// Create a GET key. GET is the only method the engine routes, so
    /// nearly every key in a store looks like this.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
