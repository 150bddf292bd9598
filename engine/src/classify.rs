//! Request Classification
//!
//! Pure, synchronous routing rules: every intercepted request falls
//! into exactly one class, and the class alone picks the strategy.
//! Rule order is significant: a navigation whose URL also matches a
//! dynamic pattern is still a navigation.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetch::{Method, Request, RequestMode};

// ── Types ───────────────────────────────────────────────────

/// A path pattern marking dynamic (network-first) endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PathPattern {
    /// Matches when the path starts with the given prefix.
    Prefix(String),
    /// Matches when the path contains the given substring.
    Contains(String),
}

impl PathPattern {
    /// Whether `path` matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Prefix(prefix) => path.starts_with(prefix.as_str()),
            Self::Contains(needle) => path.contains(needle.as_str()),
        }
    }
}

/// Request classes, one strategy each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Top-level document navigation → app-shell fallback.
    Navigation,
    /// Volatile endpoint → network-first.
    Dynamic,
    /// Same-origin static resource → store-first.
    Asset,
    /// Everything else → untouched passthrough.
    Unmanaged,
}

/// Classifies intercepted requests against one origin.
pub struct RequestClassifier {
    /// The origin this engine serves.
    origin: Url,
    /// Patterns marking dynamic endpoints.
    patterns: Vec<PathPattern>,
}

// ── Implementation ──────────────────────────────────────────

impl RequestClassifier {
    pub fn new(origin: Url, patterns: Vec<PathPattern>) -> Self {
        Self { origin, patterns }
    }

    /// The origin this classifier serves.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Resolve a raw request URL against the engine origin.
    ///
    /// Site-relative references (`/app.css`) resolve onto the origin,
    /// so they key identically to their absolute form. `None` means
    /// the text is not something the engine can reason about.
    pub fn resolve(&self, raw: &str) -> Option<Url> {
        self.origin.join(raw).ok()
    }

    /// Classify a request. `resolved` is the output of [`resolve`] for
    /// the request URL; an unresolvable URL is unmanaged.
    ///
    /// [`resolve`]: Self::resolve
    pub fn classify(&self, request: &Request, resolved: Option<&Url>) -> Classification {
        if request.method != Method::Get {
            return Classification::Unmanaged;
        }

        let Some(url) = resolved else {
            return Classification::Unmanaged;
        };

        if request.mode == RequestMode::Navigate {
            return Classification::Navigation;
        }

        if self.patterns.iter().any(|p| p.matches(url.path())) {
            return Classification::Dynamic;
        }

        if url.origin() == self.origin.origin() {
            return Classification::Asset;
        }

        Classification::Unmanaged
    }
}

// ── Tests ───────────────────────────────────────────────────
