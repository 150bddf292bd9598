//! Request and Response Model
//!
//! The simplified HTTP surface the engine routes: enough to classify a
//! request, key a cache entry, and replay a stored snapshot.

use std::collections::BTreeMap;

use larder_store::StoredResponse;

use crate::network::NetworkError;

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Default for Method {
    fn default() -> Self {
        Self::Get
    }
}

impl Method {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

/// Request mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Same-origin only
    SameOrigin,
    /// No CORS
    NoCors,
    /// CORS
    Cors,
    /// Top-level document navigation
    Navigate,
}

impl Default for RequestMode {
    fn default() -> Self {
        Self::NoCors
    }
}

/// An intercepted request.
#[derive(Debug, Clone)]
pub struct Request {
    /// Request URL as issued by the client: absolute, or relative to
    /// the engine origin.
    pub url: String,
    /// HTTP method
    pub method: Method,
    /// Request mode; `Navigate` marks top-level navigations.
    pub mode: RequestMode,
    /// Request headers (name → value)
    pub headers: BTreeMap<String, String>,
}

impl Request {
    /// Create a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            mode: RequestMode::default(),
            headers: BTreeMap::new(),
        }
    }

    /// Create a top-level navigation request.
    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            mode: RequestMode::Navigate,
            ..Self::get(url)
        }
    }

    /// Set a header (builder style).
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(String::from(name), String::from(value));
        self
    }

    /// Set the method (builder style).
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Indicates where a response originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Install-time cache namespace.
    Precache,
    /// Runtime cache namespace.
    RuntimeCache,
    /// Live network fetch.
    Network,
    /// Built by the engine itself (offline placeholders).
    Synthetic,
}

/// A response as returned to the client.
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code
    pub status: u16,
    /// Status text
    pub status_text: String,
    /// Response headers (name → value)
    pub headers: BTreeMap<String, String>,
    /// Response body
    pub body: Vec<u8>,
    /// Where this response came from. Responses start life tagged
    /// `Network`; cache replay and the synthetic constructors re-tag.
    pub source: ResponseSource,
}

impl Response {
    /// Create a response with the standard status text for `status`.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            status_text: String::from(status_text_for(status)),
            headers: BTreeMap::new(),
            body: Vec::new(),
            source: ResponseSource::Network,
        }
    }

    /// Set the body (builder style).
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a header (builder style).
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(String::from(name), String::from(value));
        self
    }

    /// Check if response is OK (2xx)
    pub fn ok(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Synthetic offline response: plain text `Offline`, status 503.
    pub fn offline_text() -> Self {
        let mut response = Self::new(503)
            .with_header("Content-Type", "text/plain")
            .with_body(&b"Offline"[..]);
        response.status_text = String::from("Offline");
        response.source = ResponseSource::Synthetic;
        response
    }

    /// Synthetic offline response: `{"error":"offline"}`, status 503.
    /// Served when the client asked for JSON.
    pub fn offline_json() -> Self {
        let body = serde_json::json!({ "error": "offline" }).to_string();
        let mut response = Self::new(503)
            .with_header("Content-Type", "application/json")
            .with_body(body.into_bytes());
        response.status_text = String::from("Offline");
        response.source = ResponseSource::Synthetic;
        response
    }

    /// Snapshot this response for cache storage.
    pub fn to_stored(&self) -> StoredResponse {
        StoredResponse::new(self.status, self.headers.clone(), self.body.clone())
    }

    /// Rebuild a response from a stored snapshot, tagging its origin.
    pub fn from_stored(stored: StoredResponse, source: ResponseSource) -> Self {
        Self {
            status: stored.status,
            status_text: String::from(status_text_for(stored.status)),
            headers: stored.headers,
            body: stored.body,
            source,
        }
    }
}

/// Get status text for status code
fn status_text_for(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown",
    }
}

/// Result of routing one request through the engine.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The engine produced a response (cached, live, or synthetic).
    Respond(Response),
    /// Unmanaged request; the caller performs its own network fetch.
    Passthrough,
    /// Terminal failure: nothing cached and the network fetch failed.
    /// Only the navigation fallback produces this.
    Failed(NetworkError),
}

impl FetchOutcome {
    /// The response, if this outcome carries one.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Respond(response) => Some(response),
            _ => None,
        }
    }

    /// Consume the outcome, yielding its response.
    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Respond(response) => Some(response),
            _ => None,
        }
    }
}
