//! Transport contract shared by the real network client and the recorder

mod client;

use std::collections::BTreeMap;

use async_trait::async_trait;

pub use client::HyperTransport;

use crate::Result;

/// Header name to the list of values sent under that name
pub type Headers = BTreeMap<String, Vec<String>>;

/// Outgoing HTTP request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method (e.g., "GET", "POST")
    pub method: String,
    /// Absolute request URI
    pub uri: String,
    /// Request headers
    pub headers: Headers,
    /// Request body
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Create a request with no headers and an empty body
    #[must_use]
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            ..Self::default()
        }
    }

    /// Append a header value
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Set the body
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// HTTP response, either received or synthesized from a record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Response body
    pub body: Vec<u8>,
}

/// Anything that can send a request and hand back the response
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request
    ///
    /// # Errors
    ///
    /// Returns error if the exchange cannot be completed
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}
