//! HTTP client used as the real transport in record and pass-through modes

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request, Uri};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, warn};

use super::{Headers, HttpRequest, HttpResponse, Transport};
use crate::{RecorderError, Result};

/// Pooled hyper client sending requests over the network
///
/// Both `http://` and `https://` URIs are accepted; TLS uses the platform's
/// native implementation.
pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl HyperTransport {
    /// Create a new HTTP/HTTPS client
    #[must_use]
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build(HttpsConnector::new());

        Self { client }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let http_request = build_request(&request)?;

        debug!("Sending {} {}", request.method, request.uri);

        let response = self.client.request(http_request).await.map_err(|e| {
            let message = format!("Request failed: {}", error_chain(&e));
            warn!("{message}");
            RecorderError::Transport(message)
        })?;

        let status = response.status().as_u16();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            headers
                .entry(name.to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| RecorderError::Transport(format!("Failed to read response body: {e}")))?
            .to_bytes();

        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

/// Render an error with its sources, e.g. `client error (Connect): tcp connect error: ...`
fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Convert a request into a hyper request
fn build_request(request: &HttpRequest) -> Result<Request<Full<Bytes>>> {
    let method = request.method.parse::<Method>().map_err(|e| {
        RecorderError::Transport(format!("Invalid HTTP method '{}': {e}", request.method))
    })?;

    let uri = request
        .uri
        .parse::<Uri>()
        .map_err(|e| RecorderError::Transport(format!("Invalid URI '{}': {e}", request.uri)))?;

    let mut builder = Request::builder().method(method).uri(uri);
    for (name, values) in &request.headers {
        for value in values {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }

    builder
        .body(Full::new(Bytes::copy_from_slice(&request.body)))
        .map_err(|e| RecorderError::Transport(format!("Failed to build request: {e}")))
}
