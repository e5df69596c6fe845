//! A single captured HTTP exchange

use serde::{Deserialize, Serialize};

use crate::network::{Headers, HttpRequest, HttpResponse};

/// One captured request/response pair
///
/// Serialized with the PascalCase keys used by the records archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RecordEntry {
    /// Request URI exactly as sent
    pub request_uri: String,
    /// Request method
    pub request_method: String,
    /// Request body, empty when none was sent
    pub request_body: String,
    /// Request headers
    pub request_headers: Headers,
    /// Response body
    pub response_body: String,
    /// Response headers
    pub response_headers: Headers,
    /// Response status code
    pub status_code: u16,
}

impl RecordEntry {
    /// Build an entry from a completed exchange
    ///
    /// Bodies that are not valid UTF-8 are stored lossily.
    #[must_use]
    pub fn from_exchange(request: &HttpRequest, response: &HttpResponse) -> Self {
        Self {
            request_uri: request.uri.clone(),
            request_method: request.method.clone(),
            request_body: String::from_utf8_lossy(&request.body).into_owned(),
            request_headers: request.headers.clone(),
            response_body: String::from_utf8_lossy(&response.body).into_owned(),
            response_headers: response.headers.clone(),
            status_code: response.status,
        }
    }

    /// Drop request headers whose names match any of `names`, ignoring case
    #[must_use]
    pub fn redact_request_headers(mut self, names: &[String]) -> Self {
        if !names.is_empty() {
            self.request_headers
                .retain(|header, _| !names.iter().any(|n| n.eq_ignore_ascii_case(header)));
        }
        self
    }

    /// Synthesize the response this entry captured
    #[must_use]
    pub fn to_response(&self) -> HttpResponse {
        HttpResponse {
            status: self.status_code,
            headers: self.response_headers.clone(),
            body: self.response_body.clone().into_bytes(),
        }
    }

    /// Consume the entry into its response
    #[must_use]
    pub fn into_response(self) -> HttpResponse {
        HttpResponse {
            status: self.status_code,
            headers: self.response_headers,
            body: self.response_body.into_bytes(),
        }
    }
}
