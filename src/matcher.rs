//! Match-key computation for requests and stored records
//!
//! Keys are purely textual: method, URI and header values are used exactly as
//! given, so record and playback runs must issue byte-identical requests.

use std::fmt::Write as _;

use crate::network::{Headers, HttpRequest};
use crate::recording::RecordEntry;

/// Strategy turning a request or a record into its match-key
pub trait RecordMatcher: Send + Sync {
    /// Compute the key from request parts
    fn key_for(&self, method: &str, uri: &str, headers: &Headers) -> String;

    /// Key of a live request
    fn request_key(&self, request: &HttpRequest) -> String {
        self.key_for(&request.method, &request.uri, &request.headers)
    }

    /// Key of a stored record
    fn entry_key(&self, entry: &RecordEntry) -> String {
        self.key_for(
            &entry.request_method,
            &entry.request_uri,
            &entry.request_headers,
        )
    }
}

/// Method + URI matcher, optionally extended with selected header values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleMatcher {
    matching_headers: Vec<String>,
}

impl SimpleMatcher {
    /// Matcher on method and URI only
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Matcher that also keys on the given headers, in the given order
    #[must_use]
    pub fn with_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            matching_headers: headers.into_iter().map(Into::into).collect(),
        }
    }

    /// Configured header names
    #[must_use]
    pub fn matching_headers(&self) -> &[String] {
        &self.matching_headers
    }
}

impl RecordMatcher for SimpleMatcher {
    fn key_for(&self, method: &str, uri: &str, headers: &Headers) -> String {
        let mut key = format!("{method} {uri}");

        for name in &self.matching_headers {
            if let Some(values) = headers.get(name) {
                // Writing to a String cannot fail
                let _ = write!(key, " [{name}: {}]", values.join(","));
            }
        }

        key
    }
}
