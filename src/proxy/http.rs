//! Intercepting transport that records or replays HTTP exchanges

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::Mode;
use crate::matcher::RecordMatcher;
use crate::network::{HttpRequest, HttpResponse, Transport};
use crate::recording::{RecordEntry, Session};
use crate::Result;

/// Transport wrapper driven by the session mode
///
/// - Record: forward to the inner transport and capture the exchange
/// - Playback: answer from the session's records, never touching the inner transport
/// - None: forward only
pub struct HttpRecorder<T> {
    session: Arc<Session>,
    matcher: Arc<dyn RecordMatcher>,
    inner: T,
}

impl<T: Transport> HttpRecorder<T> {
    /// Create a recorder using the session's matcher
    #[must_use]
    pub fn new(session: Arc<Session>, inner: T) -> Self {
        let matcher = session.matcher();
        Self {
            session,
            matcher,
            inner,
        }
    }

    /// Use a different matcher for this recorder's playback lookups
    #[must_use]
    pub fn with_matcher(mut self, matcher: Arc<dyn RecordMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Session this recorder reads from and writes to
    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Wrapped transport
    #[must_use]
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Asset name for a test, see [`Session::get_asset_name`]
    ///
    /// # Errors
    ///
    /// Returns error if no recorded names remain in playback mode
    pub fn get_asset_name(&self, test_name: &str) -> Result<String> {
        self.session.get_asset_name(test_name)
    }

    /// Seed a playback entry, see [`Session::inject_record_entry`]
    ///
    /// # Errors
    ///
    /// Returns error if the session is not in playback mode
    pub fn inject_record_entry(&self, entry: RecordEntry) -> Result<()> {
        self.session.inject_record_entry(entry)
    }

    fn replay(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let key = self.matcher.request_key(request);
        debug!("Playback: {key}");
        Ok(self.session.take(&key)?.into_response())
    }

    async fn record(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!("Record: {} {}", request.method, request.uri);

        let response = self.inner.send(request.clone()).await?;

        let entry = RecordEntry::from_exchange(&request, &response)
            .redact_request_headers(&self.session.config().redact_request_headers);
        self.session.capture(entry).await?;

        Ok(response)
    }
}

#[async_trait]
impl<T: Transport> Transport for HttpRecorder<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        match self.session.mode() {
            Mode::Playback => self.replay(&request),
            Mode::Record => self.record(request).await,
            Mode::None => self.inner.send(request).await,
        }
    }
}
