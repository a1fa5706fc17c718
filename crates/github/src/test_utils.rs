//! In-process transport for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use secrecy::ExposeSecret;
use serde_json::{Value, json};

use crate::error::Result;
use crate::transport::{ApiRequest, RawResponse, Transport};

/// A request as seen by [`FakeTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedRequest {
    pub url: String,
    pub token: Option<String>,
    pub etag: Option<String>,
}

/// Transport answering from canned responses keyed by URL path.
///
/// Paths without a canned response answer `404 Not Found`.
#[derive(Debug, Default)]
pub(crate) struct FakeTransport {
    responses: Mutex<HashMap<String, RawResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every response, so concurrent callers overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(&self, path: &str, status: u16, body: Value) {
        self.respond_raw(path, status, body, None, None);
    }

    pub fn respond_with_etag(&self, path: &str, status: u16, body: Value, etag: &str) {
        self.respond_raw(path, status, body, None, Some(etag.to_string()));
    }

    pub fn respond_with_link(&self, path: &str, status: u16, body: Value, link: &str) {
        self.respond_raw(path, status, body, Some(link.to_string()), None);
    }

    fn respond_raw(
        &self,
        path: &str,
        status: u16,
        body: Value,
        link: Option<String>,
        etag: Option<String>,
    ) {
        self.responses.lock().unwrap().insert(
            path.to_string(),
            RawResponse {
                status,
                body: body.to_string(),
                link,
                etag,
            },
        );
    }

    /// Number of requests sent so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests sent so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    async fn send(&self, request: &ApiRequest<'_>) -> Result<RawResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(RecordedRequest {
            url: request.url.to_string(),
            token: request.token.map(|token| token.expose_secret().to_string()),
            etag: request.etag.clone(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let canned = self.responses.lock().unwrap().get(request.url.path()).cloned();
        Ok(canned.unwrap_or_else(|| RawResponse {
            status: 404,
            body: json!({ "message": "Not Found" }).to_string(),
            link: None,
            etag: None,
        }))
    }
}
