//! HTTP transport for GitHub requests.
//!
//! The [`Transport`] trait is the only place requests leave the process.
//! [`GitHubApi`](crate::GitHubApi) decides what to send and how to interpret
//! the answer; a transport just issues a `GET` and reports whatever came back,
//! error statuses included.

use std::future::Future;

use http::header::{ACCEPT, AUTHORIZATION, ETAG, HeaderMap, HeaderValue, IF_NONE_MATCH, LINK};
use http::Uri;
use octocrab::Octocrab;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};
use url::Url;

use crate::error::{Error, Result};

/// Media type GitHub recommends for REST requests.
const GITHUB_JSON: &str = "application/vnd.github+json";

/// A `GET` request to issue.
#[derive(Debug, Clone)]
pub struct ApiRequest<'a> {
    /// Absolute request URL, query string included.
    pub url: Url,
    /// Bearer token, or `None` for an anonymous request.
    pub token: Option<&'a SecretString>,
    /// `ETag` of a cached response to revalidate.
    pub etag: Option<String>,
}

/// A response as received, before any status interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
    pub link: Option<String>,
    pub etag: Option<String>,
}

impl RawResponse {
    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues HTTP requests.
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error only if no response was received.
    fn send(&self, request: &ApiRequest<'_>) -> impl Future<Output = Result<RawResponse>> + Send;
}

/// [`Transport`] backed by an [`Octocrab`] client.
///
/// The client is built without credentials; each request carries its own
/// token, so one transport serves every configured account.
#[derive(Debug, Clone)]
pub struct OctocrabTransport {
    client: Octocrab,
    base_url: Url,
}

impl OctocrabTransport {
    /// Creates a transport for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URI or the client cannot
    /// be built.
    #[instrument]
    pub fn new(base_url: &Url) -> Result<Self> {
        let base_uri: Uri = base_url
            .as_str()
            .parse()
            .map_err(|e: http::uri::InvalidUri| Error::InvalidRequest(e.to_string()))?;
        let client = Octocrab::builder().base_uri(base_uri)?.build()?;
        Ok(Self {
            client,
            base_url: base_url.clone(),
        })
    }

    /// Returns the URI to hand to octocrab: path and query for URLs under the
    /// base URL, the full URL otherwise.
    fn request_uri(&self, url: &Url) -> Result<Uri> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let target = match url.as_str().strip_prefix(base) {
            Some(rest) if rest.starts_with('/') => rest,
            _ => url.as_str(),
        };
        target
            .parse()
            .map_err(|e: http::uri::InvalidUri| Error::InvalidRequest(e.to_string()))
    }
}

fn request_headers(request: &ApiRequest<'_>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON));

    if let Some(token) = request.token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| Error::InvalidRequest("token is not a valid header value".to_string()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    if let Some(etag) = request.etag.as_deref()
        && let Ok(value) = etag.parse()
    {
        headers.insert(IF_NONE_MATCH, value);
    }

    Ok(headers)
}

fn header_to_string(headers: &HeaderMap, name: http::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|raw| raw.to_str().ok())
        .map(ToOwned::to_owned)
}

impl Transport for OctocrabTransport {
    #[instrument(skip(self, request), fields(url = %request.url, authenticated = request.token.is_some()))]
    async fn send(&self, request: &ApiRequest<'_>) -> Result<RawResponse> {
        let uri = self.request_uri(&request.url)?;
        let headers = request_headers(request)?;

        let response = self.client._get_with_headers(uri, Some(headers)).await?;
        let status = response.status().as_u16();
        let link = header_to_string(response.headers(), LINK);
        let etag = header_to_string(response.headers(), ETAG);

        let body = if response.status().is_success() {
            self.client.body_to_string(response).await?
        } else {
            self.client
                .body_to_string(response)
                .await
                .unwrap_or_default()
        };

        debug!(status, "received response");
        Ok(RawResponse {
            status,
            body,
            link,
            etag,
        })
    }
}
