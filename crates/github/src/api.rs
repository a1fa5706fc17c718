//! Cached, deduplicated GitHub request execution.
//!
//! [`GitHubApi`] owns the request policy shared by every fetch:
//!
//! - A response younger than the cache TTL is served without a network call,
//!   unless the caller asked to skip the cache.
//! - An older response with an `ETag` is revalidated with `If-None-Match`; a
//!   `304 Not Modified` refreshes it in place.
//! - Concurrent calls with the same [`RequestSignature`] share one network
//!   call, including calls that skip the cache.
//! - Only successful responses are stored. Any other status fails with
//!   [`Error::Request`].
//! - Records older than [`retention`] of the TTL are pruned when the client
//!   is built from configuration and again every few hundred stores.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use hubnote_config::Config;
use hubnote_protocol::{CheckRunList, Issue, IssueSearchResponse, PullRequest};
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::cache::{
    CacheStore, CachedResponse, DiskCache, MemoryCache, RequestSignature, retention,
};
use crate::error::{Error, Result};
use crate::pagination::Paginated;
use crate::params::{IssueListParams, IssueSearchParams, PullListParams};
use crate::transport::{ApiRequest, OctocrabTransport, Transport};

/// HTTP status for a successful conditional revalidation.
const NOT_MODIFIED: u16 = 304;

/// Number of cache writes between two pruning passes.
const PRUNE_EVERY: usize = 256;

type InFlight = Arc<OnceCell<Result<CachedResponse>>>;

/// GitHub REST client with response caching and request deduplication.
#[derive(Debug)]
pub struct GitHubApi<T = OctocrabTransport> {
    transport: T,
    cache: Box<dyn CacheStore>,
    base_url: Url,
    ttl: Duration,
    retention: Duration,
    stores: AtomicUsize,
    in_flight: Mutex<HashMap<RequestSignature, InFlight>>,
}

impl GitHubApi<OctocrabTransport> {
    /// Builds a client for the API and cache settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API base URL is invalid, the HTTP client
    /// cannot be built, or the persistent cache directory cannot be created.
    #[instrument(skip(config))]
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config.api_base_url()?;
        let transport = OctocrabTransport::new(&base_url)?;

        let cache: Box<dyn CacheStore> = if config.cache.persistent {
            match &config.cache.directory {
                Some(directory) => Box::new(DiskCache::with_path(directory.clone())?),
                None => Box::new(DiskCache::new()?),
            }
        } else {
            Box::new(MemoryCache::new())
        };
        debug!(?cache, ttl_secs = config.cache.ttl_secs, "created GitHub API client");

        let api = Self::new(transport, cache, base_url, config.cache.ttl());
        api.prune_cache();
        Ok(api)
    }
}

impl<T: Transport> GitHubApi<T> {
    /// Creates a client issuing requests through `transport`.
    #[must_use]
    pub fn new(transport: T, cache: Box<dyn CacheStore>, base_url: Url, ttl: Duration) -> Self {
        Self {
            transport,
            cache,
            base_url,
            ttl,
            retention: retention(ttl),
            stores: AtomicUsize::new(0),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches a single issue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Request`] if GitHub answers with an error status, or
    /// another [`Error`] if the request fails or the response cannot be
    /// decoded.
    #[instrument(skip(self, token))]
    pub async fn get_issue(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        token: Option<&SecretString>,
        skip_cache: bool,
    ) -> Result<Issue> {
        let number = number.to_string();
        let url = self.endpoint(&["repos", org, repo, "issues", &number])?;
        self.fetch(url, token, skip_cache).await?.decode()
    }

    /// Fetches a single pull request.
    ///
    /// # Errors
    ///
    /// See [`get_issue`](Self::get_issue).
    #[instrument(skip(self, token))]
    pub async fn get_pull_request(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        token: Option<&SecretString>,
        skip_cache: bool,
    ) -> Result<PullRequest> {
        let number = number.to_string();
        let url = self.endpoint(&["repos", org, repo, "pulls", &number])?;
        self.fetch(url, token, skip_cache).await?.decode()
    }

    /// Lists one page of a repository's issues.
    ///
    /// # Errors
    ///
    /// See [`get_issue`](Self::get_issue).
    #[instrument(skip(self, token))]
    pub async fn list_issues_for_repo(
        &self,
        org: &str,
        repo: &str,
        params: &IssueListParams,
        token: Option<&SecretString>,
        skip_cache: bool,
    ) -> Result<Paginated<Vec<Issue>>> {
        let url = with_query(self.endpoint(&["repos", org, repo, "issues"])?, params)?;
        paginated(&self.fetch(url, token, skip_cache).await?)
    }

    /// Lists one page of an organization's issues visible to the token.
    ///
    /// # Errors
    ///
    /// See [`get_issue`](Self::get_issue).
    #[instrument(skip(self, token))]
    pub async fn list_issues_for_organization(
        &self,
        org: &str,
        params: &IssueListParams,
        token: Option<&SecretString>,
        skip_cache: bool,
    ) -> Result<Paginated<Vec<Issue>>> {
        let url = with_query(self.endpoint(&["orgs", org, "issues"])?, params)?;
        paginated(&self.fetch(url, token, skip_cache).await?)
    }

    /// Lists one page of a repository's pull requests.
    ///
    /// # Errors
    ///
    /// See [`get_issue`](Self::get_issue).
    #[instrument(skip(self, token))]
    pub async fn list_pull_requests_for_repo(
        &self,
        org: &str,
        repo: &str,
        params: &PullListParams,
        token: Option<&SecretString>,
        skip_cache: bool,
    ) -> Result<Paginated<Vec<PullRequest>>> {
        let url = with_query(self.endpoint(&["repos", org, repo, "pulls"])?, params)?;
        paginated(&self.fetch(url, token, skip_cache).await?)
    }

    /// Lists one page of the issues assigned to the token's owner.
    ///
    /// Without a token there is no owner: the result is an empty page and no
    /// request is made.
    ///
    /// # Errors
    ///
    /// See [`get_issue`](Self::get_issue).
    #[instrument(skip(self, token), fields(authenticated = token.is_some()))]
    pub async fn list_issues_for_token(
        &self,
        params: &IssueListParams,
        token: Option<&SecretString>,
        skip_cache: bool,
    ) -> Result<Paginated<Vec<Issue>>> {
        let Some(token) = token else {
            debug!("no token, returning empty issue list");
            return Ok(Paginated::empty());
        };
        let url = with_query(self.endpoint(&["issues"])?, params)?;
        paginated(&self.fetch(url, Some(token), skip_cache).await?)
    }

    /// Lists the check runs of a commit, branch or tag.
    ///
    /// # Errors
    ///
    /// See [`get_issue`](Self::get_issue).
    #[instrument(skip(self, token))]
    pub async fn list_check_runs_for_ref(
        &self,
        org: &str,
        repo: &str,
        git_ref: &str,
        token: Option<&SecretString>,
        skip_cache: bool,
    ) -> Result<CheckRunList> {
        let url = self.endpoint(&["repos", org, repo, "commits", git_ref, "check-runs"])?;
        self.fetch(url, token, skip_cache).await?.decode()
    }

    /// Runs one page of an issue and pull request search.
    ///
    /// # Errors
    ///
    /// See [`get_issue`](Self::get_issue).
    #[instrument(skip(self, token), fields(q = %params.q))]
    pub async fn search_issues(
        &self,
        params: &IssueSearchParams,
        token: Option<&SecretString>,
        skip_cache: bool,
    ) -> Result<Paginated<IssueSearchResponse>> {
        let url = with_query(self.endpoint(&["search", "issues"])?, params)?;
        paginated(&self.fetch(url, token, skip_cache).await?)
    }

    /// Fetches an arbitrary URL and decodes the body.
    ///
    /// Used for URLs GitHub hands out in other responses, such as an issue's
    /// `timeline_url`. Goes through the same cache and deduplication as every
    /// other fetch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if `url` is not a valid URL; see
    /// [`get_issue`](Self::get_issue) for the rest.
    #[instrument(skip(self, token))]
    pub async fn queue_request<R: DeserializeOwned>(
        &self,
        url: &str,
        token: Option<&SecretString>,
        skip_cache: bool,
    ) -> Result<R> {
        let url = Url::parse(url)?;
        self.fetch(url, token, skip_cache).await?.decode()
    }

    /// Builds an endpoint URL under the base URL, percent-encoding segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidRequest(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Returns the response for `url`, from the cache or the network.
    async fn fetch(
        &self,
        url: Url,
        token: Option<&SecretString>,
        skip_cache: bool,
    ) -> Result<CachedResponse> {
        let signature = RequestSignature::new(&url, token);
        let cached = self.load(&signature);

        if !skip_cache
            && let Some(entry) = &cached
            && !entry.is_expired(self.ttl)
        {
            debug!(url = signature.url(), "serving cached response");
            return Ok(entry.clone());
        }

        let cell = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(in_flight.entry(signature.clone()).or_default())
        };

        let result = cell
            .get_or_init(|| self.revalidate(url, token, &signature, cached))
            .await
            .clone();

        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if in_flight
                .get(&signature)
                .is_some_and(|current| Arc::ptr_eq(current, &cell))
            {
                in_flight.remove(&signature);
            }
        }

        result
    }

    /// Issues the network call for `signature` and updates the cache.
    async fn revalidate(
        &self,
        url: Url,
        token: Option<&SecretString>,
        signature: &RequestSignature,
        cached: Option<CachedResponse>,
    ) -> Result<CachedResponse> {
        let request = ApiRequest {
            url,
            token,
            etag: cached.as_ref().and_then(|entry| entry.etag.clone()),
        };
        debug!(url = signature.url(), conditional = request.etag.is_some(), "sending request");
        let response = self.transport.send(&request).await?;

        if response.status == NOT_MODIFIED
            && let Some(mut entry) = cached
        {
            debug!(url = signature.url(), "response not modified");
            entry.touch();
            self.store(signature, &entry);
            return Ok(entry);
        }

        if !response.is_success() {
            warn!(url = signature.url(), status = response.status, "GitHub request failed");
            return Err(Error::Request {
                status: response.status,
                body: response.body,
            });
        }

        let entry = CachedResponse::new(response.body, response.link, response.etag);
        self.store(signature, &entry);
        Ok(entry)
    }

    fn load(&self, signature: &RequestSignature) -> Option<CachedResponse> {
        self.cache.get(signature).unwrap_or_else(|e| {
            warn!(url = signature.url(), error = %e, "failed to read cached response");
            None
        })
    }

    fn store(&self, signature: &RequestSignature, entry: &CachedResponse) {
        if let Err(e) = self.cache.put(signature, entry) {
            warn!(url = signature.url(), error = %e, "failed to cache response");
            return;
        }
        if self.stores.fetch_add(1, Ordering::Relaxed) % PRUNE_EVERY == PRUNE_EVERY - 1 {
            self.prune_cache();
        }
    }

    fn prune_cache(&self) {
        match self.cache.prune(self.retention) {
            Ok(0) => {}
            Ok(removed) => debug!(removed, "pruned cached responses"),
            Err(e) => warn!(error = %e, "failed to prune response cache"),
        }
    }
}

fn paginated<R: DeserializeOwned>(entry: &CachedResponse) -> Result<Paginated<R>> {
    Ok(Paginated {
        meta: entry.page_meta(),
        response: entry.decode()?,
    })
}

/// Appends the set fields of `params` to the query string of `url`.
fn with_query<P: Serialize>(mut url: Url, params: &P) -> Result<Url> {
    let Value::Object(fields) = serde_json::to_value(params)? else {
        return Err(Error::InvalidRequest(
            "query parameters must serialize to an object".to_string(),
        ));
    };

    let pairs: Vec<(String, String)> = fields
        .into_iter()
        .filter_map(|(name, value)| match value {
            Value::Null => None,
            Value::String(value) => Some((name, value)),
            other => Some((name, other.to_string())),
        })
        .collect();

    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    Ok(url)
}
