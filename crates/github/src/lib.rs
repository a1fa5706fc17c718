//! GitHub request layer for hubnote.
//!
//! This crate turns caller-facing [`QueryParams`](hubnote_protocol::QueryParams)
//! into GitHub REST and Search requests, picks the right credential for each,
//! and executes them through a cache that avoids redundant network calls.
//!
//! # Overview
//!
//! - [`GitHubClient`]: account-aware entry point; one method per operation
//! - [`GitHubApi`]: cached, deduplicated request execution
//! - [`translate`] and [`params`]: projection of query parameters onto
//!   endpoint parameter shapes
//! - [`search`]: GitHub search query serialization
//! - [`cache`]: request signatures and cache stores
//! - [`transport`]: the HTTP boundary, backed by octocrab
//! - [`timeline`]: linked pull request lookup
//!
//! # Authentication
//!
//! Every request carries either the bearer token of the account configured
//! for the organization involved, or no token at all:
//!
//! - **Authenticated**: 5,000 requests/hour, access to private repos
//! - **Unauthenticated**: 60 requests/hour, public repos only
//!
//! Tokens are handled as [`secrecy::SecretString`] and never appear in logs,
//! cache keys, or cache files.
//!
//! # Caching
//!
//! Responses are cached per request signature: the normalized URL plus the
//! credential. A cached response is served while younger than the configured
//! TTL; afterwards it is revalidated with its `ETag`. Passing
//! `skip_cache = true` to any operation forces a network call. Concurrent
//! identical requests share one network call.
//!
//! # Examples
//!
//! ```no_run
//! use hubnote_config::Config;
//! use hubnote_github::GitHubClient;
//! use hubnote_protocol::{FilterQuery, QueryParams, QueryType};
//!
//! # async fn example() -> hubnote_github::Result<()> {
//! let client = GitHubClient::from_config(Config::load()?)?;
//!
//! let params = QueryParams {
//!     query: Some(FilterQuery::with_search("panic").filter("repo", "rust-lang/rust").into()),
//!     ..QueryParams::new(QueryType::Issue)
//! };
//! let results = client.search_issues(&params, false).await?;
//! for issue in &results.response.items {
//!     println!("#{} {}", issue.number, issue.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod client;
pub mod error;
pub mod pagination;
pub mod params;
pub mod search;
pub mod sort;
pub mod timeline;
pub mod transport;
pub mod translate;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export primary types at crate root for convenience
pub use api::GitHubApi;
pub use cache::{CacheStore, CachedResponse, DiskCache, MemoryCache, RequestSignature};
pub use client::GitHubClient;
pub use error::{Error, Result};
pub use pagination::{PageMeta, Paginated};
pub use params::{IssueListParams, IssueSearchParams, PullListParams};
pub use search::serialize_query_params;
pub use transport::{ApiRequest, OctocrabTransport, RawResponse, Transport};
