//! Shared types for hubnote.
//!
//! This crate defines the types exchanged between hubnote's components and
//! its callers: the caller-facing query parameters and the GitHub response
//! models the request layer decodes into.
//!
//! # Overview
//!
//! - [`query`]: [`QueryParams`], [`Query`], [`FilterQuery`], [`QueryType`] and [`Labels`]
//! - [`models`]: issues, pull requests, search results and check runs
//! - [`timeline`]: issue timeline events
//!
//! # Examples
//!
//! ```
//! use hubnote_protocol::{Labels, QueryParams, QueryType};
//!
//! let params = QueryParams {
//!     state: Some("open".to_string()),
//!     labels: Some(Labels::Many(vec!["bug".to_string(), "ui".to_string()])),
//!     per_page: Some(20),
//!     ..QueryParams::new(QueryType::Issue)
//! };
//! assert_eq!(params.labels.unwrap().joined(), "bug,ui");
//! ```

pub mod models;
pub mod query;
pub mod timeline;

pub use models::{
    CheckRun, CheckRunList, GitRef, Issue, IssueSearchResponse, Label, PullRequest,
    PullRequestLinks, User,
};
pub use query::{FilterQuery, Labels, Query, QueryParams, QueryType};
pub use timeline::{CrossReferenceIssue, CrossReferenceSource, TimelineEvent};
