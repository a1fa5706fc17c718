//! Sort field translation per endpoint.
//!
//! The issue list, pull request list and search endpoints accept different
//! `sort` values. A query's sort is lowercased, stripped of an `_at` suffix
//! (`created_at` means `created`), and kept only if the target endpoint
//! accepts it.

use hubnote_protocol::QueryParams;

/// Sort values accepted by the issue list endpoints.
const ISSUE_LIST_SORTS: &[&str] = &["created", "updated", "comments"];

/// Sort values accepted by the pull request list endpoint.
const PULL_LIST_SORTS: &[&str] = &["created", "updated", "popularity", "long-running"];

/// Sort values accepted by the issue search endpoint.
const SEARCH_SORTS: &[&str] = &[
    "comments",
    "reactions",
    "reactions-+1",
    "reactions--1",
    "reactions-smile",
    "reactions-thinking_face",
    "reactions-heart",
    "reactions-tada",
    "interactions",
    "created",
    "updated",
];

fn pick(params: &QueryParams, accepted: &[&'static str]) -> Option<&'static str> {
    let sort = params.sort.as_deref()?.trim().to_lowercase();
    let sort = sort.strip_suffix("_at").unwrap_or(&sort);
    accepted.iter().copied().find(|candidate| *candidate == sort)
}

/// Returns the `sort` value for the issue list endpoints.
///
/// # Examples
///
/// ```
/// use hubnote_github::sort::issue_list_sort;
/// use hubnote_protocol::{QueryParams, QueryType};
///
/// let mut params = QueryParams::new(QueryType::Issue);
/// params.sort = Some("Updated_At".to_string());
/// assert_eq!(issue_list_sort(&params), Some("updated"));
///
/// params.sort = Some("popularity".to_string());
/// assert_eq!(issue_list_sort(&params), None);
/// ```
#[must_use]
pub fn issue_list_sort(params: &QueryParams) -> Option<&'static str> {
    pick(params, ISSUE_LIST_SORTS)
}

/// Returns the `sort` value for the pull request list endpoint.
#[must_use]
pub fn pull_list_sort(params: &QueryParams) -> Option<&'static str> {
    pick(params, PULL_LIST_SORTS)
}

/// Returns the `sort` value for the issue search endpoint.
#[must_use]
pub fn search_sort(params: &QueryParams) -> Option<&'static str> {
    pick(params, SEARCH_SORTS)
}
