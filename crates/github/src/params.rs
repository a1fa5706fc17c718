//! Endpoint parameter shapes and their builders.
//!
//! Each builder projects a caller's [`QueryParams`] onto the exact parameter
//! names one GitHub endpoint accepts, through [`translate`]. Unset fields
//! never reach the wire, `labels` is always comma-joined, `sort` is limited
//! to what the endpoint accepts, and `per_page` is always set.

use hubnote_protocol::{Labels, QueryParams};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Result;
use crate::search::serialize_query_params;
use crate::sort::{issue_list_sort, pull_list_sort, search_sort};
use crate::translate::{FieldMap, translate};

/// Parameters of the issue list endpoints (`/issues`, `/repos/{o}/{r}/issues`,
/// `/orgs/{o}/issues`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    /// Comma separated label names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentioned: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Only honored by the organization and token listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Parameters of `/repos/{o}/{r}/pulls`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Parameters of `/search/issues`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSearchParams {
    /// Serialized search query, always ending with a `type:` qualifier.
    pub q: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u8>,
}

/// Parameter shapes that carry a page size.
pub trait PageSize {
    /// Returns the page size slot.
    fn per_page_mut(&mut self) -> &mut Option<u8>;
}

impl PageSize for IssueListParams {
    fn per_page_mut(&mut self) -> &mut Option<u8> {
        &mut self.per_page
    }
}

impl PageSize for PullListParams {
    fn per_page_mut(&mut self) -> &mut Option<u8> {
        &mut self.per_page
    }
}

impl PageSize for IssueSearchParams {
    fn per_page_mut(&mut self) -> &mut Option<u8> {
        &mut self.per_page
    }
}

/// Fills in `per_page` with `default` unless the caller set it.
pub fn set_page_size<P: PageSize>(params: &mut P, default: u8) {
    params.per_page_mut().get_or_insert(default);
}

fn joined_labels(params: &QueryParams) -> serde_json::Value {
    json!(params.labels.as_ref().map(Labels::joined))
}

fn issue_list_fields() -> FieldMap<QueryParams> {
    FieldMap::<QueryParams>::new()
        .copy("assignee")
        .copy("creator")
        .copy("direction")
        .transform("labels", joined_labels)
        .copy("mentioned")
        .copy("page")
        .copy("per_page")
        .copy("since")
        .transform("sort", |params| json!(issue_list_sort(params)))
        .copy("state")
}

fn build<P: PageSize>(mut params: P, default_page_size: u8) -> P {
    set_page_size(&mut params, default_page_size);
    params
}

/// Builds repository and token issue list parameters.
///
/// The `filter` field is not forwarded; use
/// [`organization_issue_list_params`] for listings that honor it.
///
/// # Errors
///
/// Returns [`Error::Decode`](crate::Error::Decode) if the projection fails.
///
/// # Examples
///
/// ```
/// use hubnote_github::params::issue_list_params;
/// use hubnote_protocol::{Labels, QueryParams, QueryType};
///
/// let query = QueryParams {
///     labels: Some(Labels::Many(vec!["bug".into(), "ui".into()])),
///     sort: Some("created_at".into()),
///     ..QueryParams::new(QueryType::Issue)
/// };
/// let params = issue_list_params(&query, 30).unwrap();
/// assert_eq!(params.labels.as_deref(), Some("bug,ui"));
/// assert_eq!(params.sort.as_deref(), Some("created"));
/// assert_eq!(params.per_page, Some(30));
/// ```
pub fn issue_list_params(query: &QueryParams, default_page_size: u8) -> Result<IssueListParams> {
    let params = translate(query, &issue_list_fields(), true, true)?;
    Ok(build(params, default_page_size))
}

/// Builds organization issue list parameters, including `filter`.
///
/// # Errors
///
/// Returns [`Error::Decode`](crate::Error::Decode) if the projection fails.
pub fn organization_issue_list_params(
    query: &QueryParams,
    default_page_size: u8,
) -> Result<IssueListParams> {
    let params = translate(query, &issue_list_fields().copy("filter"), true, true)?;
    Ok(build(params, default_page_size))
}

/// Builds pull request list parameters.
///
/// # Errors
///
/// Returns [`Error::Decode`](crate::Error::Decode) if the projection fails.
pub fn pull_list_params(query: &QueryParams, default_page_size: u8) -> Result<PullListParams> {
    let fields = FieldMap::<QueryParams>::new()
        .copy("direction")
        .copy("page")
        .copy("per_page")
        .transform("sort", |params| json!(pull_list_sort(params)))
        .copy("state");
    let params = translate(query, &fields, true, true)?;
    Ok(build(params, default_page_size))
}

/// Builds issue search parameters.
///
/// # Errors
///
/// Returns [`Error::Decode`](crate::Error::Decode) if the projection fails.
///
/// # Panics
///
/// Panics if the query type has no search qualifier; see
/// [`serialize_query_params`].
pub fn issue_search_params(
    query: &QueryParams,
    default_page_size: u8,
) -> Result<IssueSearchParams> {
    let fields = FieldMap::<QueryParams>::new()
        .transform("q", |params| json!(serialize_query_params(params)))
        .transform("sort", |params| json!(search_sort(params)))
        .copy("order")
        .copy("page")
        .copy("per_page");
    let params = translate(query, &fields, true, true)?;
    Ok(build(params, default_page_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubnote_protocol::QueryType;

    fn issues() -> QueryParams {
        QueryParams::new(QueryType::Issue)
    }

    #[test]
    fn defaults_page_size() {
        let params = issue_list_params(&issues(), 30).unwrap();
        assert_eq!(
            params,
            IssueListParams {
                per_page: Some(30),
                ..IssueListParams::default()
            }
        );
    }

    #[test]
    fn explicit_page_size_wins() {
        let query = QueryParams {
            per_page: Some(5),
            page: Some(2),
            ..issues()
        };
        let params = pull_list_params(&query, 30).unwrap();
        assert_eq!(params.per_page, Some(5));
        assert_eq!(params.page, Some(2));
    }

    #[test]
    fn repo_listing_drops_filter() {
        let query = QueryParams {
            filter: Some("assigned".into()),
            state: Some("open".into()),
            ..issues()
        };
        let params = issue_list_params(&query, 30).unwrap();
        assert_eq!(params.filter, None);
        assert_eq!(params.state.as_deref(), Some("open"));

        let params = organization_issue_list_params(&query, 30).unwrap();
        assert_eq!(params.filter.as_deref(), Some("assigned"));
    }

    #[test]
    fn unset_fields_are_not_serialized() {
        let query = QueryParams {
            state: Some("closed".into()),
            sort: Some("bogus".into()),
            ..issues()
        };
        let params = issue_list_params(&query, 10).unwrap();
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json, json!({ "state": "closed", "per_page": 10 }));
    }

    #[test]
    fn pull_params_ignore_issue_only_fields() {
        let query = QueryParams {
            assignee: Some("octocat".into()),
            labels: Some(Labels::One("bug".into())),
            sort: Some("popularity".into()),
            ..QueryParams::new(QueryType::PullRequest)
        };
        let params = pull_list_params(&query, 30).unwrap();
        assert_eq!(
            params,
            PullListParams {
                per_page: Some(30),
                sort: Some("popularity".into()),
                ..PullListParams::default()
            }
        );
    }

    #[test]
    fn search_params_serialize_query() {
        let query = QueryParams {
            query: Some("repo:o/r is:open".into()),
            order: Some("desc".into()),
            sort: Some("reactions".into()),
            ..issues()
        };
        let params = issue_search_params(&query, 50).unwrap();
        assert_eq!(params.q, "repo:o/r is:open type:issue");
        assert_eq!(params.order.as_deref(), Some("desc"));
        assert_eq!(params.sort.as_deref(), Some("reactions"));
        assert_eq!(params.per_page, Some(50));
    }

    #[test]
    fn set_page_size_keeps_existing() {
        let mut params = PullListParams {
            per_page: Some(7),
            ..PullListParams::default()
        };
        set_page_size(&mut params, 30);
        assert_eq!(params.per_page, Some(7));
    }
}
