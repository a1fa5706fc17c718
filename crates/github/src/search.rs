//! GitHub search query serialization.
//!
//! Turns a [`QueryParams`] query into GitHub's space-delimited
//! `qualifier:value` search syntax and appends the qualifier selecting issues
//! or pull requests.
//!
//! # Examples
//!
//! ```
//! use hubnote_github::search::serialize_query_params;
//! use hubnote_protocol::{FilterQuery, QueryParams, QueryType};
//!
//! let params = QueryParams {
//!     query: Some(FilterQuery::with_search("bug").filter("reason", "not planned").into()),
//!     ..QueryParams::new(QueryType::PullRequest)
//! };
//! assert_eq!(serialize_query_params(&params), r#"bug reason:"not planned" type:pr"#);
//! ```

use hubnote_protocol::{FilterQuery, Query, QueryParams, QueryType};

/// Appends ` qualifier:value` to `query`.
///
/// The value is trimmed and wrapped in double quotes when it contains
/// whitespace, unless it already carries quotes.
fn append_filter(mut query: String, qualifier: &str, value: &str) -> String {
    let value = value.trim();
    if !query.is_empty() {
        query.push(' ');
    }
    query.push_str(qualifier);
    query.push(':');
    if value.contains(char::is_whitespace) && !value.contains('"') {
        query.push('"');
        query.push_str(value);
        query.push('"');
    } else {
        query.push_str(value);
    }
    query
}

fn fold_filters(filter: &FilterQuery) -> String {
    let seed = filter.search.clone().unwrap_or_default();
    filter
        .filters
        .iter()
        .fold(seed, |query, (qualifier, value)| {
            append_filter(query, qualifier, value)
        })
}

/// Returns the mandatory `type:` qualifier value for a query type.
///
/// # Panics
///
/// Panics on a query type this module does not know about; that is always a
/// missing match arm, never a runtime condition.
fn type_qualifier(query_type: QueryType) -> &'static str {
    match query_type {
        QueryType::Issue => "issue",
        QueryType::PullRequest => "pr",
        other => unreachable!("query type {other:?} has no search qualifier"),
    }
}

/// Serializes the search query of `params`.
///
/// A structured query contributes its free-text term followed by its
/// qualifiers in insertion order; a raw query is used as-is. The result always
/// ends with exactly one `type:issue` or `type:pr` qualifier, so serializing
/// an already serialized query does not repeat it.
///
/// # Panics
///
/// Panics if `params.query_type` is a kind without a search qualifier.
#[must_use]
pub fn serialize_query_params(params: &QueryParams) -> String {
    let query = match &params.query {
        None => String::new(),
        Some(Query::Raw(query)) => query.clone(),
        Some(Query::Filter(filter)) => fold_filters(filter),
    };
    let query = query.trim();

    let qualifier = type_qualifier(params.query_type);
    let already_typed = query
        .rsplit(char::is_whitespace)
        .next()
        .and_then(|last| last.strip_prefix("type:"))
        == Some(qualifier);
    if already_typed {
        return query.to_string();
    }

    append_filter(query.to_string(), "type", qualifier)
}
