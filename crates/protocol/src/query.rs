//! Caller-facing query parameters.
//!
//! A [`QueryParams`] describes what the caller wants to see (issues or pull
//! requests, filtered and paginated) without committing to the shape of any
//! particular GitHub endpoint. The `hubnote-github` crate projects it onto the
//! REST and Search parameter shapes.
//!
//! # Examples
//!
//! ```
//! use hubnote_protocol::{FilterQuery, Query, QueryParams, QueryType};
//!
//! let params = QueryParams {
//!     query: Some(Query::Filter(
//!         FilterQuery::with_search("bug").filter("reason", "not planned"),
//!     )),
//!     ..QueryParams::new(QueryType::PullRequest)
//! };
//! assert_eq!(params.query_type, QueryType::PullRequest);
//! ```

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The kind of resource a query targets.
///
/// New kinds must be matched by every consumer that turns a query into a
/// request; consumers outside this crate treat an unknown kind as a bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum QueryType {
    /// GitHub issues.
    Issue,
    /// GitHub pull requests.
    PullRequest,
}

/// A search query, either free text or a set of qualifier filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Query {
    /// A query already written in GitHub search syntax, e.g. `is:open repo:o/r`.
    Raw(String),
    /// A structured set of qualifier filters.
    Filter(FilterQuery),
}

impl From<&str> for Query {
    fn from(value: &str) -> Self {
        Self::Raw(value.to_string())
    }
}

impl From<String> for Query {
    fn from(value: String) -> Self {
        Self::Raw(value)
    }
}

impl From<FilterQuery> for Query {
    fn from(value: FilterQuery) -> Self {
        Self::Filter(value)
    }
}

/// Structured search filters: an optional free-text term plus qualifiers.
///
/// Qualifiers keep their insertion order, which is also the order they appear
/// in the serialized search string. On the wire this is a plain object whose
/// `search` key holds the free-text term:
///
/// ```json
/// { "search": "crash", "state": "open", "label": "good first issue" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    /// Free-text search term.
    pub search: Option<String>,
    /// Qualifier name and value pairs, in insertion order.
    pub filters: Vec<(String, String)>,
}

impl FilterQuery {
    /// Creates an empty filter query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter query seeded with a free-text search term.
    #[must_use]
    pub fn with_search(search: impl Into<String>) -> Self {
        Self {
            search: Some(search.into()),
            filters: Vec::new(),
        }
    }

    /// Appends a qualifier, returning the query for chaining.
    ///
    /// A qualifier named `search` is treated as the free-text term instead.
    #[must_use]
    pub fn filter(mut self, qualifier: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(qualifier, value);
        self
    }

    /// Sets a qualifier, replacing an existing value in place.
    pub fn insert(&mut self, qualifier: impl Into<String>, value: impl Into<String>) {
        let qualifier = qualifier.into();
        let value = value.into();
        if qualifier == "search" {
            self.search = Some(value);
            return;
        }
        match self.filters.iter_mut().find(|(name, _)| *name == qualifier) {
            Some((_, existing)) => *existing = value,
            None => self.filters.push((qualifier, value)),
        }
    }

    /// Returns the value of a qualifier, if set.
    #[must_use]
    pub fn get(&self, qualifier: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|(name, _)| name == qualifier)
            .map(|(_, value)| value.as_str())
    }
}

impl Serialize for FilterQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.filters.len() + usize::from(self.search.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(search) = &self.search {
            map.serialize_entry("search", search)?;
        }
        for (qualifier, value) in &self.filters {
            map.serialize_entry(qualifier, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FilterQuery {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FilterQueryVisitor;

        impl<'de> Visitor<'de> for FilterQueryVisitor {
            type Value = FilterQuery;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of search qualifiers to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FilterQuery, A::Error> {
                let mut query = FilterQuery::new();
                while let Some((qualifier, value)) = access.next_entry::<String, String>()? {
                    query.insert(qualifier, value);
                }
                Ok(query)
            }
        }

        deserializer.deserialize_map(FilterQueryVisitor)
    }
}

/// Label filter, either a comma separated string or a list of names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Labels {
    /// A single string, passed to GitHub as-is.
    One(String),
    /// Several label names, joined with commas for GitHub.
    Many(Vec<String>),
}

impl Labels {
    /// Returns the comma-joined form GitHub expects.
    ///
    /// # Examples
    ///
    /// ```
    /// use hubnote_protocol::Labels;
    ///
    /// let labels = Labels::Many(vec!["bug".to_string(), "ui".to_string()]);
    /// assert_eq!(labels.joined(), "bug,ui");
    /// assert_eq!(Labels::One("bug,ui".to_string()).joined(), "bug,ui");
    /// ```
    #[must_use]
    pub fn joined(&self) -> String {
        match self {
            Self::One(labels) => labels.clone(),
            Self::Many(labels) => labels.join(","),
        }
    }
}

/// Parameters for an issue, pull request, or search query.
///
/// Constructed fresh for each call; unset fields are left out of the
/// request entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    /// Search query for search calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Query>,
    /// Which kind of resource the query targets.
    pub query_type: QueryType,
    /// Organization or user the query is scoped to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    /// Sort direction, `asc` or `desc`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentioned: Option<String>,
    /// Page number, 1-based.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Results per page; the configured default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u8>,
    /// ISO 8601 timestamp; only issues updated after it are returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    /// Search result order, `asc` or `desc`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Issue list filter (`assigned`, `created`, `mentioned`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl QueryParams {
    /// Creates parameters for the given query type with every filter unset.
    #[must_use]
    pub fn new(query_type: QueryType) -> Self {
        Self {
            query: None,
            query_type,
            org: None,
            assignee: None,
            creator: None,
            direction: None,
            labels: None,
            mentioned: None,
            page: None,
            per_page: None,
            since: None,
            sort: None,
            order: None,
            state: None,
            filter: None,
        }
    }

    /// Returns the raw query string, if the query is not structured.
    #[must_use]
    pub fn raw_query(&self) -> Option<&str> {
        match &self.query {
            Some(Query::Raw(query)) => Some(query),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_query_keeps_insertion_order() {
        let query: FilterQuery =
            serde_json::from_str(r#"{"state": "open", "search": "crash", "label": "ui"}"#)
                .unwrap();
        assert_eq!(query.search.as_deref(), Some("crash"));
        assert_eq!(
            query.filters,
            vec![
                ("state".to_string(), "open".to_string()),
                ("label".to_string(), "ui".to_string()),
            ]
        );
    }

    #[test]
    fn filter_query_insert_replaces_in_place() {
        let mut query = FilterQuery::new().filter("state", "open").filter("label", "ui");
        query.insert("state", "closed");
        assert_eq!(query.get("state"), Some("closed"));
        assert_eq!(query.filters[0].0, "state");
        assert_eq!(query.filters.len(), 2);
    }

    #[test]
    fn filter_query_serializes_search_first() {
        let query = FilterQuery::with_search("bug").filter("reason", "not planned");
        let json = serde_json::to_string(&query).unwrap();
        assert_eq!(json, r#"{"search":"bug","reason":"not planned"}"#);
    }

    #[test]
    fn query_deserializes_string_or_map() {
        let raw: Query = serde_json::from_str(r#""is:open""#).unwrap();
        assert_eq!(raw, Query::Raw("is:open".to_string()));

        let filter: Query = serde_json::from_str(r#"{"state": "open"}"#).unwrap();
        assert_eq!(filter, Query::Filter(FilterQuery::new().filter("state", "open")));
    }

    #[test]
    fn labels_deserialize_string_or_list() {
        let one: Labels = serde_json::from_str(r#""bug,ui""#).unwrap();
        assert_eq!(one.joined(), "bug,ui");

        let many: Labels = serde_json::from_str(r#"["bug", "ui"]"#).unwrap();
        assert_eq!(many.joined(), "bug,ui");
    }

    #[test]
    fn query_params_skip_unset_fields() {
        let params = QueryParams {
            state: Some("open".to_string()),
            ..QueryParams::new(QueryType::Issue)
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "query_type": "issue", "state": "open" })
        );
    }

    #[test]
    fn raw_query_only_for_strings() {
        let mut params = QueryParams::new(QueryType::Issue);
        assert_eq!(params.raw_query(), None);

        params.query = Some("repo:o/r".into());
        assert_eq!(params.raw_query(), Some("repo:o/r"));

        params.query = Some(FilterQuery::with_search("x").into());
        assert_eq!(params.raw_query(), None);
    }
}
