//! Pagination metadata for list and search responses.
//!
//! GitHub reports page linkage in the `Link` response header:
//!
//! ```text
//! <https://api.github.com/repos/o/r/issues?page=2>; rel="next", <https://api.github.com/repos/o/r/issues?page=5>; rel="last"
//! ```
//!
//! [`parse_link_header`] reduces that to page numbers.

use serde::{Deserialize, Serialize};
use url::Url;

/// Page numbers linked from a paginated response.
///
/// Serializes as `{}` when the response fits on a single page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<u32>,
}

impl PageMeta {
    /// Returns `true` if another page follows this one.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// A page of results with its pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub meta: PageMeta,
    pub response: T,
}

impl<T> Paginated<Vec<T>> {
    /// Returns an empty page with no linkage: `{ "meta": {}, "response": [] }`.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            meta: PageMeta::default(),
            response: Vec::new(),
        }
    }
}

/// Parses a `Link` header into page numbers.
///
/// Links without a `page` query parameter and unknown relations are ignored.
///
/// # Examples
///
/// ```
/// use hubnote_github::pagination::parse_link_header;
///
/// let meta = parse_link_header(
///     r#"<https://api.github.com/user/issues?page=3>; rel="next", <https://api.github.com/user/issues?page=9>; rel="last""#,
/// );
/// assert_eq!(meta.next, Some(3));
/// assert_eq!(meta.last, Some(9));
/// assert_eq!(meta.prev, None);
/// ```
#[must_use]
pub fn parse_link_header(header: &str) -> PageMeta {
    let mut meta = PageMeta::default();
    for link in header.split(',') {
        let mut parts = link.split(';');
        let Some(target) = parts.next() else {
            continue;
        };
        let Some(page) = page_of(target) else {
            continue;
        };
        for param in parts {
            let Some(rel) = param.trim().strip_prefix("rel=") else {
                continue;
            };
            for rel in rel.trim_matches('"').split_whitespace() {
                match rel {
                    "first" => meta.first = Some(page),
                    "prev" => meta.prev = Some(page),
                    "next" => meta.next = Some(page),
                    "last" => meta.last = Some(page),
                    _ => {}
                }
            }
        }
    }
    meta
}

fn page_of(target: &str) -> Option<u32> {
    let url = target
        .trim()
        .strip_prefix('<')?
        .strip_suffix('>')
        .and_then(|url| Url::parse(url).ok())?;
    url.query_pairs()
        .find(|(name, _)| name == "page")
        .and_then(|(_, value)| value.parse().ok())
}
