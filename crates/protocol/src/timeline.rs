//! Issue timeline events.
//!
//! A timeline is a heterogeneous list of events keyed by their `event` field.
//! Only cross-references are modelled; every other event kind decodes to
//! [`TimelineEvent::Other`].

use serde::{Deserialize, Serialize};

use crate::models::PullRequestLinks;

/// A single entry of an issue timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum TimelineEvent {
    /// Another issue or pull request mentioned this one.
    CrossReferenced {
        #[serde(default)]
        source: CrossReferenceSource,
    },
    /// Any event kind hubnote does not inspect.
    #[serde(other)]
    Other,
}

impl TimelineEvent {
    /// Returns the pull request URL of a cross-reference made by a pull request.
    ///
    /// Returns `None` for other events, for cross-references coming from
    /// plain issues, and for an empty URL.
    #[must_use]
    pub fn cross_referenced_pull_request_url(&self) -> Option<&str> {
        match self {
            Self::CrossReferenced { source } => source
                .issue
                .as_ref()?
                .pull_request
                .as_ref()?
                .html_url
                .as_deref()
                .filter(|url| !url.is_empty()),
            Self::Other => None,
        }
    }
}

/// Where a cross-reference came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReferenceSource {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub issue: Option<CrossReferenceIssue>,
}

/// The issue (or pull request) that made a cross-reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReferenceIssue {
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub pull_request: Option<PullRequestLinks>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_mixed_timeline() {
        let events: Vec<TimelineEvent> = serde_json::from_value(serde_json::json!([
            { "event": "labeled", "label": { "name": "bug" }, "actor": { "login": "a" } },
            { "event": "commented", "body": "hi", "user": { "login": "b" } },
            {
                "event": "cross-referenced",
                "source": {
                    "type": "issue",
                    "issue": {
                        "number": 43,
                        "html_url": "https://github.com/o/r/pull/43",
                        "pull_request": { "html_url": "https://github.com/o/r/pull/43" }
                    }
                }
            }
        ]))
        .unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0], TimelineEvent::Other);
        assert_eq!(events[1], TimelineEvent::Other);
        assert_eq!(
            events[2].cross_referenced_pull_request_url(),
            Some("https://github.com/o/r/pull/43")
        );
    }

    #[test]
    fn cross_reference_from_issue_has_no_pull_request_url() {
        let event: TimelineEvent = serde_json::from_value(serde_json::json!({
            "event": "cross-referenced",
            "source": { "type": "issue", "issue": { "number": 7 } }
        }))
        .unwrap();
        assert!(matches!(event, TimelineEvent::CrossReferenced { .. }));
        assert_eq!(event.cross_referenced_pull_request_url(), None);
    }

    #[test]
    fn empty_pull_request_url_is_none() {
        let event: TimelineEvent = serde_json::from_value(serde_json::json!({
            "event": "cross-referenced",
            "source": { "issue": { "number": 7, "pull_request": { "html_url": "" } } }
        }))
        .unwrap();
        assert_eq!(event.cross_referenced_pull_request_url(), None);
    }

    #[test]
    fn cross_reference_without_source_decodes() {
        let event: TimelineEvent =
            serde_json::from_value(serde_json::json!({ "event": "cross-referenced" })).unwrap();
        assert_eq!(event.cross_referenced_pull_request_url(), None);
    }
}
