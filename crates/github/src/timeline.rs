//! Linked pull request lookup through issue timelines.
//!
//! GitHub records a `cross-referenced` timeline event when a pull request
//! mentions an issue, which is how a closing pull request shows up on the
//! issue it fixes.

use hubnote_protocol::TimelineEvent;
use secrecy::SecretString;
use tracing::{debug, instrument};

use crate::api::GitHubApi;
use crate::error::Result;
use crate::transport::Transport;

/// Returns the URL of the first cross-referencing pull request in `events`.
///
/// # Examples
///
/// ```
/// use hubnote_github::timeline::first_cross_referenced_pull_request;
/// use hubnote_protocol::TimelineEvent;
///
/// let events: Vec<TimelineEvent> = serde_json::from_str(r#"[
///     { "event": "labeled" },
///     { "event": "cross-referenced", "source": { "issue": { "number": 3 } } },
///     { "event": "cross-referenced", "source": { "issue": {
///         "number": 4,
///         "pull_request": { "html_url": "https://github.com/o/r/pull/4" }
///     } } }
/// ]"#).unwrap();
///
/// assert_eq!(
///     first_cross_referenced_pull_request(&events),
///     Some("https://github.com/o/r/pull/4"),
/// );
/// ```
#[must_use]
pub fn first_cross_referenced_pull_request(events: &[TimelineEvent]) -> Option<&str> {
    events
        .iter()
        .find_map(TimelineEvent::cross_referenced_pull_request_url)
}

impl<T: Transport> GitHubApi<T> {
    /// Finds the pull request linked to an issue through its timeline.
    ///
    /// A timeline that does not exist (`404`) or is empty yields `None`.
    ///
    /// # Errors
    ///
    /// Returns any other failure of the timeline fetch unchanged.
    #[instrument(skip(self, token))]
    pub async fn find_linked_pull_request_url(
        &self,
        timeline_url: &str,
        token: Option<&SecretString>,
        skip_cache: bool,
    ) -> Result<Option<String>> {
        let events: Option<Vec<TimelineEvent>> =
            match self.queue_request(timeline_url, token, skip_cache).await {
                Ok(events) => events,
                Err(e) if e.is_not_found() => {
                    debug!("issue has no timeline");
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };

        let url = events
            .as_deref()
            .and_then(first_cross_referenced_pull_request)
            .map(ToOwned::to_owned);
        debug!(found = url.is_some(), "scanned timeline");
        Ok(url)
    }
}
