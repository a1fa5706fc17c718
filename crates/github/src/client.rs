//! Account-aware GitHub client.
//!
//! [`GitHubClient`] is the programmatic surface of hubnote. Each call picks
//! the credential for the organization involved, shapes the caller's
//! [`QueryParams`] for the endpoint, and delegates to [`GitHubApi`].

use hubnote_config::Config;
use hubnote_protocol::{CheckRunList, Issue, IssueSearchResponse, PullRequest, QueryParams};
use secrecy::SecretString;
use tracing::{debug, instrument};

use crate::api::GitHubApi;
use crate::error::Result;
use crate::pagination::Paginated;
use crate::params::{
    issue_list_params, issue_search_params, organization_issue_list_params, pull_list_params,
};
use crate::transport::{OctocrabTransport, Transport};

/// GitHub client that resolves credentials from configured accounts.
///
/// Requests for an organization use the token of the first account serving
/// it, falling back to the default account. Without either, requests are
/// anonymous, with GitHub's lower rate limits and public data only.
///
/// # Examples
///
/// ```no_run
/// use hubnote_config::{Config, GithubAccount};
/// use hubnote_github::GitHubClient;
/// use hubnote_protocol::{QueryParams, QueryType};
///
/// # async fn example() -> hubnote_github::Result<()> {
/// let mut config = Config::new();
/// config.add_account(GithubAccount::new("work", ["acme"], "ghp_xxx"));
///
/// let client = GitHubClient::from_config(config)?;
/// let params = QueryParams {
///     state: Some("open".to_string()),
///     ..QueryParams::new(QueryType::Issue)
/// };
/// let page = client.get_issues_for_repo(&params, "acme", "widgets", false).await?;
/// println!("{} issues, next page: {:?}", page.response.len(), page.meta.next);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GitHubClient<T = OctocrabTransport> {
    config: Config,
    api: GitHubApi<T>,
}

impl GitHubClient<OctocrabTransport> {
    /// Creates a client from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid or the underlying
    /// [`GitHubApi`] cannot be built.
    #[instrument(skip(config), fields(accounts = config.accounts.len()))]
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let api = GitHubApi::from_config(&config)?;
        Ok(Self::new(config, api))
    }
}

impl<T: Transport> GitHubClient<T> {
    /// Creates a client over an existing [`GitHubApi`].
    #[must_use]
    pub fn new(config: Config, api: GitHubApi<T>) -> Self {
        Self { config, api }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the underlying request layer.
    #[must_use]
    pub fn api(&self) -> &GitHubApi<T> {
        &self.api
    }

    fn token(&self, org: Option<&str>, raw_query: Option<&str>) -> Option<SecretString> {
        self.config.token_resolver().resolve_token(org, raw_query)
    }

    fn page_size(&self) -> u8 {
        self.config.default_page_size
    }

    /// Fetches a single issue.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or GitHub answers with an error
    /// status.
    #[instrument(skip(self))]
    pub async fn get_issue(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        skip_cache: bool,
    ) -> Result<Issue> {
        let token = self.token(Some(org), None);
        self.api
            .get_issue(org, repo, number, token.as_ref(), skip_cache)
            .await
    }

    /// Lists issues assigned to the account serving `org`.
    ///
    /// Returns an empty page without a request when no account with a token
    /// matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or GitHub answers with an error
    /// status.
    #[instrument(skip(self, params))]
    pub async fn get_my_issues(
        &self,
        params: &QueryParams,
        org: Option<&str>,
        skip_cache: bool,
    ) -> Result<Paginated<Vec<Issue>>> {
        let token = self
            .config
            .account_resolver()
            .resolve(org)
            .filter(|account| account.has_token())
            .map(|account| SecretString::from(account.token.clone()));
        if token.is_none() {
            debug!("no account with a token, skipping request");
            return Ok(Paginated::empty());
        }

        let list_params = issue_list_params(params, self.page_size())?;
        self.api
            .list_issues_for_token(&list_params, token.as_ref(), skip_cache)
            .await
    }

    /// Lists issues of a repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or GitHub answers with an error
    /// status.
    #[instrument(skip(self, params))]
    pub async fn get_issues_for_repo(
        &self,
        params: &QueryParams,
        org: &str,
        repo: &str,
        skip_cache: bool,
    ) -> Result<Paginated<Vec<Issue>>> {
        let list_params = issue_list_params(params, self.page_size())?;
        let token = self.token(Some(org), None);
        self.api
            .list_issues_for_repo(org, repo, &list_params, token.as_ref(), skip_cache)
            .await
    }

    /// Lists issues of an organization, honoring the `filter` parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or GitHub answers with an error
    /// status.
    #[instrument(skip(self, params))]
    pub async fn get_issues_for_organization(
        &self,
        params: &QueryParams,
        org: &str,
        skip_cache: bool,
    ) -> Result<Paginated<Vec<Issue>>> {
        let list_params = organization_issue_list_params(params, self.page_size())?;
        let token = self.token(Some(org), None);
        self.api
            .list_issues_for_organization(org, &list_params, token.as_ref(), skip_cache)
            .await
    }

    /// Fetches a single pull request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or GitHub answers with an error
    /// status.
    #[instrument(skip(self))]
    pub async fn get_pull_request(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        skip_cache: bool,
    ) -> Result<PullRequest> {
        let token = self.token(Some(org), None);
        self.api
            .get_pull_request(org, repo, number, token.as_ref(), skip_cache)
            .await
    }

    /// Lists pull requests of a repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or GitHub answers with an error
    /// status.
    #[instrument(skip(self, params))]
    pub async fn get_pull_requests_for_repo(
        &self,
        params: &QueryParams,
        org: &str,
        repo: &str,
        skip_cache: bool,
    ) -> Result<Paginated<Vec<PullRequest>>> {
        let list_params = pull_list_params(params, self.page_size())?;
        let token = self.token(Some(org), None);
        self.api
            .list_pull_requests_for_repo(org, repo, &list_params, token.as_ref(), skip_cache)
            .await
    }

    /// Lists check runs for a commit SHA, branch or tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or GitHub answers with an error
    /// status.
    #[instrument(skip(self))]
    pub async fn list_check_runs_for_ref(
        &self,
        org: &str,
        repo: &str,
        git_ref: &str,
        skip_cache: bool,
    ) -> Result<CheckRunList> {
        let token = self.token(Some(org), None);
        self.api
            .list_check_runs_for_ref(org, repo, git_ref, token.as_ref(), skip_cache)
            .await
    }

    /// Searches issues or pull requests.
    ///
    /// The credential comes from `params.org`, or else from a `repo:org/`
    /// qualifier in the serialized query.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or GitHub answers with an error
    /// status.
    ///
    /// # Panics
    ///
    /// Panics if `params.query_type` has no search qualifier.
    #[instrument(skip(self, params))]
    pub async fn search_issues(
        &self,
        params: &QueryParams,
        skip_cache: bool,
    ) -> Result<Paginated<IssueSearchResponse>> {
        let search_params = issue_search_params(params, self.page_size())?;
        let token = self.token(params.org.as_deref(), Some(&search_params.q));
        self.api
            .search_issues(&search_params, token.as_ref(), skip_cache)
            .await
    }

    /// Returns the URL of the pull request linked to an issue, if any.
    ///
    /// `timeline_url` is the issue's [`timeline_url`](Issue::timeline_url).
    ///
    /// # Errors
    ///
    /// Returns an error if the timeline fetch fails with a status other than
    /// `404`.
    #[instrument(skip(self))]
    pub async fn get_pr_for_issue(
        &self,
        timeline_url: &str,
        org: Option<&str>,
        skip_cache: bool,
    ) -> Result<Option<String>> {
        let token = self.token(org, None);
        self.api
            .find_linked_pull_request_url(timeline_url, token.as_ref(), skip_cache)
            .await
    }
}
