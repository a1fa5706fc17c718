//! GitHub token resolution.
//!
//! Tokens are picked per organization:
//!
//! 1. The organization passed by the caller
//! 2. Otherwise, the organization of the first `repo:<org>/` qualifier in a
//!    raw search query
//! 3. The account serving that organization, else the default account
//! 4. Unauthenticated (returns `None`)

use std::sync::LazyLock;

use regex::Regex;
use secrecy::SecretString;
use tracing::debug;

use crate::account::AccountResolver;

/// Matches the organization of a `repo:org/name` search qualifier.
static REPO_QUALIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"repo:([\w\-]+)/").expect("invalid repo qualifier regex"));

/// Extracts the organization from the first `repo:<org>/` qualifier of a query.
///
/// Only word characters and hyphens are recognized as part of the
/// organization name, and only the first qualifier is considered.
///
/// # Examples
///
/// ```
/// use hubnote_config::auth::org_from_query;
///
/// assert_eq!(org_from_query("repo:my-org/my-repo state:open"), Some("my-org"));
/// assert_eq!(org_from_query("repo:a/x repo:b/y"), Some("a"));
/// assert_eq!(org_from_query("state:open"), None);
/// ```
#[must_use]
pub fn org_from_query(query: &str) -> Option<&str> {
    REPO_QUALIFIER
        .captures(query)
        .and_then(|captures| captures.get(1))
        .map(|org| org.as_str())
}

/// Resolves the token to use for a request.
#[derive(Debug, Clone, Copy)]
pub struct TokenResolver<'a> {
    accounts: AccountResolver<'a>,
}

impl<'a> TokenResolver<'a> {
    /// Creates a token resolver backed by the given account resolver.
    #[must_use]
    pub fn new(accounts: AccountResolver<'a>) -> Self {
        Self { accounts }
    }

    /// Resolves the token for an organization or a raw search query.
    ///
    /// An explicit `org` always takes precedence over one parsed from
    /// `raw_query`. Accounts with an empty token count as no token.
    ///
    /// # Examples
    ///
    /// ```
    /// use hubnote_config::{AccountResolver, GithubAccount, TokenResolver};
    /// use secrecy::ExposeSecret;
    ///
    /// let accounts = vec![GithubAccount::with_id("a", "A", ["my-org"], "ghp_a")];
    /// let tokens = TokenResolver::new(AccountResolver::new(&accounts, None));
    ///
    /// let token = tokens.resolve_token(None, Some("repo:my-org/my-repo state:open"));
    /// assert_eq!(token.unwrap().expose_secret(), "ghp_a");
    /// assert!(tokens.resolve_token(None, Some("state:open")).is_none());
    /// ```
    #[must_use]
    pub fn resolve_token(&self, org: Option<&str>, raw_query: Option<&str>) -> Option<SecretString> {
        let org = org.or_else(|| raw_query.and_then(org_from_query));
        let account = self.accounts.resolve(org)?;
        if !account.has_token() {
            debug!(account = %account.id, "resolved account has no token");
            return None;
        }
        Some(SecretString::from(account.token.clone()))
    }
}
