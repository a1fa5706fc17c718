//! GitHub accounts and account selection.
//!
//! Each [`GithubAccount`] holds a token and the organizations and users it
//! should be used for. The [`AccountResolver`] picks the account for a given
//! organization, falling back to the configured default account.
//!
//! # Examples
//!
//! ```
//! use hubnote_config::{AccountResolver, GithubAccount};
//!
//! let accounts = vec![
//!     GithubAccount::with_id("work", "Work", ["acme"], "ghp_work"),
//!     GithubAccount::with_id("personal", "Personal", ["octocat"], "ghp_personal"),
//! ];
//! let resolver = AccountResolver::new(&accounts, Some("personal"));
//!
//! assert_eq!(resolver.resolve(Some("acme")).unwrap().id, "work");
//! assert_eq!(resolver.resolve(Some("rust-lang")).unwrap().id, "personal");
//! assert_eq!(resolver.resolve(None).unwrap().id, "personal");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A GitHub account and the organizations it is used for.
///
/// The token is kept out of [`Debug`] output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubAccount {
    /// Unique identifier of the account.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Organizations and users this account is used for, matched exactly.
    #[serde(default)]
    pub orgs: Vec<String>,
    /// Personal access token or OAuth token.
    pub token: String,
}

impl GithubAccount {
    /// Creates an account with a freshly generated identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use hubnote_config::GithubAccount;
    ///
    /// let a = GithubAccount::new("Work", ["acme"], "ghp_xxx");
    /// let b = GithubAccount::new("Work", ["acme"], "ghp_xxx");
    /// assert_ne!(a.id, b.id);
    /// ```
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, orgs: I, token: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_id(uuid::Uuid::new_v4().to_string(), name, orgs, token)
    }

    /// Creates an account with an explicit identifier.
    #[must_use]
    pub fn with_id<I, S>(
        id: impl Into<String>,
        name: impl Into<String>,
        orgs: I,
        token: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            orgs: orgs.into_iter().map(Into::into).collect(),
            token: token.into(),
        }
    }

    /// Returns `true` if this account is used for the given organization or user.
    #[must_use]
    pub fn serves(&self, org: &str) -> bool {
        self.orgs.iter().any(|saved| saved == org)
    }

    /// Returns `true` if the account has a non-empty token.
    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }
}

impl fmt::Debug for GithubAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubAccount")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("orgs", &self.orgs)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Selects the account to use for an organization.
///
/// Borrowed view over the configured accounts; cheap to create per lookup.
#[derive(Debug, Clone, Copy)]
pub struct AccountResolver<'a> {
    accounts: &'a [GithubAccount],
    default_account: Option<&'a str>,
}

impl<'a> AccountResolver<'a> {
    /// Creates a resolver over the given accounts and default account id.
    #[must_use]
    pub fn new(accounts: &'a [GithubAccount], default_account: Option<&'a str>) -> Self {
        Self {
            accounts,
            default_account,
        }
    }

    /// Returns the account for `org`.
    ///
    /// The first account (in configuration order) whose orgs contain `org`
    /// wins. Without a match, or without an `org`, the default account is
    /// returned. `None` means no account applies; callers proceed anonymously.
    #[must_use]
    pub fn resolve(&self, org: Option<&str>) -> Option<&'a GithubAccount> {
        if let Some(account) = org.and_then(|org| self.accounts.iter().find(|a| a.serves(org))) {
            debug!(account = %account.id, "matched account by organization");
            return Some(account);
        }

        let default = self.default_account?;
        self.accounts.iter().find(|account| account.id == default)
    }
}
