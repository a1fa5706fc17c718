//! Core configuration struct and loading logic.
//!
//! This module provides the main [`Config`] struct which aggregates the
//! accounts, pagination default, API endpoint and cache settings.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::account::{AccountResolver, GithubAccount};
use crate::auth::TokenResolver;
use crate::cache::CacheConfig;
use crate::error::{ConfigError, Result};
use crate::persistence::{find_config_file, read_config_file, write_config_file};

/// Default number of results requested per page.
pub const DEFAULT_PAGE_SIZE: u8 = 30;

/// Largest page size GitHub accepts.
pub const MAX_PAGE_SIZE: u8 = 100;

/// Default GitHub REST API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// The main configuration struct for hubnote.
///
/// # Examples
///
/// ```
/// use hubnote_config::{Config, GithubAccount};
///
/// let config = Config::default();
/// assert!(config.accounts.is_empty());
/// assert_eq!(config.default_page_size, 30);
///
/// let config = Config {
///     accounts: vec![GithubAccount::with_id("work", "Work", ["acme"], "ghp_xxx")],
///     default_account: Some("work".to_string()),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Configured GitHub accounts, in lookup order.
    #[serde(default)]
    pub accounts: Vec<GithubAccount>,

    /// Identifier of the account used when no organization matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_account: Option<String>,

    /// Results per page when a query does not set `per_page`.
    #[serde(default = "default_page_size")]
    pub default_page_size: u8,

    /// Base URL of the GitHub REST API.
    ///
    /// Point this at `https://<host>/api/v3` for GitHub Enterprise Server.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Response cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_page_size() -> u8 {
    DEFAULT_PAGE_SIZE
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            default_account: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            api_base_url: default_api_base_url(),
            cache: CacheConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new empty configuration.
    ///
    /// This is equivalent to `Config::default()`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from the default file locations.
    ///
    /// Searches for configuration files in the following order:
    ///
    /// 1. Local: `./hubnote.json5` or `./hubnote.json`
    /// 2. User: `~/.config/hubnote/config.json5` or `~/.config/hubnote/config.json`
    ///
    /// If no configuration file is found, returns a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is found but cannot be
    /// read, parsed, or validated.
    pub fn load() -> Result<Self> {
        match find_config_file() {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }

    /// Loads configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use hubnote_config::Config;
    ///
    /// # fn example() -> hubnote_config::Result<()> {
    /// let config = Config::load_from("custom-config.json5")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let config: Config = read_config_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        write_config_file(path, self)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the default page size is not within `1..=100`,
    /// if two accounts share an id, or if the API base URL is not a valid
    /// absolute URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use hubnote_config::Config;
    ///
    /// let mut config = Config::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.default_page_size = 0;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.default_page_size) {
            return Err(ConfigError::InvalidPageSize {
                value: self.default_page_size,
            });
        }

        let mut seen = HashSet::new();
        for account in &self.accounts {
            if !seen.insert(account.id.as_str()) {
                return Err(ConfigError::DuplicateAccount(account.id.clone()));
            }
        }

        self.api_base_url()?;
        Ok(())
    }

    /// Returns the parsed API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiBaseUrl`] if the URL cannot be parsed
    /// or cannot serve as a base for endpoint paths.
    pub fn api_base_url(&self) -> Result<Url> {
        let invalid = |reason: String| ConfigError::InvalidApiBaseUrl {
            url: self.api_base_url.clone(),
            reason,
        };
        let url = Url::parse(&self.api_base_url).map_err(|e| invalid(e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(invalid("URL cannot be a base".to_string()));
        }
        Ok(url)
    }

    /// Returns a resolver selecting accounts by organization.
    #[must_use]
    pub fn account_resolver(&self) -> AccountResolver<'_> {
        AccountResolver::new(&self.accounts, self.default_account.as_deref())
    }

    /// Returns a resolver selecting tokens by organization or search query.
    #[must_use]
    pub fn token_resolver(&self) -> TokenResolver<'_> {
        TokenResolver::new(self.account_resolver())
    }

    /// Adds an account.
    ///
    /// The first account added becomes the default when none is set.
    pub fn add_account(&mut self, account: GithubAccount) {
        if self.default_account.is_none() {
            self.default_account = Some(account.id.clone());
        }
        self.accounts.push(account);
    }

    /// Removes an account by id.
    ///
    /// Clears the default account if it pointed at the removed account.
    /// Returns `true` if an account was removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use hubnote_config::{Config, GithubAccount};
    ///
    /// let mut config = Config::default();
    /// config.add_account(GithubAccount::with_id("a", "A", ["o"], "t"));
    /// assert_eq!(config.default_account.as_deref(), Some("a"));
    ///
    /// assert!(config.remove_account("a"));
    /// assert!(config.default_account.is_none());
    /// assert!(!config.remove_account("a"));
    /// ```
    #[must_use]
    pub fn remove_account(&mut self, id: &str) -> bool {
        let initial_len = self.accounts.len();
        self.accounts.retain(|account| account.id != id);
        if self.default_account.as_deref() == Some(id) {
            self.default_account = None;
        }
        self.accounts.len() < initial_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    fn account(id: &str, orgs: &[&str]) -> GithubAccount {
        GithubAccount::with_id(id, id.to_uppercase(), orgs.iter().copied(), format!("token-{id}"))
    }

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.accounts.is_empty());
        assert!(config.default_account.is_none());
        assert_eq!(config.default_page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn new_config() {
        assert_eq!(Config::new(), Config::default());
    }

    #[test]
    fn validate_page_size_bounds() {
        for value in [0, 101, 255] {
            let config = Config {
                default_page_size: value,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidPageSize { .. })
            ));
        }
        for value in [1, 100] {
            let config = Config {
                default_page_size: value,
                ..Default::default()
            };
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn validate_duplicate_accounts() {
        let config = Config {
            accounts: vec![account("a", &["x"]), account("a", &["y"])],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateAccount(id)) if id == "a"
        ));
    }

    #[test]
    fn validate_api_base_url() {
        let config = Config {
            api_base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidApiBaseUrl { .. })
        ));

        let config = Config {
            api_base_url: "mailto:someone@example.com".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            api_base_url: "https://github.example.com/api/v3".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn add_account_sets_first_default() {
        let mut config = Config::default();
        config.add_account(account("a", &["x"]));
        config.add_account(account("b", &["y"]));
        assert_eq!(config.default_account.as_deref(), Some("a"));
        assert_eq!(config.accounts.len(), 2);
    }

    #[test]
    fn remove_account_keeps_other_default() {
        let mut config = Config::default();
        config.add_account(account("a", &["x"]));
        config.add_account(account("b", &["y"]));
        assert!(config.remove_account("b"));
        assert_eq!(config.default_account.as_deref(), Some("a"));
    }

    #[test]
    fn token_resolver_uses_config_accounts() {
        let config = Config {
            accounts: vec![account("a", &["acme"]), account("b", &[])],
            default_account: Some("b".to_string()),
            ..Default::default()
        };
        let tokens = config.token_resolver();
        assert_eq!(
            tokens.resolve_token(Some("acme"), None).unwrap().expose_secret(),
            "token-a"
        );
        assert_eq!(
            tokens.resolve_token(Some("other"), None).unwrap().expose_secret(),
            "token-b"
        );
    }

    #[test]
    fn deserialize_with_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json5");
        std::fs::write(
            &path,
            r#"
            {
                accounts: [
                    { id: "work", name: "Work", orgs: ["acme", "acme-labs"], token: "ghp_work" },
                    { id: "me", name: "Me", token: "ghp_me" },
                ],
                default_account: "me",
                default_page_size: 50,
                cache: { ttl_secs: 60 },
            }
            "#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.accounts.len(), 2);
        assert_eq!(config.accounts[0].orgs, vec!["acme", "acme-labs"]);
        assert_eq!(config.default_account.as_deref(), Some("me"));
        assert_eq!(config.default_page_size, 50);
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn load_from_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"default_page_size": 0}"#).unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut original = Config::default();
        original.add_account(account("a", &["acme"]));
        original.default_page_size = 10;

        original.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();

        assert_eq!(original, loaded);
    }

    #[test]
    fn default_account_not_serialized_when_none() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(!json.contains("default_account"));
    }
}
