//! Configuration management for hubnote.
//!
//! This crate handles the accounts hubnote authenticates with, how a token is
//! chosen for a request, and loading and persisting the configuration.
//!
//! # Overview
//!
//! - [`config`]: Core configuration struct and loading logic
//! - [`account`]: GitHub accounts and per-organization account selection
//! - [`auth`]: Token resolution from an organization or a search query
//! - [`cache`]: Response cache settings
//! - [`persistence`]: Config file reading and writing
//! - [`error`]: Error types for configuration operations
//!
//! # Account Selection
//!
//! Each account lists the organizations and users it is used for. A request
//! scoped to an organization uses the first account listing it; otherwise the
//! default account is used. Without either, requests are unauthenticated.
//!
//! ```json5
//! {
//!   accounts: [
//!     { id: "work", name: "Work", orgs: ["acme"], token: "ghp_xxx" },
//!     { id: "me", name: "Personal", orgs: ["octocat"], token: "ghp_yyy" },
//!   ],
//!   default_account: "me",
//!   default_page_size: 30,
//! }
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use hubnote_config::Config;
//!
//! # fn example() -> hubnote_config::Result<()> {
//! let config = Config::load()?;
//!
//! let tokens = config.token_resolver();
//! let token = tokens.resolve_token(None, Some("repo:acme/widgets is:open"));
//! println!("authenticated: {}", token.is_some());
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod persistence;

// Re-export primary types at crate root for convenience
pub use account::{AccountResolver, GithubAccount};
pub use auth::TokenResolver;
pub use cache::CacheConfig;
pub use config::{Config, DEFAULT_API_BASE_URL, DEFAULT_PAGE_SIZE};
pub use error::{ConfigError, Result};
