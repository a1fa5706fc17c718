//! Response cache configuration.
//!
//! Cached GitHub responses are served without a network call while they are
//! younger than the configured time-to-live. Older entries are revalidated
//! with a conditional request when GitHub supplied an `ETag`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default cache time-to-live (5 minutes).
pub const DEFAULT_CACHE_TTL_SECS: u32 = 300;

/// Configuration for the response cache.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use hubnote_config::CacheConfig;
///
/// let config = CacheConfig::default();
/// assert_eq!(config.ttl(), Duration::from_secs(300));
/// assert!(!config.persistent);
///
/// let config = CacheConfig::with_ttl(60);
/// assert_eq!(config.ttl(), Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a cached response is served without revalidation, in seconds.
    ///
    /// Zero revalidates on every call.
    #[serde(default = "default_ttl")]
    pub ttl_secs: u32,

    /// Whether responses are cached on disk and reused across runs.
    ///
    /// When false, responses are cached in memory for the lifetime of the
    /// process.
    #[serde(default)]
    pub persistent: bool,

    /// Directory for the on-disk cache, overriding the data directory default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

fn default_ttl() -> u32 {
    DEFAULT_CACHE_TTL_SECS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            persistent: false,
            directory: None,
        }
    }
}

impl CacheConfig {
    /// Creates an in-memory cache configuration with the given TTL.
    #[must_use]
    pub fn with_ttl(ttl_secs: u32) -> Self {
        Self {
            ttl_secs,
            persistent: false,
            directory: None,
        }
    }

    /// Returns the time-to-live as a [`Duration`].
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.ttl_secs))
    }
}
