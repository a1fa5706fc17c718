//! Response cache for GitHub requests.
//!
//! Responses are keyed by a [`RequestSignature`] and stored as
//! [`CachedResponse`] records in a [`CacheStore`]. Two stores are provided:
//! [`MemoryCache`] for the lifetime of a process, and [`DiskCache`] which
//! keeps one JSON file per signature in the XDG data directory.
//!
//! Records outlive their TTL so they can be revalidated with their `ETag`.
//! [`CacheStore::prune`] drops records older than [`retention`].
//!
//! # Directory Structure
//!
//! ```text
//! ~/.local/share/hubnote/       # Linux
//! ~/Library/Application Support/hubnote/  # macOS
//! └── cache/
//!     └── github/
//!         └── {signature-uuid}.json
//! ```
//!
//! # Examples
//!
//! ```
//! use hubnote_github::cache::{CacheStore, CachedResponse, MemoryCache, RequestSignature};
//! use url::Url;
//!
//! # fn example() -> hubnote_github::Result<()> {
//! let cache = MemoryCache::new();
//! let url = Url::parse("https://api.github.com/repos/o/r/issues?state=open&page=2")?;
//! let signature = RequestSignature::new(&url, None);
//!
//! cache.put(&signature, &CachedResponse::new("[]".to_string(), None, None))?;
//! assert!(cache.get(&signature)?.is_some());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::pagination::{PageMeta, parse_link_header};

/// Shortest time a response is kept for revalidation.
const MIN_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Namespace for deriving credential principals and cache file names.
const SIGNATURE_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a57_9d3e_4b8a_a1f0_53c2_e7d4_9b16);

/// Identity of a request for caching and deduplication.
///
/// Two requests share a signature when they target the same URL (query
/// parameters compared order-insensitively, fragment ignored) on behalf of the
/// same credential. The credential is represented by a UUID derived from the
/// token, so the token itself never appears in a key or on disk.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RequestSignature {
    url: String,
    principal: Option<Uuid>,
}

impl RequestSignature {
    /// Computes the signature of a request to `url` made with `token`.
    #[must_use]
    pub fn new(url: &Url, token: Option<&SecretString>) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);

        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        if pairs.is_empty() {
            url.set_query(None);
        } else {
            pairs.sort();
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }

        let principal = token
            .map(|token| Uuid::new_v5(&SIGNATURE_NAMESPACE, token.expose_secret().as_bytes()));

        Self {
            url: url.into(),
            principal,
        }
    }

    /// Returns the normalized request URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns a stable textual key.
    #[must_use]
    pub fn key(&self) -> String {
        match self.principal {
            Some(principal) => format!("{principal} {}", self.url),
            None => format!("anonymous {}", self.url),
        }
    }

    fn file_name(&self) -> String {
        let id = Uuid::new_v5(&SIGNATURE_NAMESPACE, self.key().as_bytes());
        format!("{id}.json")
    }
}

impl fmt::Debug for RequestSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSignature")
            .field("url", &self.url)
            .field("authenticated", &self.principal.is_some())
            .finish()
    }
}

/// A successful response body with the metadata needed to reuse it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// Raw response body.
    pub body: String,
    /// `Link` header, for paginated responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// `ETag` header, for conditional revalidation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// When the response was last confirmed fresh.
    pub cached_at: DateTime<Utc>,
}

impl CachedResponse {
    /// Creates a response record stamped with the current time.
    #[must_use]
    pub fn new(body: String, link: Option<String>, etag: Option<String>) -> Self {
        Self {
            body,
            link,
            etag,
            cached_at: Utc::now(),
        }
    }

    /// Returns the age of the record.
    #[must_use]
    pub fn age(&self) -> Duration {
        let diff = Utc::now().signed_duration_since(self.cached_at);
        // A timestamp in the future (clock skew) counts as fresh.
        diff.to_std().unwrap_or(Duration::ZERO)
    }

    /// Returns whether the record has reached `ttl`.
    ///
    /// A zero TTL expires every record immediately.
    #[must_use]
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }

    /// Resets the timestamp after GitHub confirmed the body unchanged.
    pub fn touch(&mut self) {
        self.cached_at = Utc::now();
    }

    /// Decodes the body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the body is not a valid `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Returns the pagination linkage of the response.
    #[must_use]
    pub fn page_meta(&self) -> PageMeta {
        self.link
            .as_deref()
            .map(parse_link_header)
            .unwrap_or_default()
    }
}

/// How long a stored response is kept for `ETag` revalidation before it is
/// pruned: ten TTLs, and never less than a day.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use hubnote_github::cache::retention;
///
/// assert_eq!(retention(Duration::ZERO), Duration::from_secs(86_400));
/// assert_eq!(retention(Duration::from_secs(3_600)), Duration::from_secs(86_400));
/// assert_eq!(retention(Duration::from_secs(86_400)), Duration::from_secs(864_000));
/// ```
#[must_use]
pub fn retention(ttl: Duration) -> Duration {
    ttl.saturating_mul(10).max(MIN_RETENTION)
}

/// Storage for cached responses.
pub trait CacheStore: Send + Sync + fmt::Debug {
    /// Returns the stored response for `signature`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store exists but cannot be read.
    fn get(&self, signature: &RequestSignature) -> Result<Option<CachedResponse>>;

    /// Stores `response` for `signature`, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn put(&self, signature: &RequestSignature, response: &CachedResponse) -> Result<()>;

    /// Removes records at least `max_age` old and returns how many were
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be listed or a record cannot be
    /// removed.
    fn prune(&self, max_age: Duration) -> Result<usize>;
}

/// Process-lifetime cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<RequestSignature, CachedResponse>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, signature: &RequestSignature) -> Result<Option<CachedResponse>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(signature).cloned())
    }

    fn put(&self, signature: &RequestSignature, response: &CachedResponse) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(signature.clone(), response.clone());
        Ok(())
    }

    fn prune(&self, max_age: Duration) -> Result<usize> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, response| response.age() < max_age);
        Ok(before - entries.len())
    }
}

/// On-disk record; the key guards against reading another signature's file.
#[derive(Serialize, Deserialize)]
struct DiskEntry {
    key: String,
    #[serde(flatten)]
    response: CachedResponse,
}

/// Persistent cache with one JSON file per request signature.
#[derive(Debug)]
pub struct DiskCache {
    base_path: PathBuf,
}

impl DiskCache {
    /// Creates a cache in the XDG data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The data directory cannot be determined (e.g., `$HOME` not set)
    /// - The directory structure cannot be created
    #[instrument]
    pub fn new() -> Result<Self> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            Error::from(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine data directory",
            ))
        })?;

        Self::with_path(data_dir.join("hubnote").join("cache").join("github"))
    }

    /// Creates a cache at a custom path, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    #[instrument]
    pub fn with_path(base_path: PathBuf) -> Result<Self> {
        if !base_path.exists() {
            debug!(?base_path, "creating cache directory");
            fs::create_dir_all(&base_path)?;
        }
        Ok(Self { base_path })
    }

    fn cache_path(&self, signature: &RequestSignature) -> PathBuf {
        self.base_path.join(signature.file_name())
    }
}

impl CacheStore for DiskCache {
    #[instrument(skip(self))]
    fn get(&self, signature: &RequestSignature) -> Result<Option<CachedResponse>> {
        let path = self.cache_path(signature);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(?path, "cache file not found");
                return Ok(None);
            }
            Err(e) => {
                warn!(?path, error = %e, "failed to read cache file");
                return Err(e.into());
            }
        };

        let entry: DiskEntry = serde_json::from_str(&content)?;
        if entry.key != signature.key() {
            warn!(?path, "cache file belongs to a different request");
            return Ok(None);
        }
        Ok(Some(entry.response))
    }

    #[instrument(skip(self, response))]
    fn put(&self, signature: &RequestSignature, response: &CachedResponse) -> Result<()> {
        let path = self.cache_path(signature);
        let entry = DiskEntry {
            key: signature.key(),
            response: response.clone(),
        };
        fs::write(&path, serde_json::to_string_pretty(&entry)?)?;
        debug!(?path, "cache saved");
        Ok(())
    }

    /// Files that no longer decode as cache records are removed as well.
    #[instrument(skip(self))]
    fn prune(&self, max_age: Duration) -> Result<usize> {
        let mut removed = 0;
        for dir_entry in fs::read_dir(&self.base_path)? {
            let path = dir_entry?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(?path, error = %e, "failed to read cache file");
                    continue;
                }
            };
            let live = serde_json::from_str::<DiskEntry>(&content)
                .is_ok_and(|entry| entry.response.age() < max_age);
            if live {
                continue;
            }
            if let Err(e) = fs::remove_file(&path)
                && e.kind() != std::io::ErrorKind::NotFound
            {
                return Err(e.into());
            }
            removed += 1;
        }
        debug!(removed, "pruned cache directory");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn token(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn create_disk_cache() -> (DiskCache, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cache = DiskCache::with_path(temp_dir.path().join("github"))
            .expect("Failed to create cache");
        (cache, temp_dir)
    }

    #[test]
    fn signature_ignores_query_order_and_fragment() {
        let a = RequestSignature::new(&url("https://api.github.com/issues?b=2&a=1#top"), None);
        let b = RequestSignature::new(&url("https://api.github.com/issues?a=1&b=2"), None);
        assert_eq!(a, b);
        assert_eq!(a.url(), "https://api.github.com/issues?a=1&b=2");
    }

    #[test]
    fn signature_without_query() {
        let sig = RequestSignature::new(&url("https://api.github.com/repos/o/r/issues/1?"), None);
        assert_eq!(sig.url(), "https://api.github.com/repos/o/r/issues/1");
    }

    #[test]
    fn signature_depends_on_token() {
        let target = url("https://api.github.com/issues");
        let anonymous = RequestSignature::new(&target, None);
        let alice = RequestSignature::new(&target, Some(&token("ghp_alice")));
        let alice_again = RequestSignature::new(&target, Some(&token("ghp_alice")));
        let bob = RequestSignature::new(&target, Some(&token("ghp_bob")));

        assert_ne!(anonymous, alice);
        assert_ne!(alice, bob);
        assert_eq!(alice, alice_again);
    }

    #[test]
    fn signature_never_exposes_token() {
        let sig = RequestSignature::new(&url("https://api.github.com/issues"), Some(&token("ghp_secret")));
        assert!(!sig.key().contains("ghp_secret"));
        assert!(!format!("{sig:?}").contains("ghp_secret"));
    }

    #[test]
    fn cached_response_age_and_touch() {
        let mut response = CachedResponse::new("{}".to_string(), None, None);
        assert!(!response.is_expired(Duration::from_secs(60)));
        assert!(response.is_expired(Duration::ZERO));

        response.cached_at = Utc::now() - chrono::Duration::seconds(120);
        assert!(response.is_expired(Duration::from_secs(60)));

        response.touch();
        assert!(!response.is_expired(Duration::from_secs(60)));
    }

    #[test]
    fn cached_response_page_meta() {
        let response = CachedResponse::new(
            "[]".to_string(),
            Some(r#"<https://api.github.com/issues?page=2>; rel="next""#.to_string()),
            None,
        );
        assert_eq!(response.page_meta().next, Some(2));
        assert_eq!(
            CachedResponse::new("[]".to_string(), None, None).page_meta(),
            PageMeta::default()
        );
    }

    #[test]
    fn memory_cache_roundtrip() {
        let cache = MemoryCache::new();
        let sig = RequestSignature::new(&url("https://api.github.com/issues"), None);
        assert!(cache.get(&sig).unwrap().is_none());

        let response = CachedResponse::new("[1]".to_string(), None, Some("\"abc\"".to_string()));
        cache.put(&sig, &response).unwrap();
        assert_eq!(cache.get(&sig).unwrap(), Some(response));
    }

    #[test]
    fn disk_cache_roundtrip() {
        let (cache, _temp) = create_disk_cache();
        let sig = RequestSignature::new(
            &url("https://api.github.com/repos/o/r/issues?page=1"),
            Some(&token("ghp_x")),
        );
        assert!(cache.get(&sig).expect("load should not fail").is_none());

        let response = CachedResponse::new(
            r#"[{"id": 1}]"#.to_string(),
            Some(r#"<https://api.github.com/x?page=2>; rel="next""#.to_string()),
            Some("W/\"etag123\"".to_string()),
        );
        cache.put(&sig, &response).expect("save should succeed");

        let loaded = cache.get(&sig).expect("load").expect("cache exists");
        assert_eq!(loaded, response);
    }

    #[test]
    fn disk_cache_overwrites() {
        let (cache, _temp) = create_disk_cache();
        let sig = RequestSignature::new(&url("https://api.github.com/issues"), None);

        cache
            .put(&sig, &CachedResponse::new("old".to_string(), None, None))
            .unwrap();
        cache
            .put(&sig, &CachedResponse::new("new".to_string(), None, None))
            .unwrap();
        assert_eq!(cache.get(&sig).unwrap().unwrap().body, "new");
    }

    #[test]
    fn disk_cache_rejects_corrupt_file() {
        let (cache, _temp) = create_disk_cache();
        let sig = RequestSignature::new(&url("https://api.github.com/issues"), None);
        fs::write(cache.cache_path(&sig), "not json").unwrap();

        assert!(matches!(cache.get(&sig), Err(Error::Decode(_))));
    }

    fn aged(body: &str, age_secs: i64) -> CachedResponse {
        let mut response = CachedResponse::new(body.to_string(), None, None);
        response.cached_at = Utc::now() - chrono::Duration::seconds(age_secs);
        response
    }

    #[test]
    fn retention_is_ten_ttls_with_a_floor() {
        assert_eq!(retention(Duration::ZERO), MIN_RETENTION);
        assert_eq!(retention(Duration::from_secs(300)), MIN_RETENTION);
        assert_eq!(
            retention(Duration::from_secs(86_400)),
            Duration::from_secs(864_000)
        );
        assert_eq!(retention(Duration::MAX), Duration::MAX);
    }

    #[test]
    fn memory_cache_prune_removes_old_entries() {
        let cache = MemoryCache::new();
        let old = RequestSignature::new(&url("https://api.github.com/issues?page=1"), None);
        let fresh = RequestSignature::new(&url("https://api.github.com/issues?page=2"), None);
        cache.put(&old, &aged("old", 7_200)).unwrap();
        cache.put(&fresh, &aged("fresh", 0)).unwrap();

        assert_eq!(cache.prune(Duration::from_secs(3_600)).unwrap(), 1);
        assert!(cache.get(&old).unwrap().is_none());
        assert_eq!(cache.get(&fresh).unwrap().unwrap().body, "fresh");
    }

    #[test]
    fn disk_cache_prune_removes_old_and_corrupt_files() {
        let (cache, _temp) = create_disk_cache();
        let old = RequestSignature::new(&url("https://api.github.com/issues?page=1"), None);
        let fresh = RequestSignature::new(&url("https://api.github.com/issues?page=2"), None);
        let corrupt = RequestSignature::new(&url("https://api.github.com/issues?page=3"), None);
        cache.put(&old, &aged("old", 7_200)).unwrap();
        cache.put(&fresh, &aged("fresh", 0)).unwrap();
        fs::write(cache.cache_path(&corrupt), "not json").unwrap();
        fs::write(cache.base_path.join("notes.txt"), "left alone").unwrap();

        assert_eq!(cache.prune(Duration::from_secs(3_600)).unwrap(), 2);
        assert!(!cache.cache_path(&old).exists());
        assert!(!cache.cache_path(&corrupt).exists());
        assert_eq!(cache.get(&fresh).unwrap().unwrap().body, "fresh");
        assert!(cache.base_path.join("notes.txt").exists());

        assert_eq!(cache.prune(Duration::from_secs(3_600)).unwrap(), 0);
    }

    #[test]
    fn disk_cache_file_does_not_contain_token() {
        let (cache, _temp) = create_disk_cache();
        let sig = RequestSignature::new(&url("https://api.github.com/issues"), Some(&token("ghp_secret")));
        cache
            .put(&sig, &CachedResponse::new("[]".to_string(), None, None))
            .unwrap();

        let content = fs::read_to_string(cache.cache_path(&sig)).unwrap();
        assert!(!content.contains("ghp_secret"));
    }
}
