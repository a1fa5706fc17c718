//! Configuration file reading and writing.
//!
//! # File Formats
//!
//! - JSON5 (`.json5`): Preferred format with comments and trailing commas
//! - JSON (`.json`): Standard JSON format, also used when saving
//!
//! # File Locations
//!
//! Configuration is searched in the following order:
//!
//! 1. Local: `./hubnote.json5` or `./hubnote.json`
//! 2. User: `~/.config/hubnote/config.json5` or `~/.config/hubnote/config.json`

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfigError, Result};

/// Local configuration file names, in priority order.
const LOCAL_CONFIG_FILE_NAMES: &[&str] = &["hubnote.json5", "hubnote.json"];

/// User config directory name.
const USER_CONFIG_DIR: &str = "hubnote";

/// User config file names, in priority order.
const USER_CONFIG_FILE_NAMES: &[&str] = &["config.json5", "config.json"];

/// Finds the configuration file in the current and user config directories.
///
/// # Examples
///
/// ```no_run
/// use hubnote_config::persistence::find_config_file;
///
/// if let Some(path) = find_config_file() {
///     println!("Found config at: {}", path.display());
/// }
/// ```
#[must_use]
pub fn find_config_file() -> Option<PathBuf> {
    let user_dir = user_config_dir().ok();
    find_config_file_in(Path::new("."), user_dir.as_deref())
}

/// Finds the configuration file, looking in `local_dir` first and then in
/// `user_dir`.
#[must_use]
pub fn find_config_file_in(local_dir: &Path, user_dir: Option<&Path>) -> Option<PathBuf> {
    let local = LOCAL_CONFIG_FILE_NAMES
        .iter()
        .map(|name| local_dir.join(name));
    let user = user_dir.into_iter().flat_map(|dir| {
        USER_CONFIG_FILE_NAMES
            .iter()
            .map(move |name| dir.join(name))
    });

    let found = local.chain(user).find(|path| path.exists());
    debug!(?found, "searched for config file");
    found
}

/// Returns the user configuration directory, typically `~/.config/hubnote/`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn user_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join(USER_CONFIG_DIR))
        .ok_or(ConfigError::NoHomeDirectory)
}

/// Returns the default user configuration file path,
/// typically `~/.config/hubnote/config.json5`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_user_config_path() -> Result<PathBuf> {
    Ok(user_config_dir()?.join(USER_CONFIG_FILE_NAMES[0]))
}

/// Reads and parses a JSON5 or JSON configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its content cannot be
/// parsed into `T`.
pub fn read_config_file<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    // JSON5 parser handles both JSON5 and JSON
    serde_json5::from_str(&content).map_err(ConfigError::from)
}

/// Writes a configuration to a file as pretty-printed JSON.
///
/// Parent directories are created as needed.
///
/// # Errors
///
/// Returns an error if the parent directory or the file cannot be written,
/// or if the configuration cannot be serialized.
pub fn write_config_file<T: serde::Serialize>(path: impl AsRef<Path>, config: &T) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty() && !p.exists()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = serde_json::to_string_pretty(config)?;

    std::fs::write(path, content).map_err(|e| ConfigError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use tempfile::TempDir;

    #[test]
    fn find_prefers_local_json5() {
        let local = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        std::fs::write(local.path().join("hubnote.json"), "{}").unwrap();
        std::fs::write(local.path().join("hubnote.json5"), "{}").unwrap();
        std::fs::write(user.path().join("config.json5"), "{}").unwrap();

        let found = find_config_file_in(local.path(), Some(user.path())).unwrap();
        assert_eq!(found, local.path().join("hubnote.json5"));
    }

    #[test]
    fn find_falls_back_to_user_dir() {
        let local = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        std::fs::write(user.path().join("config.json"), "{}").unwrap();

        let found = find_config_file_in(local.path(), Some(user.path())).unwrap();
        assert_eq!(found, user.path().join("config.json"));
    }

    #[test]
    fn find_returns_none_without_files() {
        let local = TempDir::new().unwrap();
        assert!(find_config_file_in(local.path(), None).is_none());
    }

    #[test]
    fn read_json5_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hubnote.json5");
        std::fs::write(
            &path,
            r#"
            {
                // comments are allowed
                default_page_size: 20,
            }
            "#,
        )
        .unwrap();

        let config: Config = read_config_file(&path).unwrap();
        assert_eq!(config.default_page_size, 20);
    }

    #[test]
    fn read_nonexistent_file() {
        let result: Result<Config> = read_config_file("/nonexistent/hubnote.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn read_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("invalid.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result: Result<Config> = read_config_file(&path);
        assert!(matches!(result, Err(ConfigError::ParseJson5(_))));
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("dirs").join("config.json");

        write_config_file(&path, &Config::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn user_config_dir_returns_path() {
        // This test may fail in environments without a home directory
        if dirs::config_dir().is_some() {
            let result = user_config_dir();
            assert!(result.unwrap().ends_with(USER_CONFIG_DIR));
        }
    }
}
