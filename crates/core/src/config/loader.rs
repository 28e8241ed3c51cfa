//! Configuration file discovery and loading

use super::Bp2BuildConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File names looked up at the source root, in order
pub const CONFIG_FILE_NAMES: [&str; 2] = ["bp2bazel.json", ".bp2bazel.json"];

/// Loads [`Bp2BuildConfig`] from an explicit path or the source root
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration, preferring `explicit` over files found in `root`.
    ///
    /// No file at all yields the default configuration (every directory
    /// disabled), which only converts allowlisted modules.
    pub fn load(explicit: Option<&Path>, root: Option<&Path>) -> Result<Bp2BuildConfig> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        match root.and_then(Self::find_in) {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(Bp2BuildConfig::default())
            }
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Bp2BuildConfig> {
        tracing::debug!("Loading config from {:?}", path);
        let content = fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("cannot read {}: {e}", path.display())))?;
        Bp2BuildConfig::from_json(&content)
            .map_err(|e| Error::ConfigError(format!("{}: {e}", path.display())))
    }

    fn find_in(root: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_finds_hidden_config_in_root() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(".bp2bazel.json"),
            r#"{"directories": {"foo": "enabled"}}"#,
        )
        .unwrap();

        let config = ConfigLoader::load(None, Some(temp.path())).unwrap();
        assert!(config.directory_enabled("foo"));
    }

    #[test]
    fn test_explicit_path_wins() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("bp2bazel.json"), r#"{"directories": {"a": "enabled"}}"#).unwrap();
        let explicit = temp.path().join("other.json");
        fs::write(&explicit, r#"{"directories": {"b": "enabled"}}"#).unwrap();

        let config = ConfigLoader::load(Some(explicit.as_path()), Some(temp.path())).unwrap();
        assert!(config.directory_enabled("b"));
        assert!(!config.directory_enabled("a"));
    }

    #[test]
    fn test_missing_config_is_default() {
        let temp = TempDir::new().unwrap();
        let config = ConfigLoader::load(None, Some(temp.path())).unwrap();
        assert!(config.directories.is_empty());
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bp2bazel.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(ConfigLoader::load_from_file(&path), Err(Error::ConfigError(_))));
    }
}
