//! Reconciler settings
//!
//! Loaded from `settings.toml` in the config directory. Every field has a
//! default, so a missing file or an empty one is valid. The default
//! `cache_dir` is `playbooks` under [`paths::cache_dir`].
//!
//! ```toml
//! default_timeout = "30m"
//! values_key = "values.yaml"
//! cache_dir = "~/.cache/hostops/playbooks"
//! jobs = 4
//! preparation_failure = "requeue"
//! ```

use crate::duration::Timeout;
use crate::error::{Error, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "settings.toml";

/// Subdirectory of the hostops cache directory holding playbook archives
pub const PLAYBOOK_CACHE_DIR: &str = "playbooks";

/// What happens to a record whose attempt fails before the automation starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreparationFailurePolicy {
    /// Return to `Initializing` and hand the error back for backoff
    #[default]
    Requeue,
    /// Record `Failed` with the failure reason
    MarkFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Deadline for records that do not declare one
    pub default_timeout: Timeout,

    /// Key read from referenced secrets
    pub values_key: String,

    /// Playbook archive cache; `~` and `$VARS` are expanded
    pub cache_dir: String,

    /// Records reconciled in parallel
    pub jobs: usize,

    pub preparation_failure: PreparationFailurePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_timeout: Timeout::from_mins(30),
            values_key: content::DEFAULT_VALUES_KEY.to_string(),
            cache_dir: default_cache_dir(),
            jobs: 4,
            preparation_failure: PreparationFailurePolicy::default(),
        }
    }
}

fn default_cache_dir() -> String {
    match paths::cache_dir() {
        Ok(dir) => dir.join(PLAYBOOK_CACHE_DIR).to_string_lossy().into_owned(),
        Err(e) => {
            log::debug!("{e}, falling back to ~/.cache/hostops/{PLAYBOOK_CACHE_DIR}");
            format!("~/.cache/hostops/{PLAYBOOK_CACHE_DIR}")
        }
    }
}

impl Settings {
    /// Default settings file path
    pub fn default_path() -> Result<PathBuf> {
        Ok(paths::config_dir()?.join(SETTINGS_FILE))
    }

    /// Load settings from the default location, or defaults if absent
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("Settings file does not exist, using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::Settings {
            path: path.to_path_buf(),
            message: format!("failed to read: {e}"),
        })?;
        let settings = Self::parse(&content).map_err(|message| Error::Settings {
            path: path.to_path_buf(),
            message,
        })?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        let settings: Self = toml::from_str(content).map_err(|e| e.to_string())?;
        if settings.jobs == 0 {
            return Err("jobs must be at least 1".to_string());
        }
        if settings.default_timeout.is_zero() {
            return Err("default_timeout must be positive".to_string());
        }
        if settings.values_key.trim().is_empty() {
            return Err("values_key must not be empty".to_string());
        }
        Ok(settings)
    }

    /// Cache directory with `~` and variables expanded
    pub fn cache_path(&self) -> PathBuf {
        paths::expand(&self.cache_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.default_timeout, Timeout::from_mins(30));
        assert_eq!(settings.values_key, "values.yaml");
        assert_eq!(settings.jobs, 4);
        assert_eq!(
            settings.preparation_failure,
            PreparationFailurePolicy::Requeue
        );

        assert_eq!(
            settings.cache_path(),
            paths::cache_dir().unwrap().join("playbooks")
        );
    }

    #[test]
    fn test_load_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        fs::write(
            &path,
            "default_timeout = \"1h30m\"\npreparation_failure = \"mark-failed\"\n",
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.default_timeout, Timeout::from_mins(90));
        assert_eq!(
            settings.preparation_failure,
            PreparationFailurePolicy::MarkFailed
        );
        assert_eq!(settings.jobs, 4);
    }

    #[test]
    fn test_load_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        fs::write(&path, "").unwrap();
        assert_eq!(Settings::load(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");

        for body in [
            "jobs = 0",
            "default_timeout = \"0s\"",
            "default_timeout = \"soon\"",
            "values_key = \"  \"",
            "preparation_failure = \"retry\"",
        ] {
            fs::write(&path, body).unwrap();
            let err = Settings::load(&path).unwrap_err();
            assert!(matches!(err, Error::Settings { .. }), "{body}: {err}");
        }
    }

    #[test]
    fn test_load_missing_file_errors() {
        let temp = TempDir::new().unwrap();
        let err = Settings::load(&temp.path().join("absent.toml")).unwrap_err();
        assert_eq!(err.reason(), "InvalidSettings");
    }
}
