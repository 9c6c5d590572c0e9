//! Path resolution for hostops
//!
//! # Environment Variables
//!
//! - `HOSTOPS_CONFIG_DIR` - Override config directory
//! - `HOSTOPS_CACHE_DIR` - Override cache directory
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `HOSTOPS_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/hostops` (if set)
//! 3. `~/.config/hostops`
//!
//! For cache_dir():
//! 1. `HOSTOPS_CACHE_DIR` environment variable
//! 2. `XDG_CACHE_HOME/hostops` (if set)
//! 3. `~/.cache/hostops`

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "HOSTOPS_CONFIG_DIR";

/// Environment variable for cache directory override
pub const ENV_CACHE_DIR: &str = "HOSTOPS_CACHE_DIR";

const APP_DIR: &str = "hostops";

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| Error::Settings {
        path: PathBuf::from("~"),
        message: "could not determine home directory".to_string(),
    })
}

/// Get the hostops config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!("Using config dir from {}: {}", ENV_CONFIG_DIR, path.display());
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join(APP_DIR);
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let path = home_dir()?.join(".config").join(APP_DIR);
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Get the hostops cache directory path
pub fn cache_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CACHE_DIR) {
        let path = expand(&dir);
        log::debug!("Using cache dir from {}: {}", ENV_CACHE_DIR, path.display());
        return Ok(path);
    }

    if let Ok(xdg_cache) = std::env::var("XDG_CACHE_HOME") {
        let path = PathBuf::from(xdg_cache).join(APP_DIR);
        log::debug!("Using XDG_CACHE_HOME: {}", path.display());
        return Ok(path);
    }

    let path = home_dir()?.join(".cache").join(APP_DIR);
    log::debug!("Using default cache dir: {}", path.display());
    Ok(path)
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables are left as written.
///
/// # Examples
///
/// ```
/// use hostops::paths;
///
/// let home_path = paths::expand("~/playbooks");
/// assert!(!home_path.starts_with("~"));
/// ```
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_with_tilde() {
        let result = expand("~/test/path");
        let home = dirs::home_dir().unwrap();
        assert_eq!(result, home.join("test").join("path"));
    }

    #[test]
    fn test_expand_absolute() {
        assert_eq!(expand("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/path/$HOSTOPS_NONEXISTENT_VAR_12345/file");
        assert_eq!(
            result,
            PathBuf::from("/path/$HOSTOPS_NONEXISTENT_VAR_12345/file")
        );
    }

    #[test]
    fn test_env_var_constants() {
        assert_eq!(ENV_CONFIG_DIR, "HOSTOPS_CONFIG_DIR");
        assert_eq!(ENV_CACHE_DIR, "HOSTOPS_CACHE_DIR");
    }
}
