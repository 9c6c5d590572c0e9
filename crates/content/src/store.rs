//! Secret store trait and implementations.
//!
//! The [`SecretStore`] trait is the only contact point with whatever actually
//! holds secrets. Two implementations ship with the crate:
//!
//! - [`MemorySecretStore`]: in-memory, counts lookups, can inject failures
//! - [`DirSecretStore`]: reads a mounted-secret layout from disk
//!
//! ```
//! use content::{MemorySecretStore, SecretStore};
//!
//! let store = MemorySecretStore::new();
//! store.insert("ns1", "s", [("values.yaml", "b: 2")]);
//!
//! let data = store.get("ns1", "s").unwrap();
//! assert_eq!(data["values.yaml"], "b: 2");
//! ```

use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Key/value data of a single secret.
pub type SecretData = BTreeMap<String, String>;

/// Backend holding secrets.
///
/// Implementations must return [`Error::SecretNotFound`] when the secret does
/// not exist, so callers can distinguish it from other failures.
pub trait SecretStore: Send + Sync {
    /// Fetch all key/value pairs of a secret.
    fn get(&self, namespace: &str, name: &str) -> Result<SecretData>;
}

/// Failure to inject into a [`MemorySecretStore`] lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedFailure {
    /// Fail with [`Error::PermissionDenied`].
    PermissionDenied,
    /// Fail with [`Error::Unavailable`].
    Unavailable,
}

/// In-memory secret store.
///
/// Clones share the same underlying data, so a test can keep a handle while
/// the resolver owns another.
#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    secrets: Arc<Mutex<HashMap<(String, String), SecretData>>>,
    failures: Arc<Mutex<HashMap<(String, String), InjectedFailure>>>,
    lookups: Arc<AtomicUsize>,
}

impl MemorySecretStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a secret.
    pub fn insert<K, V>(
        &self,
        namespace: &str,
        name: &str,
        data: impl IntoIterator<Item = (K, V)>,
    ) where
        K: Into<String>,
        V: Into<String>,
    {
        let data = data
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((namespace.to_string(), name.to_string()), data);
    }

    /// Remove a secret.
    pub fn remove(&self, namespace: &str, name: &str) {
        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(namespace.to_string(), name.to_string()));
    }

    /// Make every lookup of this secret fail until cleared.
    pub fn fail_with(&self, namespace: &str, name: &str, failure: InjectedFailure) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((namespace.to_string(), name.to_string()), failure);
    }

    /// Clear an injected failure.
    pub fn clear_failure(&self, namespace: &str, name: &str) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(namespace.to_string(), name.to_string()));
    }

    /// Number of lookups served so far.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, namespace: &str, name: &str) -> Result<SecretData> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let key = (namespace.to_string(), name.to_string());

        let failure = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        match failure {
            Some(InjectedFailure::PermissionDenied) => {
                return Err(Error::PermissionDenied {
                    namespace: key.0,
                    name: key.1,
                    message: "injected".to_string(),
                });
            }
            Some(InjectedFailure::Unavailable) => {
                return Err(Error::Unavailable {
                    namespace: key.0,
                    name: key.1,
                    message: "injected".to_string(),
                });
            }
            None => {}
        }

        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
            .ok_or(Error::SecretNotFound {
                namespace: key.0,
                name: key.1,
            })
    }
}

/// File-backed secret store.
///
/// Layout: `<root>/<namespace>/<name>/<key>`, one file per key, which is how
/// secret volumes are mounted. Hidden entries (such as `..data` links) are
/// skipped.
#[derive(Debug, Clone)]
pub struct DirSecretStore {
    root: PathBuf,
}

impl DirSecretStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn secret_dir(&self, namespace: &str, name: &str) -> PathBuf {
        self.root.join(namespace).join(name)
    }
}

impl SecretStore for DirSecretStore {
    fn get(&self, namespace: &str, name: &str) -> Result<SecretData> {
        let dir = self.secret_dir(namespace, name);
        let not_found = || Error::SecretNotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        };

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(Error::PermissionDenied {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    message: e.to_string(),
                });
            }
            Err(e) => return Err(Error::io(&dir, e)),
        };

        let mut data = SecretData::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&dir, e))?;
            let key = entry.file_name().to_string_lossy().to_string();
            if key.starts_with('.') {
                continue;
            }

            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let bytes = fs::read(&path).map_err(|e| Error::io(&path, e))?;
            let value = String::from_utf8(bytes).map_err(|_| Error::InvalidEncoding {
                namespace: namespace.to_string(),
                name: name.to_string(),
                key: key.clone(),
            })?;
            data.insert(key, value);
        }

        log::debug!(
            "read {} key(s) from secret directory {}",
            data.len(),
            dir.display()
        );
        Ok(data)
    }
}
