//! Content resolution

use crate::error::Result;
use crate::store::SecretStore;
use crate::types::ContentRef;
use std::sync::Arc;

/// Key inside a secret that holds the YAML content
pub const DEFAULT_VALUES_KEY: &str = "values.yaml";

/// Resolves [`ContentRef`] values to text
///
/// Every call performs at most one store lookup and nothing is cached, so a
/// rotated secret is observed on the next resolve. A missing secret is an
/// error ([`crate::Error::SecretNotFound`]), never silently empty content.
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn SecretStore>,
    values_key: String,
}

impl Resolver {
    /// Create a resolver reading the given key from secrets
    pub fn new(store: Arc<dyn SecretStore>, values_key: impl Into<String>) -> Self {
        Self {
            store,
            values_key: values_key.into(),
        }
    }

    /// Create a resolver reading [`DEFAULT_VALUES_KEY`]
    pub fn with_default_key(store: Arc<dyn SecretStore>) -> Self {
        Self::new(store, DEFAULT_VALUES_KEY)
    }

    /// Key read from each secret
    pub fn values_key(&self) -> &str {
        &self.values_key
    }

    /// Resolve a reference to its content
    pub fn resolve(&self, reference: &ContentRef, default_namespace: &str) -> Result<String> {
        if reference.is_empty() {
            return Ok(String::new());
        }

        match reference.secret_key(default_namespace) {
            Some(key) => {
                log::debug!("resolving content from secret {key}");
                let data = self.store.get(&key.namespace, &key.name)?;
                Ok(data.get(&self.values_key).cloned().unwrap_or_default())
            }
            None => Ok(reference.inline.clone()),
        }
    }

    /// Resolve an optional reference; absent resolves like empty
    pub fn resolve_opt(
        &self,
        reference: Option<&ContentRef>,
        default_namespace: &str,
    ) -> Result<String> {
        match reference {
            Some(r) => self.resolve(r, default_namespace),
            None => Ok(String::new()),
        }
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("values_key", &self.values_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::{InjectedFailure, MemorySecretStore};

    fn resolver_with(store: &MemorySecretStore) -> Resolver {
        Resolver::with_default_key(Arc::new(store.clone()))
    }

    #[test]
    fn test_empty_resolves_to_empty_without_lookup() {
        let store = MemorySecretStore::new();
        let resolver = resolver_with(&store);

        for ns in ["", "default", "ns1"] {
            assert_eq!(resolver.resolve(&ContentRef::default(), ns).unwrap(), "");
        }
        assert_eq!(resolver.resolve_opt(None, "ns1").unwrap(), "");
        assert_eq!(store.lookups(), 0);
    }

    #[test]
    fn test_inline_is_returned_verbatim() {
        let store = MemorySecretStore::new();
        let resolver = resolver_with(&store);

        let content = resolver
            .resolve(&ContentRef::inline("a: 1"), "ns1")
            .unwrap();
        assert_eq!(content, "a: 1");
        assert_eq!(store.lookups(), 0);
    }

    #[test]
    fn test_secret_in_default_namespace() {
        let store = MemorySecretStore::new();
        store.insert("ns1", "s", [("values.yaml", "b: 2")]);
        let resolver = resolver_with(&store);

        let content = resolver.resolve(&ContentRef::secret("s"), "ns1").unwrap();
        assert_eq!(content, "b: 2");
        assert_eq!(store.lookups(), 1);
    }

    #[test]
    fn test_secret_namespace_overrides_default() {
        let store = MemorySecretStore::new();
        store.insert("other", "s", [("values.yaml", "c: 3")]);
        let resolver = resolver_with(&store);

        let content = resolver
            .resolve(&ContentRef::secret_in("other", "s"), "ns1")
            .unwrap();
        assert_eq!(content, "c: 3");
    }

    #[test]
    fn test_secret_without_key_is_empty() {
        let store = MemorySecretStore::new();
        store.insert("ns1", "s", [("other.yaml", "x: 1")]);
        let resolver = resolver_with(&store);

        assert_eq!(resolver.resolve(&ContentRef::secret("s"), "ns1").unwrap(), "");
    }

    #[test]
    fn test_secret_wins_over_inline() {
        let store = MemorySecretStore::new();
        store.insert("ns1", "s", [("values.yaml", "from: secret")]);
        let resolver = resolver_with(&store);

        let mut reference = ContentRef::secret("s");
        reference.inline = "from: inline".to_string();
        assert_eq!(resolver.resolve(&reference, "ns1").unwrap(), "from: secret");
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let store = MemorySecretStore::new();
        let resolver = resolver_with(&store);

        let err = resolver
            .resolve(&ContentRef::secret("missing"), "ns1")
            .unwrap_err();
        assert!(matches!(err, Error::SecretNotFound { .. }));
        assert_eq!(store.lookups(), 1);
    }

    #[test]
    fn test_transient_failure_propagates() {
        let store = MemorySecretStore::new();
        store.insert("ns1", "s", [("values.yaml", "b: 2")]);
        store.fail_with("ns1", "s", InjectedFailure::Unavailable);
        let resolver = resolver_with(&store);

        let err = resolver.resolve(&ContentRef::secret("s"), "ns1").unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_rotation_is_observed() {
        let store = MemorySecretStore::new();
        store.insert("ns1", "s", [("values.yaml", "v: 1")]);
        let resolver = resolver_with(&store);
        let reference = ContentRef::secret("s");

        assert_eq!(resolver.resolve(&reference, "ns1").unwrap(), "v: 1");
        store.insert("ns1", "s", [("values.yaml", "v: 2")]);
        assert_eq!(resolver.resolve(&reference, "ns1").unwrap(), "v: 2");
        assert_eq!(store.lookups(), 2);
    }

    #[test]
    fn test_custom_values_key() {
        let store = MemorySecretStore::new();
        store.insert("ns1", "s", [("playbook.yaml", "- hosts: all")]);
        let resolver = Resolver::new(Arc::new(store), "playbook.yaml");

        assert_eq!(resolver.values_key(), "playbook.yaml");
        assert_eq!(
            resolver.resolve(&ContentRef::secret("s"), "ns1").unwrap(),
            "- hosts: all"
        );
    }
}
