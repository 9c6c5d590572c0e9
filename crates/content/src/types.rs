//! Content reference types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a secret object in the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretReference {
    /// Name of the secret
    #[serde(default)]
    pub name: String,
    /// Namespace of the secret, defaults to the owning record's namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Fully qualified secret location after namespace defaulting
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretKey {
    pub namespace: String,
    pub name: String,
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Either inline text or a reference to a secret holding the text
///
/// A value with no usable secret reference and no inline text is the
/// canonical empty value. When both are set the secret wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawContentRef")]
pub struct ContentRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretReference>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub inline: String,
}

impl ContentRef {
    /// Inline text
    pub fn inline(text: impl Into<String>) -> Self {
        Self {
            secret_ref: None,
            inline: text.into(),
        }
    }

    /// Secret in the owning record's namespace
    pub fn secret(name: impl Into<String>) -> Self {
        Self {
            secret_ref: Some(SecretReference {
                name: name.into(),
                namespace: None,
            }),
            inline: String::new(),
        }
    }

    /// Secret in an explicit namespace
    pub fn secret_in(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            secret_ref: Some(SecretReference {
                name: name.into(),
                namespace: Some(namespace.into()),
            }),
            inline: String::new(),
        }
    }

    /// Check if this reference carries no content at all
    pub fn is_empty(&self) -> bool {
        let no_secret = self.secret_ref.as_ref().is_none_or(|s| s.name.is_empty());
        no_secret && self.inline.is_empty()
    }

    /// Secret location, with the namespace defaulted, if a secret is referenced
    pub fn secret_key(&self, default_namespace: &str) -> Option<SecretKey> {
        let secret = self.secret_ref.as_ref().filter(|s| !s.name.is_empty())?;
        let namespace = match secret.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => ns.to_string(),
            _ => default_namespace.to_string(),
        };
        Some(SecretKey {
            namespace,
            name: secret.name.clone(),
        })
    }

    /// Canonical form: a nameless secret reference is dropped and an empty
    /// namespace becomes `None`. Both resolve exactly like the original.
    #[must_use]
    pub fn normalized(self) -> Self {
        let secret_ref = self
            .secret_ref
            .filter(|s| !s.name.is_empty())
            .map(|s| SecretReference {
                namespace: s.namespace.filter(|ns| !ns.is_empty()),
                name: s.name,
            });
        Self {
            secret_ref,
            inline: self.inline,
        }
    }

    /// Drop the value entirely when it is empty
    pub fn into_non_empty(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }
}

/// On-the-wire shape accepted when decoding a [`ContentRef`]
///
/// Older documents named the inline field `content`. Decoding folds it into
/// `inline`; nothing else ever sees the legacy name.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContentRef {
    #[serde(default)]
    secret_ref: Option<SecretReference>,
    #[serde(default)]
    inline: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl From<RawContentRef> for ContentRef {
    fn from(raw: RawContentRef) -> Self {
        let inline = raw.inline.filter(|s| !s.is_empty());
        let legacy = raw.content.filter(|s| !s.is_empty());

        let inline = match (inline, legacy) {
            (Some(inline), Some(_)) => {
                log::warn!("both `inline` and legacy `content` are set, ignoring `content`");
                inline
            }
            (Some(inline), None) => inline,
            (None, Some(legacy)) => {
                log::debug!("migrating legacy `content` field to `inline`");
                legacy
            }
            (None, None) => String::new(),
        };

        Self {
            secret_ref: raw.secret_ref,
            inline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_variants() {
        assert!(ContentRef::default().is_empty());
        assert!(ContentRef::secret("").is_empty());
        assert!(!ContentRef::inline("a: 1").is_empty());
        assert!(!ContentRef::secret("s").is_empty());
    }

    #[test]
    fn test_secret_key_defaults_namespace() {
        let key = ContentRef::secret("s").secret_key("ns1").unwrap();
        assert_eq!(key.namespace, "ns1");
        assert_eq!(key.name, "s");

        let key = ContentRef::secret_in("other", "s").secret_key("ns1").unwrap();
        assert_eq!(key.namespace, "other");

        let key = ContentRef::secret_in("", "s").secret_key("ns1").unwrap();
        assert_eq!(key.namespace, "ns1");
        assert_eq!(key.to_string(), "ns1/s");
    }

    #[test]
    fn test_normalized_drops_empty_namespace() {
        assert_eq!(
            ContentRef::secret_in("", "s").normalized(),
            ContentRef::secret("s")
        );
        assert_eq!(
            ContentRef::secret_in("other", "s").normalized(),
            ContentRef::secret_in("other", "s")
        );

        let nameless = ContentRef {
            secret_ref: Some(SecretReference::default()),
            inline: "a: 1".to_string(),
        };
        assert_eq!(nameless.normalized(), ContentRef::inline("a: 1"));
    }

    #[test]
    fn test_secret_key_absent_for_inline() {
        assert!(ContentRef::inline("a: 1").secret_key("ns1").is_none());
        assert!(ContentRef::secret("").secret_key("ns1").is_none());
    }

    #[test]
    fn test_decode_migrates_legacy_content() {
        let decoded: ContentRef = serde_json::from_str(r#"{"content": "a: 1"}"#).unwrap();
        assert_eq!(decoded, ContentRef::inline("a: 1"));

        let decoded: ContentRef =
            serde_json::from_str(r#"{"inline": "b: 2", "content": "a: 1"}"#).unwrap();
        assert_eq!(decoded.inline, "b: 2");
    }

    #[test]
    fn test_encode_uses_canonical_fields() {
        let encoded = serde_json::to_string(&ContentRef::inline("a: 1")).unwrap();
        assert_eq!(encoded, r#"{"inline":"a: 1"}"#);

        let encoded = serde_json::to_string(&ContentRef::secret("s")).unwrap();
        assert_eq!(encoded, r#"{"secretRef":{"name":"s"}}"#);
    }

    #[test]
    fn test_into_non_empty() {
        assert!(ContentRef::default().into_non_empty().is_none());
        assert!(ContentRef::inline("x").into_non_empty().is_some());
    }
}
