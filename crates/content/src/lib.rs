//! # content
//!
//! Resolve content references to concrete text.
//!
//! A [`ContentRef`] is either inline text or a reference to a secret that
//! holds the text under a well-known key. The [`Resolver`] turns a reference
//! into a string with at most one store lookup per call.
//!
//! ## Example
//!
//! ```
//! use content::{ContentRef, MemorySecretStore, Resolver};
//! use std::sync::Arc;
//!
//! let store = MemorySecretStore::new();
//! store.insert("ns1", "s", [("values.yaml", "b: 2")]);
//!
//! let resolver = Resolver::with_default_key(Arc::new(store));
//! assert_eq!(resolver.resolve(&ContentRef::secret("s"), "ns1")?, "b: 2");
//! assert_eq!(resolver.resolve(&ContentRef::inline("a: 1"), "ns1")?, "a: 1");
//! assert_eq!(resolver.resolve(&ContentRef::default(), "ns1")?, "");
//! # Ok::<(), content::Error>(())
//! ```
//!
//! ## Missing secrets
//!
//! A secret that does not exist is reported as [`Error::SecretNotFound`];
//! it is never treated as empty content.

#![warn(missing_docs)]

pub mod error;
pub mod resolver;
pub mod store;
#[allow(missing_docs)]
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use resolver::{DEFAULT_VALUES_KEY, Resolver};
pub use store::{DirSecretStore, InjectedFailure, MemorySecretStore, SecretData, SecretStore};
pub use types::{ContentRef, SecretKey, SecretReference};
