//! # playbook
//!
//! Checksum-gated fetching and caching of remotely packaged playbooks.
//!
//! This crate provides:
//! - [`should_fetch`]: the cache policy deciding whether to download
//! - [`verify_checksum`]: mandatory integrity verification of archive bytes
//! - [`fetch::Fetcher`]: the download seam, with an HTTP and a mock implementation
//! - [`PlaybookCache`]: an on-disk cache tying the three together
//!
//! Unpacking the archive and running the playbook are left to the caller.
//!
//! ## Example
//!
//! ```no_run
//! use playbook::{PlaybookCache, RemotePlaybookRef};
//! use playbook::fetch::http::HttpFetcher;
//!
//! let cache = PlaybookCache::new("/var/cache/hostops/playbooks");
//! let reference = RemotePlaybookRef::new("https://example.com/site.tar.gz", "site.yml")
//!     .with_checksum("sha256:2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824");
//!
//! let cached = cache.ensure(&reference, &HttpFetcher::new())?;
//! println!("{} -> {}", cached.entry_name, cached.archive_path.display());
//! # Ok::<(), playbook::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod checksum;
pub mod error;
pub mod fetch;
pub mod types;

pub use cache::{PlaybookCache, should_fetch};
pub use checksum::{Algorithm, Checksum, verify_checksum};
pub use error::{Error, ErrorCategory, Result};
pub use types::{CachedPlaybook, RemotePlaybookRef};
