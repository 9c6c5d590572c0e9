//! Fetcher trait and implementations for downloading playbook archives.
//!
//! The primary implementation is [`http::HttpFetcher`]. Use [`MockFetcher`]
//! for testing without network access:
//!
//! ```
//! use playbook::fetch::{Fetcher, MockFetcher};
//!
//! let mock = MockFetcher::new();
//! mock.add("https://example.com/p.tar.gz", b"archive".to_vec());
//!
//! assert_eq!(mock.fetch("https://example.com/p.tar.gz").unwrap(), b"archive");
//! assert_eq!(mock.fetch_count("https://example.com/p.tar.gz"), 1);
//! ```

pub mod http;

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Source of playbook archive bytes.
pub trait Fetcher: Send + Sync {
    /// Download the archive at `url`.
    ///
    /// # Errors
    ///
    /// Returns a network-category error if the archive cannot be downloaded.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Mock fetcher for testing without network access.
///
/// Clones share state, so a test can keep a handle to inspect fetch counts.
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    archives: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fetches: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockFetcher {
    /// Create a new empty mock fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `data` for `url`.
    pub fn add(&self, url: impl Into<String>, data: Vec<u8>) {
        self.archives
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.into(), data);
    }

    /// Number of fetches of `url` so far.
    #[must_use]
    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .copied()
            .unwrap_or(0)
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        *self
            .fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(url.to_string())
            .or_default() += 1;

        self.archives
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
            .ok_or_else(|| Error::http(format!("HTTP 404 for {}", url), Some(404)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fetcher_serves_added_archive() {
        let mock = MockFetcher::new();
        mock.add("https://x/p.tar.gz", vec![1, 2, 3]);

        assert_eq!(mock.fetch("https://x/p.tar.gz").unwrap(), vec![1, 2, 3]);
        assert_eq!(mock.fetch_count("https://x/p.tar.gz"), 1);
    }

    #[test]
    fn test_mock_fetcher_missing_url() {
        let mock = MockFetcher::new();
        let err = mock.fetch("https://x/missing").unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(mock.fetch_count("https://x/missing"), 1);
    }
}
