//! HTTP fetcher.
//!
//! Downloads archives with a blocking [`ureq`] agent. Only `http` and `https`
//! URLs are accepted.

use crate::error::{Error, Result};
use crate::fetch::Fetcher;

/// Maximum archive size (256 MB covers any reasonable playbook bundle).
const MAX_BODY_SIZE: u64 = 256 * 1024 * 1024;

/// HTTP fetcher for playbook archives.
///
/// # Example
///
/// ```no_run
/// use playbook::fetch::Fetcher;
/// use playbook::fetch::http::HttpFetcher;
///
/// let fetcher = HttpFetcher::new();
/// let bytes = fetcher.fetch("https://example.com/playbooks/site.tar.gz").unwrap();
/// println!("Downloaded {} bytes", bytes.len());
/// ```
pub struct HttpFetcher {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// Upper bound on the response body.
    max_body_size: u64,
}

impl HttpFetcher {
    /// Create a new HTTP fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            max_body_size: MAX_BODY_SIZE,
        }
    }

    /// Override the maximum body size.
    #[must_use]
    pub fn with_max_body_size(mut self, max_body_size: u64) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Get the maximum body size.
    #[must_use]
    pub fn max_body_size(&self) -> u64 {
        self.max_body_size
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        check_scheme(url)?;
        log::debug!("downloading playbook archive from {}", url);

        let mut response = self
            .agent
            .get(url)
            .header("Accept", "application/octet-stream")
            .header("User-Agent", "hostops")
            .call()?;

        let bytes = response
            .body_mut()
            .with_config()
            .limit(self.max_body_size)
            .read_to_vec()
            .map_err(|e| Error::DownloadFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        log::debug!("downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }
}

/// Reject anything that is not plain http(s).
fn check_scheme(url: &str) -> Result<()> {
    let lower = url.trim().to_ascii_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") {
        Ok(())
    } else {
        Err(Error::UnsupportedScheme {
            url: url.to_string(),
        })
    }
}
