//! Error types for playbook operations.
//!
//! Errors are categorized so callers can decide whether a failed fetch is
//! worth retrying or points at a bad declaration.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for playbook operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of playbook errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related errors (transient, retryable).
    Network,
    /// Downloaded or cached bytes failed verification.
    Integrity,
    /// The declaration itself is invalid (bad checksum, unsupported URL).
    Declaration,
    /// Local filesystem errors in the cache.
    Storage,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Integrity => "Integrity check failed",
            Self::Declaration => "Invalid playbook declaration",
            Self::Storage => "Playbook cache error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check connectivity to the playbook server and try again",
            Self::Integrity => "Verify the declared checksum matches the published archive",
            Self::Declaration => "Fix the playbook URL or checksum in the record",
            Self::Storage => "Check permissions and free space of the cache directory",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while fetching or verifying playbooks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bytes do not match the declared checksum.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Declared checksum.
        expected: String,
        /// Checksum of the bytes.
        actual: String,
    },

    /// The declared checksum cannot be parsed.
    #[error("invalid checksum {0:?}: expected md5:<32 hex digits> or [sha256:|blake3:]<64 hex digits>")]
    InvalidChecksum(String),

    /// The URL scheme is not supported.
    #[error("unsupported playbook URL {url}: only http and https are supported")]
    UnsupportedScheme {
        /// Rejected URL.
        url: String,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {message}")]
    HttpError {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// Failed to read a response body.
    #[error("download failed for {url}: {message}")]
    DownloadFailed {
        /// URL being downloaded.
        url: String,
        /// Error message.
        message: String,
    },

    /// IO error in the cache directory.
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::HttpError {
            message: message.into(),
            status,
        }
    }

    /// Get the error category for retry logic.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ChecksumMismatch { .. } => ErrorCategory::Integrity,
            Error::InvalidChecksum(_) => ErrorCategory::Declaration,
            Error::UnsupportedScheme { .. } => ErrorCategory::Declaration,
            Error::HttpError {
                status: Some(code), ..
            } if (400..500).contains(code) && *code != 408 && *code != 429 => {
                ErrorCategory::Declaration
            }
            Error::HttpError { .. } => ErrorCategory::Network,
            Error::DownloadFailed { .. } => ErrorCategory::Network,
            Error::Io { .. } => ErrorCategory::Storage,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Whether this is a checksum mismatch.
    #[must_use]
    pub fn is_checksum_mismatch(&self) -> bool {
        matches!(self, Error::ChecksumMismatch { .. })
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::HttpError {
                message: format!("HTTP {}", code),
                status: Some(code),
            },
            other => Self::HttpError {
                message: other.to_string(),
                status: None,
            },
        }
    }
}
