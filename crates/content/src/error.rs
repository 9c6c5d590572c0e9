//! Error types for content resolution.
//!
//! Secret store failures are categorized so the caller can tell a missing
//! secret from a transient outage without matching on every variant.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for content operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of content errors for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The referenced secret does not exist.
    NotFound,
    /// The store refused access to the secret.
    Permission,
    /// The store could not be reached (transient).
    Unavailable,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Secret not found",
            Self::Permission => "Permission denied",
            Self::Unavailable => "Secret store unavailable",
            Self::Other => "Unexpected error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while resolving content.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The secret does not exist in the store.
    #[error("secret {namespace}/{name} not found")]
    SecretNotFound {
        /// Namespace of the secret.
        namespace: String,
        /// Name of the secret.
        name: String,
    },

    /// Access to the secret was denied.
    #[error("permission denied reading secret {namespace}/{name}: {message}")]
    PermissionDenied {
        /// Namespace of the secret.
        namespace: String,
        /// Name of the secret.
        name: String,
        /// Detail from the store.
        message: String,
    },

    /// The store could not serve the request right now.
    #[error("secret store unavailable while reading {namespace}/{name}: {message}")]
    Unavailable {
        /// Namespace of the secret.
        namespace: String,
        /// Name of the secret.
        name: String,
        /// Detail from the store.
        message: String,
    },

    /// IO error reading a file-backed secret.
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Secret value is not valid UTF-8 text.
    #[error("secret {namespace}/{name} key {key} is not valid UTF-8")]
    InvalidEncoding {
        /// Namespace of the secret.
        namespace: String,
        /// Name of the secret.
        name: String,
        /// Offending key.
        key: String,
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

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::SecretNotFound { .. } => ErrorCategory::NotFound,
            Error::PermissionDenied { .. } => ErrorCategory::Permission,
            Error::Unavailable { .. } => ErrorCategory::Unavailable,
            Error::Io { source, .. } => match source.kind() {
                io::ErrorKind::PermissionDenied => ErrorCategory::Permission,
                io::ErrorKind::NotFound => ErrorCategory::NotFound,
                _ => ErrorCategory::Other,
            },
            Error::InvalidEncoding { .. } => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Whether the referenced secret is missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}
