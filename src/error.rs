//! Error taxonomy of a reconciliation pass
//!
//! Every failure carries a short, stable [`Error::reason`] code that is
//! written to `status.failureReason`, and an [`Error::is_retryable`] hint for
//! the caller's backoff.

use crate::duration::Timeout;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure reasons recorded on status
pub mod reason {
    pub const CONTENT_RESOLUTION_FAILED: &str = "ContentResolutionFailed";
    pub const CHECKSUM_MISMATCH: &str = "ChecksumMismatch";
    pub const PLAYBOOK_FETCH_FAILED: &str = "PlaybookFetchFailed";
    pub const EXECUTION_TIMEOUT: &str = "ExecutionTimeout";
    pub const EXECUTION_FAILED: &str = "ExecutionFailed";
    pub const FINGERPRINT_FAILED: &str = "FingerprintFailed";
    pub const INVALID_TRANSITION: &str = "InvalidTransition";
    pub const STORE_FAILED: &str = "StoreFailed";
    pub const INVALID_SETTINGS: &str = "InvalidSettings";
    pub const CLEANUP_FAILED: &str = "CleanupFailed";
    pub const WORKER_POOL_FAILED: &str = "WorkerPoolFailed";
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("content resolution failed: {0}")]
    ContentResolution(#[source] content::Error),

    #[error("playbook archive rejected: {0}")]
    ChecksumMismatch(#[source] playbook::Error),

    #[error("playbook fetch failed: {0}")]
    Fetch(#[source] playbook::Error),

    #[error("execution exceeded timeout of {timeout}")]
    ExecutionTimeout { timeout: Timeout },

    #[error("execution failed: {message}")]
    ExecutionFailure { message: String },

    #[error("fingerprint computation failed: {0}")]
    Fingerprint(#[source] fingerprint::Error),

    #[error(transparent)]
    Transition(#[from] lifecycle::TransitionError),

    #[error("record store error at {}: {message}", .path.display())]
    Store { path: PathBuf, message: String },

    #[error("invalid settings in {}: {message}", .path.display())]
    Settings { path: PathBuf, message: String },

    #[error("cleanup of {record} failed: {message}")]
    Cleanup { record: String, message: String },

    #[error("failed to create worker pool: {message}")]
    WorkerPool { message: String },
}

impl Error {
    pub fn store(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Store {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::ExecutionFailure {
            message: message.into(),
        }
    }

    /// Short, stable failure code
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ContentResolution(_) => reason::CONTENT_RESOLUTION_FAILED,
            Self::ChecksumMismatch(_) => reason::CHECKSUM_MISMATCH,
            Self::Fetch(_) => reason::PLAYBOOK_FETCH_FAILED,
            Self::ExecutionTimeout { .. } => reason::EXECUTION_TIMEOUT,
            Self::ExecutionFailure { .. } => reason::EXECUTION_FAILED,
            Self::Fingerprint(_) => reason::FINGERPRINT_FAILED,
            Self::Transition(_) => reason::INVALID_TRANSITION,
            Self::Store { .. } => reason::STORE_FAILED,
            Self::Settings { .. } => reason::INVALID_SETTINGS,
            Self::Cleanup { .. } => reason::CLEANUP_FAILED,
            Self::WorkerPool { .. } => reason::WORKER_POOL_FAILED,
        }
    }

    /// Whether retrying the same pass later may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ContentResolution(e) => e.is_retryable(),
            Self::Fetch(e) => e.is_retryable(),
            Self::ExecutionTimeout { .. } | Self::Store { .. } | Self::Cleanup { .. } => true,
            _ => false,
        }
    }

    /// Operator hint for playbook fetch and integrity failures
    pub fn advice(&self) -> Option<&'static str> {
        match self {
            Self::ChecksumMismatch(e) | Self::Fetch(e) => Some(e.category().advice()),
            _ => None,
        }
    }

    /// Failures that happen before the automation is started
    pub fn is_preparation(&self) -> bool {
        matches!(
            self,
            Self::ContentResolution(_) | Self::ChecksumMismatch(_) | Self::Fetch(_)
        )
    }
}

impl From<content::Error> for Error {
    fn from(e: content::Error) -> Self {
        Self::ContentResolution(e)
    }
}

impl From<playbook::Error> for Error {
    fn from(e: playbook::Error) -> Self {
        if e.is_checksum_mismatch() {
            Self::ChecksumMismatch(e)
        } else {
            Self::Fetch(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifecycle::Phase;

    #[test]
    fn test_reasons() {
        let not_found = content::Error::SecretNotFound {
            namespace: "default".into(),
            name: "vals".into(),
        };
        let err = Error::from(not_found);
        assert_eq!(err.reason(), "ContentResolutionFailed");
        assert!(!err.is_retryable());
        assert!(err.is_preparation());

        let mismatch = playbook::Error::ChecksumMismatch {
            expected: "sha256:aa".into(),
            actual: "sha256:bb".into(),
        };
        let err = Error::from(mismatch);
        assert_eq!(err.reason(), "ChecksumMismatch");
        assert!(err.is_preparation());

        let err = Error::from(playbook::Error::http("HTTP 503", Some(503)));
        assert_eq!(err.reason(), "PlaybookFetchFailed");
        assert!(err.is_retryable());

        let err = Error::ExecutionTimeout {
            timeout: Timeout::from_mins(5),
        };
        assert_eq!(err.reason(), "ExecutionTimeout");
        assert_eq!(err.to_string(), "execution exceeded timeout of 5m0s");
        assert!(!err.is_preparation());

        assert_eq!(Error::execution("exit 2").reason(), "ExecutionFailed");
    }

    #[test]
    fn test_transition_error_is_transparent() {
        let err: Error = lifecycle::TransitionError {
            from: Phase::Succeeded,
            to: Phase::Processing,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "invalid phase transition from Succeeded to Processing"
        );
        assert_eq!(err.reason(), "InvalidTransition");
    }

    #[test]
    fn test_playbook_failures_carry_advice() {
        let mismatch = Error::from(playbook::Error::ChecksumMismatch {
            expected: "md5:aa".into(),
            actual: "md5:bb".into(),
        });
        assert_eq!(
            mismatch.advice(),
            Some(playbook::ErrorCategory::Integrity.advice())
        );

        let unreachable = Error::from(playbook::Error::http("HTTP 503", Some(503)));
        assert_eq!(
            unreachable.advice(),
            Some(playbook::ErrorCategory::Network.advice())
        );

        assert_eq!(Error::execution("exit 2").advice(), None);
    }

    #[test]
    fn test_store_errors_are_retryable() {
        let err = Error::store("/var/lib/hostops/records/default/web.toml", "disk full");
        assert_eq!(err.reason(), "StoreFailed");
        assert!(err.is_retryable());
        assert!(!err.is_preparation());
        assert!(err.to_string().contains("web.toml"));
    }

    #[test]
    fn test_unavailable_secret_store_is_retryable() {
        let err = Error::from(content::Error::Unavailable {
            namespace: "default".into(),
            name: "vals".into(),
            message: "connection refused".into(),
        });
        assert!(err.is_retryable());
    }
}
