//! Error types for the fingerprint crate

use thiserror::Error;

/// Errors that can occur while fingerprinting a value
#[derive(Error, Debug)]
pub enum Error {
    /// The value could not be encoded
    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),

    /// A stored fingerprint is not a BLAKE3 hex digest
    #[error("invalid fingerprint: {0}")]
    Invalid(String),
}

/// Result type for fingerprint operations
pub type Result<T> = std::result::Result<T, Error>;
