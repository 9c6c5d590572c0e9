//! Integrity checksums for playbook archives.
//!
//! A declared checksum is written as `<algorithm>:<hex>`. A bare hex string
//! is read by its length: 32 digits as MD5 (the `md5sum` records carry),
//! 64 digits as SHA-256.

use crate::error::{Error, Result};
use md5::Md5;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Supported checksum algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// MD5, accepted for records that declare `md5sum`.
    Md5,
    /// SHA-256.
    Sha256,
    /// BLAKE3 (256-bit output).
    Blake3,
}

impl Algorithm {
    /// Prefix used in the textual form.
    #[must_use]
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }

    /// Number of hex digits in a digest.
    #[must_use]
    pub fn hex_len(&self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Sha256 | Self::Blake3 => 64,
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.to_ascii_lowercase().as_str() {
            "md5" => Some(Self::Md5),
            "sha256" => Some(Self::Sha256),
            "blake3" => Some(Self::Blake3),
            _ => None,
        }
    }

    /// Digest `bytes` with this algorithm.
    #[must_use]
    pub fn digest(&self, bytes: &[u8]) -> Checksum {
        let hex = match self {
            Self::Md5 => hex::encode(Md5::digest(bytes)),
            Self::Sha256 => hex::encode(Sha256::digest(bytes)),
            Self::Blake3 => blake3::hash(bytes).to_hex().to_string(),
        };
        Checksum {
            algorithm: *self,
            hex,
        }
    }
}

/// A parsed checksum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    algorithm: Algorithm,
    hex: String,
}

impl Checksum {
    /// Algorithm of this checksum.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Lowercase hex digest.
    #[must_use]
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// File-name-safe form, `<algorithm>-<hex>`.
    #[must_use]
    pub fn slot_name(&self) -> String {
        format!("{}-{}", self.algorithm.prefix(), self.hex)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm.prefix(), self.hex)
    }
}

impl FromStr for Checksum {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let invalid = || Error::InvalidChecksum(s.to_string());
        let (algorithm, hex) = match trimmed.split_once(':') {
            Some((prefix, hex)) => (Algorithm::from_prefix(prefix).ok_or_else(invalid)?, hex),
            None if trimmed.len() == Algorithm::Md5.hex_len() => (Algorithm::Md5, trimmed),
            None => (Algorithm::Sha256, trimmed),
        };

        if hex.len() != algorithm.hex_len() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidChecksum(s.to_string()));
        }

        Ok(Self {
            algorithm,
            hex: hex.to_ascii_lowercase(),
        })
    }
}

/// Verify `bytes` against a declared checksum.
///
/// An absent or blank declaration passes; there is nothing to check against.
/// Otherwise the bytes are digested with the declared algorithm and any
/// difference is a [`Error::ChecksumMismatch`].
pub fn verify_checksum(bytes: &[u8], declared: Option<&str>) -> Result<()> {
    let declared = match declared.map(str::trim) {
        Some(d) if !d.is_empty() => d,
        _ => return Ok(()),
    };

    let expected: Checksum = declared.parse()?;
    let actual = expected.algorithm().digest(bytes);
    if actual != expected {
        return Err(Error::ChecksumMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // sha256("hello")
    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
    // md5("hello")
    const HELLO_MD5: &str = "5d41402abc4b2a76b9719d911017c592";

    #[test]
    fn test_parse_bare_hex_is_sha256() {
        let checksum: Checksum = HELLO_SHA256.parse().unwrap();
        assert_eq!(checksum.algorithm(), Algorithm::Sha256);
        assert_eq!(checksum.to_string(), format!("sha256:{}", HELLO_SHA256));
    }

    #[test]
    fn test_parse_prefixed_and_uppercase() {
        let upper = format!("SHA256:{}", HELLO_SHA256.to_uppercase());
        let checksum: Checksum = upper.parse().unwrap();
        assert_eq!(checksum.hex(), HELLO_SHA256);

        let blake = Algorithm::Blake3.digest(b"hello").to_string();
        let parsed: Checksum = blake.parse().unwrap();
        assert_eq!(parsed.algorithm(), Algorithm::Blake3);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("abc123".parse::<Checksum>().is_err());
        assert!("crc32:3610a686".parse::<Checksum>().is_err());
        assert!(format!("md5:{}", HELLO_SHA256).parse::<Checksum>().is_err());
        assert!(format!("sha256:{}", HELLO_MD5).parse::<Checksum>().is_err());
        assert!(format!("sha256:{}zz", &HELLO_SHA256[..62])
            .parse::<Checksum>()
            .is_err());
    }

    #[test]
    fn test_parse_md5() {
        let bare: Checksum = HELLO_MD5.parse().unwrap();
        assert_eq!(bare.algorithm(), Algorithm::Md5);
        assert_eq!(bare.to_string(), format!("md5:{}", HELLO_MD5));

        let prefixed: Checksum = format!("MD5:{}", HELLO_MD5.to_uppercase()).parse().unwrap();
        assert_eq!(prefixed, bare);
        assert_eq!(Algorithm::Md5.digest(b"hello"), bare);
    }

    #[test]
    fn test_slot_name() {
        let checksum: Checksum = HELLO_MD5.parse().unwrap();
        assert_eq!(checksum.slot_name(), format!("md5-{}", HELLO_MD5));
    }

    #[test]
    fn test_verify_md5_rejects_tampered_bytes() {
        assert!(verify_checksum(b"hello", Some(HELLO_MD5)).is_ok());
        let err = verify_checksum(b"TAMPERED", Some(HELLO_MD5)).unwrap_err();
        assert!(err.is_checksum_mismatch());
    }

    #[test]
    fn test_verify_matching_bytes() {
        assert!(verify_checksum(b"hello", Some(HELLO_SHA256)).is_ok());
        let blake = Algorithm::Blake3.digest(b"hello").to_string();
        assert!(verify_checksum(b"hello", Some(&blake)).is_ok());
    }

    #[test]
    fn test_verify_mismatch() {
        let err = verify_checksum(b"hello!", Some(HELLO_SHA256)).unwrap_err();
        match err {
            Error::ChecksumMismatch { expected, actual } => {
                assert_eq!(expected, format!("sha256:{}", HELLO_SHA256));
                assert_ne!(actual, expected);
            }
            other => panic!("Expected ChecksumMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_verify_without_declaration() {
        assert!(verify_checksum(b"anything", None).is_ok());
        assert!(verify_checksum(b"anything", Some("  ")).is_ok());
    }

    #[test]
    fn test_verify_invalid_declaration() {
        let err = verify_checksum(b"hello", Some("abc123")).unwrap_err();
        assert!(matches!(err, Error::InvalidChecksum(_)));
    }
}
