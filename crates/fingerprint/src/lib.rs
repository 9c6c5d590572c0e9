//! # Fingerprint
//!
//! Deterministic digests of desired configuration.
//!
//! A fingerprint is the BLAKE3 hash of a canonical encoding of a value: the
//! value is serialized to a JSON tree, object keys are emitted in sorted
//! order and no whitespace is written. Two values that serialize to the same
//! tree always share a fingerprint, regardless of how their source documents
//! were laid out.
//!
//! ## Example
//!
//! ```
//! use fingerprint::Fingerprint;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Config { timeout: String, url: String }
//!
//! let a = Fingerprint::compute(&Config { timeout: "5m0s".into(), url: "https://x".into() })?;
//! let b = Fingerprint::compute(&Config { timeout: "5m0s".into(), url: "https://x".into() })?;
//! let c = Fingerprint::compute(&Config { timeout: "10m0s".into(), url: "https://x".into() })?;
//!
//! assert_eq!(a, b);
//! assert_ne!(a, c);
//! assert!(fingerprint::is_stable(Some(a.as_str()), &b));
//! # Ok::<(), fingerprint::Error>(())
//! ```

mod error;

pub use error::{Error, Result};

use blake3::Hasher;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Length of a hex-encoded BLAKE3 digest
const HEX_LEN: usize = 64;

/// A BLAKE3 digest of a canonically encoded value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a serializable value
    pub fn compute<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let bytes = canonical_bytes(value)?;
        Ok(Self::of_bytes(&bytes))
    }

    /// Fingerprint raw bytes
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(bytes);
        Self(hasher.finalize().to_hex().to_string())
    }

    /// Full lowercase hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated digest for log lines
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Fingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let valid = s.len() == HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit());
        if !valid {
            return Err(Error::Invalid(s.to_string()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.0
    }
}

/// Check whether a recorded fingerprint matches the current one
///
/// A missing record is never stable.
pub fn is_stable(recorded: Option<&str>, current: &Fingerprint) -> bool {
    recorded.is_some_and(|r| r == current.as_str())
}

/// Canonical byte encoding of a serializable value
///
/// Objects are written with keys in sorted order, independent of how the
/// serializer (or any enabled `serde_json` feature) orders map entries.
pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let tree = serde_json::to_value(value)?;
    let mut out = Vec::with_capacity(256);
    write_canonical(&tree, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) -> Result<()> {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push(b'{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                serde_json::to_writer(&mut *out, key)?;
                out.push(b':');
                write_canonical(&map[key.as_str()], out)?;
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out)?;
            }
            out.push(b']');
        }
        scalar => serde_json::to_writer(&mut *out, scalar)?,
    }
    Ok(())
}
