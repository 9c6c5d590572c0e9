//! Core types for playbook operations.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A playbook packaged as an archive on a remote server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePlaybookRef {
    /// Where the archive is served from (http or https).
    pub url: String,
    /// Path of the playbook file to run, relative to the archive root.
    pub name: String,
    /// Declared checksum of the archive; the integrity gate and cache key.
    /// Records written with `md5sum` decode into this field.
    #[serde(default, alias = "md5sum", skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl RemotePlaybookRef {
    /// Create a reference without a declared checksum.
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            checksum: None,
        }
    }

    /// Set the declared checksum.
    #[must_use]
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    /// The declared checksum, if one is set and not blank.
    #[must_use]
    pub fn declared_checksum(&self) -> Option<&str> {
        self.checksum
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Same reference with the checksum trimmed and lowercased, blank dropped.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            url: self.url.clone(),
            name: self.name.clone(),
            checksum: self.declared_checksum().map(str::to_ascii_lowercase),
        }
    }
}

/// An archive available on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPlaybook {
    /// Location of the archive in the cache.
    pub archive_path: PathBuf,
    /// Playbook file to run inside the archive.
    pub entry_name: String,
    /// Whether the archive was downloaded during this call.
    pub fetched: bool,
    /// Whether the archive is a copy owned by this attempt alone. Set when no
    /// checksum was declared; such copies are never reused.
    pub private: bool,
}
