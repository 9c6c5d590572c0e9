//! Checksum-keyed playbook cache.
//!
//! An archive with a declared checksum is stored under a slot named after
//! that checksum:
//!
//! ```text
//! <dir>/<algorithm>-<hex>.archive
//! ```
//!
//! A slot is written only after its bytes were verified, so references that
//! share a URL but declare different checksums never share a file. An archive
//! without a declared checksum goes to a private `unverified-*.archive` copy
//! that belongs to one attempt and is removed by [`PlaybookCache::release`].

use crate::checksum::{Checksum, verify_checksum};
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::types::{CachedPlaybook, RemotePlaybookRef};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Decide whether a playbook archive must be downloaded.
///
/// Without a declared checksum nothing can vouch for a cached copy, so the
/// archive is always fetched. With one, a cached copy recorded under the same
/// checksum is reused. Both sides are compared in parsed form when they parse,
/// so `md5:<hex>` and a bare 32-digit `<hex>` name the same copy.
pub fn should_fetch(reference: &RemotePlaybookRef, cached_checksum: Option<&str>) -> bool {
    let Some(declared) = reference.declared_checksum() else {
        return true;
    };
    let Some(cached) = cached_checksum.map(str::trim).filter(|c| !c.is_empty()) else {
        return true;
    };
    match (declared.parse::<Checksum>(), cached.parse::<Checksum>()) {
        (Ok(declared), Ok(cached)) => declared != cached,
        _ => !cached.eq_ignore_ascii_case(declared),
    }
}

/// On-disk cache of playbook archives.
#[derive(Debug, Clone)]
pub struct PlaybookCache {
    dir: PathBuf,
}

impl PlaybookCache {
    /// Create a cache rooted at `dir`. The directory is created on first store.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the slot holding the archive verified against `checksum`.
    pub fn archive_path(&self, checksum: &Checksum) -> PathBuf {
        self.dir.join(format!("{}.archive", checksum.slot_name()))
    }

    /// Checksum of the cached copy `reference` would use, if one is stored.
    ///
    /// Always `None` for a reference without a declared checksum.
    pub fn cached_checksum(&self, reference: &RemotePlaybookRef) -> Result<Option<String>> {
        let Some(declared) = reference.declared_checksum() else {
            return Ok(None);
        };
        let checksum: Checksum = declared.parse()?;
        let path = self.archive_path(&checksum);
        match fs::metadata(&path) {
            Ok(_) => Ok(Some(checksum.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(path, e)),
        }
    }

    /// Make a verified copy of the referenced archive available locally.
    ///
    /// Reuses the cached copy when [`should_fetch`] allows it. Whenever a
    /// checksum is declared the bytes are verified, cached or not; a cached
    /// copy that fails verification is evicted before the error is returned.
    pub fn ensure(
        &self,
        reference: &RemotePlaybookRef,
        fetcher: &dyn Fetcher,
    ) -> Result<CachedPlaybook> {
        let url = reference.url.as_str();
        let Some(declared) = reference.declared_checksum() else {
            let bytes = fetcher.fetch(url)?;
            let archive_path = self.store_private(&bytes)?;
            log::debug!(
                "no checksum declared for {}, using private copy {}",
                url,
                archive_path.display()
            );
            return Ok(CachedPlaybook {
                archive_path,
                entry_name: reference.name.clone(),
                fetched: true,
                private: true,
            });
        };

        let checksum: Checksum = declared.parse()?;
        let archive = self.archive_path(&checksum);
        let cached = self.cached_checksum(reference)?;

        if !should_fetch(reference, cached.as_deref()) {
            match fs::read(&archive) {
                Ok(bytes) => {
                    if let Err(e) = verify_checksum(&bytes, Some(declared)) {
                        log::warn!("cached archive {} failed verification, evicting", checksum);
                        self.evict(&checksum)?;
                        return Err(e);
                    }
                    log::debug!("using cached playbook archive {} for {}", checksum, url);
                    return Ok(CachedPlaybook {
                        archive_path: archive,
                        entry_name: reference.name.clone(),
                        fetched: false,
                        private: false,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!("cached archive {} disappeared, fetching", checksum);
                }
                Err(e) => return Err(Error::io(archive, e)),
            }
        }

        let bytes = fetcher.fetch(url)?;
        verify_checksum(&bytes, Some(declared))?;
        self.ensure_dir()?;
        self.write_atomic(&archive, &bytes)?;
        log::debug!(
            "cached {} bytes for {} at {}",
            bytes.len(),
            url,
            archive.display()
        );

        Ok(CachedPlaybook {
            archive_path: archive,
            entry_name: reference.name.clone(),
            fetched: true,
            private: false,
        })
    }

    /// Remove the copy verified against `checksum`.
    pub fn evict(&self, checksum: &Checksum) -> Result<()> {
        remove_if_present(&self.archive_path(checksum))
    }

    /// Drop a private copy handed out by [`PlaybookCache::ensure`].
    ///
    /// Shared slots are left in place for the next attempt.
    pub fn release(&self, cached: &CachedPlaybook) -> Result<()> {
        if cached.private {
            remove_if_present(&cached.archive_path)?;
        }
        Ok(())
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))
    }

    fn store_private(&self, bytes: &[u8]) -> Result<PathBuf> {
        self.ensure_dir()?;
        let mut temp = tempfile::Builder::new()
            .prefix("unverified-")
            .suffix(".archive")
            .tempfile_in(&self.dir)
            .map_err(|e| Error::io(&self.dir, e))?;
        temp.write_all(bytes).map_err(|e| Error::io(temp.path(), e))?;
        let (_, path) = temp.keep().map_err(|e| Error::io(&self.dir, e.error))?;
        Ok(path)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut temp =
            tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        temp.write_all(bytes).map_err(|e| Error::io(temp.path(), e))?;
        temp.persist(path).map_err(|e| Error::io(path, e.error))?;
        Ok(())
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path, e)),
    }
}
