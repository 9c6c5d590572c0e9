//! Record persistence
//!
//! [`FileStore`] keeps one TOML document per record:
//!
//! ```text
//! <root>/<kind>/<namespace>/<name>.toml
//! ```

use crate::api::Record;
use crate::error::{Error, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Where records are read from and written back to
pub trait RecordStore: Send + Sync {
    /// Load one record, `None` if it does not exist
    fn load<R: Record>(&self, namespace: &str, name: &str) -> Result<Option<R>>;

    /// Create or replace a record
    fn save<R: Record>(&self, record: &R) -> Result<()>;

    /// All records of a kind, ordered by namespace then name
    fn list<R: Record>(&self) -> Result<Vec<R>>;

    /// Delete a record; returns whether it existed
    fn delete<R: Record>(&self, namespace: &str, name: &str) -> Result<bool>;
}

/// TOML files under a root directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding a record
    pub fn record_path<R: Record>(&self, namespace: &str, name: &str) -> Result<PathBuf> {
        let kind_dir = self.root.join(R::KIND);
        validate_segment(&kind_dir, namespace)?;
        validate_segment(&kind_dir, name)?;
        Ok(kind_dir.join(namespace).join(format!("{name}.toml")))
    }

    fn read<R: Record>(path: &Path) -> Result<R> {
        let content = fs::read_to_string(path).map_err(|e| Error::store(path, e))?;
        toml::from_str(&content)
            .map_err(|e| Error::store(path, format!("failed to parse record: {e}")))
    }
}

impl RecordStore for FileStore {
    fn load<R: Record>(&self, namespace: &str, name: &str) -> Result<Option<R>> {
        let path = self.record_path::<R>(namespace, name)?;
        if !path.exists() {
            log::debug!("No {} record at {}", R::KIND, path.display());
            return Ok(None);
        }
        Self::read(&path).map(Some)
    }

    fn save<R: Record>(&self, record: &R) -> Result<()> {
        let meta = record.metadata();
        let path = self.record_path::<R>(&meta.namespace, &meta.name)?;
        let dir = path
            .parent()
            .ok_or_else(|| Error::store(&path, "record path has no parent"))?;
        fs::create_dir_all(dir).map_err(|e| Error::store(dir, e))?;

        let content = toml::to_string_pretty(record)
            .map_err(|e| Error::store(&path, format!("failed to serialize record: {e}")))?;

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::store(dir, e))?;
        temp.write_all(content.as_bytes())
            .map_err(|e| Error::store(temp.path(), e))?;
        temp.persist(&path).map_err(|e| Error::store(&path, e.error))?;

        log::debug!("Saved {} {}", R::KIND, record.key());
        Ok(())
    }

    fn list<R: Record>(&self) -> Result<Vec<R>> {
        let kind_dir = self.root.join(R::KIND);
        if !kind_dir.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in WalkDir::new(&kind_dir)
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| Error::store(&kind_dir, e))?;
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if !entry.file_type().is_file()
                || hidden
                || path.extension().is_none_or(|ext| ext != "toml")
            {
                continue;
            }
            records.push(Self::read(path)?);
        }
        Ok(records)
    }

    fn delete<R: Record>(&self, namespace: &str, name: &str) -> Result<bool> {
        let path = self.record_path::<R>(namespace, name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("Deleted {} {}/{}", R::KIND, namespace, name);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::store(path, e)),
        }
    }
}

/// Namespaces and names become path segments; keep them to one.
fn validate_segment(base: &Path, segment: &str) -> Result<()> {
    let valid = !segment.is_empty()
        && !segment.starts_with('.')
        && !segment.contains(['/', '\\'])
        && segment != "..";
    if valid {
        Ok(())
    } else {
        Err(Error::store(base, format!("invalid record name {segment:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AutomationSpec, DesiredConfig, HostConfig, HostOperationJob};
    use crate::duration::Timeout;
    use chrono::TimeZone;
    use content::ContentRef;
    use lifecycle::Phase;
    use tempfile::TempDir;

    fn host_config(namespace: &str, name: &str) -> HostConfig {
        HostConfig::new(
            namespace,
            name,
            "node-1",
            DesiredConfig {
                ansible: Some(AutomationSpec {
                    local_playbook_text: Some(ContentRef::inline("- hosts: all\n")),
                    values: Some(ContentRef::secret("vals")),
                    ..Default::default()
                }),
                timeout: Timeout::from_mins(5),
            },
        )
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());

        let mut record = host_config("default", "hc");
        record.status.phase = Phase::Failed;
        record.status.failure_reason = Some("ExecutionTimeout".to_string());
        record.status.last_execution_time =
            Some(chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        record
            .metadata
            .annotations
            .insert("example/annotation".to_string(), "x".to_string());

        store.save(&record).unwrap();
        assert!(temp.path().join("hostconfigs/default/hc.toml").exists());

        let loaded: HostConfig = store.load("default", "hc").unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_load_missing_is_none() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        assert!(store.load::<HostConfig>("default", "absent").unwrap().is_none());
    }

    #[test]
    fn test_list_is_sorted_and_per_kind() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        store.save(&host_config("b", "two")).unwrap();
        store.save(&host_config("a", "z")).unwrap();
        store.save(&host_config("a", "y")).unwrap();
        store
            .save(&HostOperationJob::new("a", "job", "node-1", DesiredConfig::default()))
            .unwrap();
        fs::write(temp.path().join("hostconfigs/a/notes.txt"), "ignored").unwrap();

        let keys: Vec<String> = store
            .list::<HostConfig>()
            .unwrap()
            .iter()
            .map(|r| r.metadata.namespace.clone() + "/" + &r.metadata.name)
            .collect();
        assert_eq!(keys, ["a/y", "a/z", "b/two"]);
        assert_eq!(store.list::<HostOperationJob>().unwrap().len(), 1);
    }

    #[test]
    fn test_list_empty_root() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().join("missing"));
        assert!(store.list::<HostConfig>().unwrap().is_empty());
    }

    #[test]
    fn test_delete() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        store.save(&host_config("default", "hc")).unwrap();

        assert!(store.delete::<HostConfig>("default", "hc").unwrap());
        assert!(!store.delete::<HostConfig>("default", "hc").unwrap());
        assert!(store.load::<HostConfig>("default", "hc").unwrap().is_none());
    }

    #[test]
    fn test_rejects_path_like_names() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        for bad in ["", "..", "../etc", "a/b", ".hidden"] {
            assert!(store.load::<HostConfig>("default", bad).is_err(), "{bad:?}");
            assert!(store.load::<HostConfig>(bad, "hc").is_err(), "{bad:?}");
        }
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        let dir = temp.path().join("hostconfigs/default");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("hc.toml"), "not = [valid").unwrap();

        let err = store.load::<HostConfig>("default", "hc").unwrap_err();
        assert_eq!(err.reason(), "StoreFailed");
    }
}
