use super::KeyValueStore;
use estatedesk_core::{storage_error, EstateResult};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Key-value store backed by a single JSON object file
///
/// The file holds `{"key": "value", ...}`. A missing file is an empty
/// store; every write rewrites the whole file through a uniquely named
/// temporary sibling that is then renamed over it.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store over the given file; nothing is touched until a write
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> EstateResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            storage_error!(
                format!("Failed to read {}: {}", self.path.display(), e),
                "file_store",
                e
            )
        })?;

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            storage_error!(
                format!("Storage file {} is corrupt: {}", self.path.display(), e),
                "file_store",
                e
            )
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> EstateResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let json_data = serde_json::to_string_pretty(entries)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| {
            storage_error!(
                format!("Failed to create temporary file in {}: {}", dir.display(), e),
                "file_store",
                e
            )
        })?;
        tmp.write_all(json_data.as_bytes()).map_err(|e| {
            storage_error!(
                format!("Failed to write {}: {}", tmp.path().display(), e),
                "file_store",
                e
            )
        })?;
        tmp.persist(&self.path).map_err(|e| {
            let source = e.error;
            storage_error!(
                format!("Failed to replace {}: {}", self.path.display(), source),
                "file_store",
                source
            )
        })?;

        debug!("Wrote {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> EstateResult<Option<String>> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> EstateResult<()> {
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> EstateResult<()> {
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("absent.json"));
        assert_eq!(store.get("user").unwrap(), None);
        store.remove("user").unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn values_survive_a_new_instance() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("local_storage.json");

        FileStore::new(&path).set("user", r#"{"roles":[]}"#).unwrap();
        FileStore::new(&path).set("theme", "dark").unwrap();

        let store = FileStore::new(&path);
        assert_eq!(store.get("user").unwrap().as_deref(), Some(r#"{"roles":[]}"#));
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));

        store.remove("user").unwrap();
        assert_eq!(FileStore::new(&path).get("user").unwrap(), None);
        assert_eq!(FileStore::new(&path).get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn concurrent_writers_leave_a_single_valid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("local_storage.json");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let store = FileStore::new(&path);
                    for _ in 0..10 {
                        store.set("user", &format!("writer-{i}")).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let value = FileStore::new(&path).get("user").unwrap().unwrap();
        assert!(value.starts_with("writer-"));

        let names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("local_storage.json")]);
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("local_storage.json");
        std::fs::write(&path, "[not an object").unwrap();

        let err = FileStore::new(&path).get("user").unwrap_err();
        assert!(matches!(err, estatedesk_core::EstateError::Storage { .. }));
    }
}
