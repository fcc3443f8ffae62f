//! Local persistent store adapters.
//!
//! The local store is a synchronous key → JSON text map with one entry per
//! dataset. Entries are the raw dataset value with no envelope, and every
//! write replaces the whole entry.

use crate::error::{Result, StoreError};
use dashmap::DashMap;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tandem_engine::{decode_local, encode_local, DatasetName};

/// Synchronous key/string storage on this device.
pub trait LocalStore: Send + Sync {
    /// Read an entry, `None` when it does not exist.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace an entry. Either the whole value is stored or nothing is.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete an entry; missing entries are not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// All stored keys, sorted.
    fn keys(&self) -> Result<Vec<String>>;
}

/// Read and parse a dataset from the local store.
pub fn read_dataset<L: LocalStore + ?Sized>(store: &L, dataset: DatasetName) -> Result<Option<Value>> {
    match store.get(dataset.as_str())? {
        Some(text) => Ok(Some(decode_local(dataset, &text)?)),
        None => Ok(None),
    }
}

/// Serialize and write a dataset to the local store.
pub fn write_dataset<L: LocalStore + ?Sized>(store: &L, dataset: DatasetName, value: &Value) -> Result<()> {
    store.set(dataset.as_str(), &encode_local(value))
}

/// File-backed store: one `<key>.json` file per entry under a directory.
#[derive(Debug, Clone)]
pub struct FileLocalStore {
    root: PathBuf,
}

impl FileLocalStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory holding the entries.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::Local(format!("invalid key '{}'", key)));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl LocalStore for FileLocalStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.entry_path(key)?) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        // Write beside the target and rename so readers never see half a file.
        let tmp = path.with_extension("json.tmp");
        if let Err(e) = write_synced(&tmp, value) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        fs::rename(&tmp, &path)?;
        sync_dir(&self.root)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.entry_path(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Write a file and flush it to disk before returning.
fn write_synced(path: &Path, contents: &str) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

/// Persist a rename by syncing its directory.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

/// In-memory store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    entries: DashMap<String, String>,
    fail_writes: AtomicBool,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, simulating a full or locked disk.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Local("write refused".to_string()));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocalStore::open(dir.path().join("local")).unwrap();

        assert_eq!(store.get("projects").unwrap(), None);
        store.set("projects", "[1,2]").unwrap();
        assert_eq!(store.get("projects").unwrap().as_deref(), Some("[1,2]"));

        store.set("projects", "[3]").unwrap();
        assert_eq!(store.get("projects").unwrap().as_deref(), Some("[3]"));
        assert_eq!(store.keys().unwrap(), vec!["projects".to_string()]);

        store.remove("projects").unwrap();
        store.remove("projects").unwrap();
        assert_eq!(store.get("projects").unwrap(), None);
    }

    #[test]
    fn file_store_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocalStore::open(dir.path()).unwrap();
        store.set("todos", "[]").unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["todos.json".to_string()]);
    }

    #[test]
    fn failed_write_keeps_previous_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocalStore::open(dir.path()).unwrap();
        store.set("settings", r#"{"theme":"dark"}"#).unwrap();

        // Occupy the temp path so the new contents cannot be written.
        fs::create_dir(dir.path().join("settings.json.tmp")).unwrap();
        assert!(matches!(
            store.set("settings", r#"{"theme":"light"}"#),
            Err(StoreError::Local(_))
        ));
        assert_eq!(
            store.get("settings").unwrap().as_deref(),
            Some(r#"{"theme":"dark"}"#)
        );
    }

    #[test]
    fn synced_write_is_complete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entry.json");
        write_synced(&path, "[1,2,3]").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[1,2,3]");
        sync_dir(dir.path()).unwrap();
    }

    #[test]
    fn file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocalStore::open(dir.path()).unwrap();
        assert!(store.set("../escape", "1").is_err());
        assert!(store.get("").is_err());
    }

    #[test]
    fn dataset_helpers_use_raw_json() {
        let store = MemoryLocalStore::new();
        let value = json!([{"id": 1, "updatedAt": "2024-01-02"}]);
        write_dataset(&store, DatasetName::Conditions, &value).unwrap();

        assert_eq!(
            store.get("conditions").unwrap().as_deref(),
            Some(r#"[{"id":1,"updatedAt":"2024-01-02"}]"#)
        );
        assert_eq!(
            read_dataset(&store, DatasetName::Conditions).unwrap(),
            Some(value)
        );
        assert_eq!(read_dataset(&store, DatasetName::Todos).unwrap(), None);
    }

    #[test]
    fn corrupt_entry_is_an_error() {
        let store = MemoryLocalStore::new();
        store.set("settings", "{not json").unwrap();
        let err = read_dataset(&store, DatasetName::Settings).unwrap_err();
        assert_eq!(err.code(), "invalid-local-value");
    }

    #[test]
    fn memory_store_write_failure() {
        let store = MemoryLocalStore::new();
        store.set_fail_writes(true);
        assert!(matches!(store.set("todos", "[]"), Err(StoreError::Local(_))));
        store.set_fail_writes(false);
        assert!(store.set("todos", "[]").is_ok());
    }
}
