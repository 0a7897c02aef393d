//! Local key-value storage.
//!
//! Stands in for on-device storage. The intake flow only ever needs `get` and `set` by string key,
//! so any backend (in-memory, file, remote) can be injected through [`KeyValueStore`].
//!
//! ## File layout
//!
//! [`FileStore`] keeps one file per key:
//!
//! ```text
//! <store_dir>/
//!   agapay_patient_juan%20dela%20cruz.json
//! ```
//!
//! Bytes outside `[A-Za-z0-9_-]` are percent-encoded so any key maps to a single safe file name.

use crate::{AgapayError, AgapayResult};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// String key to string value storage.
pub trait KeyValueStore: Send + Sync {
    /// Returns `Ok(None)` when the key has never been set.
    fn get(&self, key: &str) -> AgapayResult<Option<String>>;

    /// Replaces any existing value for `key`.
    fn set(&self, key: &str, value: &str) -> AgapayResult<()>;
}

/// Process-local store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> AgapayResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AgapayResult<()> {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Directory-backed store with one file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns `AgapayError::StoreDirCreation` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> AgapayResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(AgapayError::StoreDirCreation)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            encoded.push(byte as char);
        } else {
            // Writing to a String cannot fail.
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> AgapayResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AgapayError::FileRead(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> AgapayResult<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(AgapayError::FileWrite)?;
        fs::rename(&tmp, &path).map_err(AgapayError::FileWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_round_trips_and_overwrites() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn file_store_missing_key_is_none() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::open(temp_dir.path().join("kv")).expect("open should succeed");
        assert_eq!(store.get("agapay_patient_nobody").unwrap(), None);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let dir = temp_dir.path().join("kv");

        FileStore::open(&dir)
            .unwrap()
            .set("agapay_patient_juan dela cruz", "[]")
            .expect("set should succeed");

        let reopened = FileStore::open(&dir).unwrap();
        assert_eq!(
            reopened.get("agapay_patient_juan dela cruz").unwrap().as_deref(),
            Some("[]")
        );
        assert!(dir.join("agapay_patient_juan%20dela%20cruz.json").is_file());
        assert!(!dir.join("agapay_patient_juan%20dela%20cruz.json.tmp").exists());
    }

    #[test]
    fn encode_key_escapes_path_separators() {
        assert_eq!(encode_key("../etc/passwd"), "%2E%2E%2Fetc%2Fpasswd");
        assert_eq!(encode_key("niño"), "ni%C3%B1o");
    }
}
