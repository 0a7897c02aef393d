//! Per-patient assessment history.
//!
//! Each patient's records are stored under a single key derived from their name:
//! `agapay_patient_<lower-cased, trimmed name>`. The value is a JSON array of
//! [`PatientRecord`], newest first.
//!
//! Identity is the name alone. Two different people with the same name share one history; this
//! is logged when it looks likely but is not resolved here.
//!
//! Appends are serialised per [`PatientHistory`] (and its clones), so concurrent writers sharing
//! one handle never overwrite each other's records.

use crate::constants::PATIENT_KEY_PREFIX;
use crate::store::KeyValueStore;
use crate::{AgapayError, AgapayResult};
use agapay_types::PatientRecord;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Storage key for a patient's history. Case and surrounding whitespace are ignored.
pub fn patient_storage_key(name: &str) -> String {
    format!("{PATIENT_KEY_PREFIX}{}", name.trim().to_lowercase())
}

#[derive(Clone)]
pub struct PatientHistory {
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl PatientHistory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Stored records for `name`, newest first.
    ///
    /// A missing key, an unreadable value, or malformed JSON all yield an empty history.
    pub fn load(&self, name: &str) -> Vec<PatientRecord> {
        let key = patient_storage_key(name);
        match self.try_load(&key) {
            Ok(records) => records,
            Err(e) => {
                warn!("ignoring unreadable history for {}: {}", key, e);
                Vec::new()
            }
        }
    }

    fn try_load(&self, key: &str) -> AgapayResult<Vec<PatientRecord>> {
        match self.store.get(key)? {
            Some(raw) => serde_json::from_str(&raw).map_err(AgapayError::Deserialization),
            None => Ok(Vec::new()),
        }
    }

    /// Prepend `record` to its patient's history and persist the result.
    ///
    /// Returns the updated history, newest first.
    ///
    /// # Errors
    ///
    /// Returns a store read error or `AgapayError::Deserialization` if the current history
    /// cannot be read, and `AgapayError::Serialization` or a store write error if it cannot be
    /// written. The stored history is unchanged on error.
    pub fn append(&self, record: PatientRecord) -> AgapayResult<Vec<PatientRecord>> {
        let key = patient_storage_key(&record.name);
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let existing = self.try_load(&key)?;

        if let Some(newest) = existing.first() {
            if newest.gender != record.gender || newest.age.abs_diff(record.age) > 1 {
                warn!(
                    "possible name collision for {}: stored patient is {} aged {}, new record is {} aged {}",
                    key, newest.gender, newest.age, record.gender, record.age
                );
            } else {
                debug!("appending to {} ({} existing records)", key, existing.len());
            }
        }

        let mut history = Vec::with_capacity(existing.len() + 1);
        history.push(record);
        history.extend(existing);

        let raw = serde_json::to_string(&history).map_err(AgapayError::Serialization)?;
        self.store.set(&key, &raw)?;
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FileStore, MemoryStore};
    use agapay_types::{ClinicalAssessment, Gender, RecordId, Vitals};
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Memory store whose reads can be made to fail or stall.
    #[derive(Default)]
    struct UnreliableStore {
        inner: MemoryStore,
        fail_reads: AtomicBool,
        read_delay: Option<Duration>,
    }

    impl KeyValueStore for UnreliableStore {
        fn get(&self, key: &str) -> AgapayResult<Option<String>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(AgapayError::FileRead(std::io::Error::other("disk unavailable")));
            }
            if let Some(delay) = self.read_delay {
                thread::sleep(delay);
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> AgapayResult<()> {
            self.inner.set(key, value)
        }
    }

    fn record(name: &str, last: Option<&RecordId>) -> PatientRecord {
        PatientRecord {
            id: RecordId::generate(last),
            name: name.to_string(),
            age: 45,
            gender: Gender::M,
            barangay: "San Jose".into(),
            symptoms: vec!["fever".into()],
            vitals: Vitals::default(),
            assessment: Some(ClinicalAssessment::fallback()),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn key_ignores_case_and_padding() {
        assert_eq!(
            patient_storage_key("Juan Dela Cruz"),
            patient_storage_key(" juan dela cruz ")
        );
        assert_eq!(
            patient_storage_key("Juan Dela Cruz"),
            "agapay_patient_juan dela cruz"
        );
    }

    #[test]
    fn append_puts_newest_first() {
        let history = PatientHistory::new(Arc::new(MemoryStore::new()));

        let first = record("Juan Dela Cruz", None);
        history.append(first.clone()).expect("first append should succeed");
        let before = history.load("Juan Dela Cruz").len();

        let second = record(" juan dela cruz ", Some(&first.id));
        history.append(second.clone()).expect("second append should succeed");

        let stored = history.load("JUAN DELA CRUZ");
        assert_eq!(stored.len(), before + 1);
        assert_eq!(stored[0].id, second.id);
        assert_eq!(stored[1].id, first.id);
    }

    #[test]
    fn malformed_value_loads_as_empty() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(&patient_storage_key("Maria"), "{not json")
            .unwrap();
        let history = PatientHistory::new(store);
        assert!(history.load("Maria").is_empty());
    }

    #[test]
    fn histories_are_per_name() {
        let history = PatientHistory::new(Arc::new(MemoryStore::new()));
        history.append(record("Maria Clara", None)).unwrap();
        assert!(history.load("Jose Rizal").is_empty());
        assert_eq!(history.load("maria clara").len(), 1);
    }

    #[test]
    fn file_backed_history_survives_reopen() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let dir = temp_dir.path().join("kv");

        let history = PatientHistory::new(Arc::new(FileStore::open(&dir).unwrap()));
        let first = record("Juan Dela Cruz", None);
        history.append(first.clone()).unwrap();

        let reopened = PatientHistory::new(Arc::new(FileStore::open(&dir).unwrap()));
        let stored = reopened.load("juan dela cruz");
        assert_eq!(stored, vec![first]);
    }

    #[test]
    fn append_refuses_to_overwrite_unreadable_history() {
        let store = Arc::new(UnreliableStore::default());
        let history = PatientHistory::new(store.clone());

        let first = record("Juan Dela Cruz", None);
        let second = record("Juan Dela Cruz", Some(&first.id));
        history.append(first.clone()).unwrap();
        history.append(second.clone()).unwrap();

        store.fail_reads.store(true, Ordering::SeqCst);
        let third = record("Juan Dela Cruz", Some(&second.id));
        let result = history.append(third.clone());
        assert!(matches!(result, Err(AgapayError::FileRead(_))));
        assert!(history.load("Juan Dela Cruz").is_empty());

        store.fail_reads.store(false, Ordering::SeqCst);
        let stored = history.load("Juan Dela Cruz");
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].id, second.id);

        history.append(third.clone()).unwrap();
        assert_eq!(history.load("Juan Dela Cruz").len(), 3);
    }

    #[test]
    fn concurrent_appends_keep_every_record() {
        let store = Arc::new(UnreliableStore {
            read_delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let history = PatientHistory::new(store);

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let history = history.clone();
                thread::spawn(move || history.append(record("Maria Clara", None)))
            })
            .collect();
        for handle in handles {
            handle
                .join()
                .expect("append thread should not panic")
                .expect("append should succeed");
        }

        assert_eq!(history.load("maria clara").len(), 2);
    }
}
