//! Test utilities for storage

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::app::models::LibraryEntry;
use crate::app::services::storage::{KeyValueStore, MemoryStore};
use crate::{Error, Result};

mod store_tests;

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
}

pub fn entry(id: &str, name: &str, records: usize, age_days: i64) -> LibraryEntry {
    let mut entry = LibraryEntry::new(id, name, fixed_now() - Duration::days(age_days));
    entry.records = records;
    entry
}

pub fn memory_store() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::new())
}

/// Store pre-seeded with a serialized library
pub fn store_with_entries(entries: &[LibraryEntry]) -> Arc<dyn KeyValueStore> {
    let store = memory_store();
    store
        .set(
            crate::constants::LIBRARY_STORAGE_KEY,
            &serde_json::to_string(entries).unwrap(),
        )
        .unwrap();
    store
}

/// Memory store whose writes fail while `read_only` is set
#[derive(Debug, Default)]
pub struct ReadOnlyStore {
    inner: MemoryStore,
    pub read_only: AtomicBool,
}

impl ReadOnlyStore {
    fn check_writable(&self) -> Result<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(Error::io(
                "Store is read-only",
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ));
        }
        Ok(())
    }
}

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check_writable()?;
        self.inner.remove(key)
    }
}
