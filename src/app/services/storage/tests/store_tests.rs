//! Tests for key/value backends

use crate::app::services::storage::{JsonFileStore, KeyValueStore, MemoryStore};
use tempfile::TempDir;

#[test]
fn test_json_file_store_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(temp_dir.path().join("nested"));

    assert_eq!(store.get("datasenseLibraryFiles").unwrap(), None);

    store.set("datasenseLibraryFiles", "[]").unwrap();
    assert_eq!(
        store.get("datasenseLibraryFiles").unwrap().as_deref(),
        Some("[]")
    );
    assert!(store.path_for("datasenseLibraryFiles").exists());

    store.set("datasenseLibraryFiles", "[1]").unwrap();
    assert_eq!(
        store.get("datasenseLibraryFiles").unwrap().as_deref(),
        Some("[1]")
    );

    store.remove("datasenseLibraryFiles").unwrap();
    assert_eq!(store.get("datasenseLibraryFiles").unwrap(), None);
    // Removing a missing key is not an error
    store.remove("datasenseLibraryFiles").unwrap();
}

#[test]
fn test_memory_store() {
    let store = MemoryStore::new();
    store.set("k", "v").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    store.remove("k").unwrap();
    assert_eq!(store.get("k").unwrap(), None);
}
