//! Library index of dataset snapshots
//!
//! Entries are kept in insertion order. Duplicates are detected by
//! (name, record count) rather than by id. Every mutation is written to the
//! store first; a failed write leaves the in-memory index unchanged.

use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::store::KeyValueStore;
use crate::app::models::{LibraryEntry, LibrarySource, utc_timestamp};
use crate::app::services::backend_client::BackendFile;
use crate::constants::{LIBRARY_RETENTION_MONTHS, LIBRARY_STORAGE_KEY};
use crate::{Error, Result};

/// Retention summary of the library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub total_entries: usize,
    pub old_entries: usize,
    pub total_records: usize,
    pub old_records: usize,
    /// Whether a cleanup pass would remove anything
    pub will_be_cleaned: bool,
}

/// Persisted, write-through library index
#[derive(Debug)]
pub struct LibraryIndex {
    store: Arc<dyn KeyValueStore>,
    entries: Vec<LibraryEntry>,
}

/// Oldest date kept at `now`: one calendar year back
fn retention_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(LIBRARY_RETENTION_MONTHS))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl LibraryIndex {
    /// Load the index and purge entries older than the retention period
    ///
    /// Malformed JSON yields an empty index and is logged; the stored value
    /// is not deleted. The store is only rewritten when entries were purged.
    pub fn load(store: Arc<dyn KeyValueStore>, now: DateTime<Utc>) -> Result<Self> {
        let entries = match store.get(LIBRARY_STORAGE_KEY)? {
            Some(json) => match serde_json::from_str::<Vec<LibraryEntry>>(&json) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Ignoring malformed library index: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let mut index = Self { store, entries };
        let purged = index.cleanup(now)?;
        if purged > 0 {
            info!("Auto-cleanup: removed {} library entries older than one year", purged);
        }
        debug!("Library loaded with {} entries", index.entries.len());
        Ok(index)
    }

    /// An empty index over the given store
    pub fn empty(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            entries: Vec::new(),
        }
    }

    /// Write `next` to the store, then make it the in-memory state
    fn commit(&mut self, next: Vec<LibraryEntry>) -> Result<()> {
        let json = serde_json::to_string(&next)
            .map_err(|e| Error::serialization("Library index encoding", e))?;
        self.store.set(LIBRARY_STORAGE_KEY, &json)?;
        self.entries = next;
        Ok(())
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| Error::library_entry_not_found(id))
    }

    /// Add an entry, or update an existing one with the same name and
    /// record count
    ///
    /// An update replaces every field except the id. Returns the id of the
    /// stored entry.
    pub fn add(&mut self, entry: LibraryEntry) -> Result<String> {
        let mut next = self.entries.clone();
        let duplicate = next
            .iter()
            .position(|existing| existing.name == entry.name && existing.records == entry.records);

        let id = match duplicate {
            Some(position) => {
                info!("Duplicate library entry {}, updating existing", entry.name);
                let id = next[position].id.clone();
                next[position] = LibraryEntry { id: id.clone(), ..entry };
                id
            }
            None => {
                let id = entry.id.clone();
                next.push(entry);
                id
            }
        };

        self.commit(next)?;
        Ok(id)
    }

    /// Remove an entry by id
    pub fn remove(&mut self, id: &str) -> Result<LibraryEntry> {
        let position = self.position(id)?;
        let mut next = self.entries.clone();
        let entry = next.remove(position);
        self.commit(next)?;
        Ok(entry)
    }

    /// Add a tag; an exact duplicate tag is not added twice
    pub fn add_tag(&mut self, id: &str, tag: &str) -> Result<()> {
        let position = self.position(id)?;
        let mut next = self.entries.clone();
        if !next[position].has_tag(tag) {
            next[position].tags.push(tag.to_string());
        }
        self.commit(next)
    }

    /// Remove every exact occurrence of a tag
    pub fn remove_tag(&mut self, id: &str, tag: &str) -> Result<()> {
        let position = self.position(id)?;
        let mut next = self.entries.clone();
        next[position].tags.retain(|t| t != tag);
        self.commit(next)
    }

    pub fn get(&self, id: &str) -> Option<&LibraryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose name or any tag contains `search` (case-insensitive)
    /// and that carry every selected tag (exact match)
    pub fn filter(&self, search: &str, selected_tags: &[String]) -> Vec<&LibraryEntry> {
        let needle = search.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|entry| {
                needle.is_empty()
                    || entry.name.to_lowercase().contains(&needle)
                    || entry.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .filter(|entry| selected_tags.iter().all(|tag| entry.has_tag(tag)))
            .collect()
    }

    /// Sorted set of every tag in use
    pub fn available_tags(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|entry| entry.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn storage_stats(&self, now: DateTime<Utc>) -> StorageStats {
        let cutoff = retention_cutoff(now);
        let (old, _): (Vec<&LibraryEntry>, Vec<&LibraryEntry>) =
            self.entries.iter().partition(|entry| entry.date < cutoff);

        StorageStats {
            total_entries: self.entries.len(),
            old_entries: old.len(),
            total_records: self.entries.iter().map(|e| e.records).sum(),
            old_records: old.iter().map(|e| e.records).sum(),
            will_be_cleaned: !old.is_empty(),
        }
    }

    /// Run the retention purge on demand; returns the number of removed entries
    pub fn cleanup(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = retention_cutoff(now);
        let (kept, purged): (Vec<LibraryEntry>, Vec<LibraryEntry>) = self
            .entries
            .iter()
            .cloned()
            .partition(|entry| entry.date >= cutoff);

        if purged.is_empty() {
            return Ok(0);
        }
        for entry in &purged {
            info!("Purging old library entry: {} ({})", entry.name, entry.date.date_naive());
        }
        self.commit(kept)?;
        Ok(purged.len())
    }

    /// Merge backend file metadata into the index
    ///
    /// A local entry with the same name and record count is marked merged
    /// instead of duplicated. Other files become backend entries with id
    /// `backend-<filename>`, replacing any previous entry with that id.
    pub fn merge_backend_files(&mut self, files: &[BackendFile], now: DateTime<Utc>) -> Result<()> {
        let mut next = self.entries.clone();
        for file in files {
            let id = format!("backend-{}", file.filename);

            if let Some(existing) = next.iter_mut().find(|entry| {
                entry.id != id && entry.name == file.filename && entry.records == file.records_added
            }) {
                debug!("Merging backend file {} into local entry", file.filename);
                existing.source = LibrarySource::Merged;
                existing.date = now;
                existing.processing_date = file.processing_date.clone();
                continue;
            }

            let date = file
                .timestamp
                .as_deref()
                .and_then(utc_timestamp::parse)
                .unwrap_or(now);
            let mut entry = LibraryEntry::new(id.clone(), file.filename.clone(), date);
            entry.records = file.records_added;
            entry.size = Some(file.file_size);
            entry.processing_date = file.processing_date.clone();
            entry.status = file.status.clone();
            entry.source = LibrarySource::Backend;

            match next.iter().position(|existing| existing.id == id) {
                Some(position) => {
                    entry.tags = std::mem::take(&mut next[position].tags);
                    next[position] = entry;
                }
                None => next.push(entry),
            }
        }

        self.commit(next)
    }
}
