//! The persisted entry collection.
//!
//! Entries live in memory and are written back as one JSON array after
//! every mutation.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::{KeyValueStore, StorageError};
use crate::ingest::{merge_into_store, DedupPolicy};
use crate::models::TimeEntry;

/// Default key of the entry collection.
pub const DEFAULT_ENTRIES_KEY: &str = "timeEntries";

/// Outcome of the most recent import. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub at: DateTime<Utc>,
    pub added: usize,
    pub skipped: usize,
    pub total: usize,
}

pub struct EntryStore<S> {
    backend: S,
    key: String,
    entries: Vec<TimeEntry>,
    last_import: Option<ImportSummary>,
}

impl<S: KeyValueStore> EntryStore<S> {
    /// Load the collection stored under `key`. A missing value opens an
    /// empty store; so does a value that is not a valid entry array, which
    /// is logged and replaced on the next write.
    pub fn open(backend: S, key: impl Into<String>) -> Result<Self, StorageError> {
        let key = key.into();
        let entries = match backend.get(&key)? {
            None => Vec::new(),
            Some(text) => match serde_json::from_str::<Vec<TimeEntry>>(&text) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Stored entries under '{}' are unreadable, starting empty: {}", key, e);
                    Vec::new()
                }
            },
        };

        debug!("Opened entry store '{}' with {} entries", key, entries.len());
        Ok(Self {
            backend,
            key,
            entries,
            last_import: None,
        })
    }

    pub fn entries(&self) -> &[TimeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TimeEntry> {
        self.entries.iter().find(|e| e.id.as_str() == id)
    }

    pub fn last_import(&self) -> Option<&ImportSummary> {
        self.last_import.as_ref()
    }

    pub fn unbilled_entries(&self) -> Vec<&TimeEntry> {
        self.entries.iter().filter(|e| !e.billed).collect()
    }

    /// Merge imported entries and persist the result.
    pub fn import(
        &mut self,
        imported: Vec<TimeEntry>,
        policy: DedupPolicy,
    ) -> Result<ImportSummary, StorageError> {
        let outcome = merge_into_store(std::mem::take(&mut self.entries), imported, policy);
        self.entries = outcome.entries;

        let summary = ImportSummary {
            at: Utc::now(),
            added: outcome.added,
            skipped: outcome.skipped,
            total: self.entries.len(),
        };
        self.last_import = Some(summary);

        self.persist()?;
        Ok(summary)
    }

    pub fn add(&mut self, entry: TimeEntry) -> Result<(), StorageError> {
        debug!("Adding entry {}", entry.id);
        self.entries.push(entry);
        self.persist()
    }

    /// Replace the stored entry with the same id.
    pub fn update(&mut self, entry: TimeEntry) -> Result<(), StorageError> {
        let slot = self
            .entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| StorageError::EntryNotFound(entry.id.to_string()))?;
        *slot = entry;
        self.persist()
    }

    pub fn delete(&mut self, id: &str) -> Result<TimeEntry, StorageError> {
        let index = self.position(id)?;
        let removed = self.entries.remove(index);
        self.persist()?;
        info!("Deleted entry {}", id);
        Ok(removed)
    }

    /// Flip the billed flag. Returns the new value.
    pub fn toggle_billed(&mut self, id: &str) -> Result<bool, StorageError> {
        let index = self.position(id)?;
        let entry = &mut self.entries[index];
        entry.billed = !entry.billed;
        let billed = entry.billed;
        self.persist()?;
        Ok(billed)
    }

    /// Drop every entry and the stored value.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        let count = self.entries.len();
        self.entries.clear();
        self.last_import = None;
        self.backend.remove(&self.key)?;
        info!("Cleared {} entries from '{}'", count, self.key);
        Ok(())
    }

    /// Write the whole collection to the backend.
    pub fn persist(&mut self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.entries)?;
        self.backend.set(&self.key, &json)?;
        debug!("Persisted {} entries under '{}'", self.entries.len(), self.key);
        Ok(())
    }

    pub fn into_backend(self) -> S {
        self.backend
    }

    fn position(&self, id: &str) -> Result<usize, StorageError> {
        self.entries
            .iter()
            .position(|e| e.id.as_str() == id)
            .ok_or_else(|| StorageError::EntryNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntrySource;
    use crate::storage::{FileStore, MemoryStore, StorageConfig};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn entry(member: &str, duration: &str) -> TimeEntry {
        TimeEntry::new(
            member.to_string(),
            "ACME".to_string(),
            "Fibu".to_string(),
            NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            duration.to_string(),
            EntrySource::CsvImport,
        )
    }

    fn memory_store() -> EntryStore<MemoryStore> {
        EntryStore::open(MemoryStore::new(), DEFAULT_ENTRIES_KEY).unwrap()
    }

    #[test]
    fn test_open_empty() {
        let store = memory_store();
        assert!(store.is_empty());
        assert!(store.last_import().is_none());
    }

    #[test]
    fn test_open_corrupt_value_starts_empty() {
        let mut backend = MemoryStore::new();
        backend.set(DEFAULT_ENTRIES_KEY, "{not json").unwrap();
        let store = EntryStore::open(backend, DEFAULT_ENTRIES_KEY).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_persists_and_reopens() {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig::new(dir.path().to_path_buf());

        let mut store = EntryStore::open(FileStore::new(config.clone()), "timeEntries").unwrap();
        let alice = entry("Alice", "1h 0m 0s");
        store.add(alice.clone()).unwrap();

        let reopened = EntryStore::open(FileStore::new(config), "timeEntries").unwrap();
        assert_eq!(reopened.entries(), &[alice]);
    }

    #[test]
    fn test_import_twice_doubles_rows() {
        let mut store = memory_store();
        let summary = store
            .import(vec![entry("Alice", "1h"), entry("Bob", "2h")], DedupPolicy::ById)
            .unwrap();
        assert_eq!(summary.added, 2);

        let summary = store
            .import(vec![entry("Alice", "1h"), entry("Bob", "2h")], DedupPolicy::ById)
            .unwrap();
        assert_eq!(summary.total, 4);
        assert_eq!(store.len(), 4);
        assert_eq!(store.last_import().unwrap().added, 2);
    }

    #[test]
    fn test_update_and_unknown_id() {
        let mut store = memory_store();
        let mut alice = entry("Alice", "1h");
        store.add(alice.clone()).unwrap();

        alice.notes = "geändert".to_string();
        store.update(alice.clone()).unwrap();
        assert_eq!(store.get(alice.id.as_str()).unwrap().notes, "geändert");

        let stranger = entry("Mallory", "1h");
        assert!(matches!(
            store.update(stranger),
            Err(StorageError::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_delete() {
        let mut store = memory_store();
        let alice = entry("Alice", "1h");
        let bob = entry("Bob", "1h");
        store.add(alice.clone()).unwrap();
        store.add(bob.clone()).unwrap();

        let removed = store.delete(alice.id.as_str()).unwrap();
        assert_eq!(removed.team_member, "Alice");
        assert_eq!(store.entries(), &[bob]);
        assert!(matches!(
            store.delete("missing"),
            Err(StorageError::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_toggle_billed_and_unbilled_filter() {
        let mut store = memory_store();
        let alice = entry("Alice", "1h");
        store.add(alice.clone()).unwrap();
        store.add(entry("Bob", "1h")).unwrap();

        assert!(store.toggle_billed(alice.id.as_str()).unwrap());
        let unbilled: Vec<&str> = store
            .unbilled_entries()
            .iter()
            .map(|e| e.team_member.as_str())
            .collect();
        assert_eq!(unbilled, vec!["Bob"]);

        assert!(!store.toggle_billed(alice.id.as_str()).unwrap());
        assert_eq!(store.unbilled_entries().len(), 2);
    }

    #[test]
    fn test_clear_removes_stored_value() {
        let mut store = memory_store();
        store.add(entry("Alice", "1h")).unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());

        let backend = store.into_backend();
        assert_eq!(backend.get(DEFAULT_ENTRIES_KEY).unwrap(), None);
    }
}
