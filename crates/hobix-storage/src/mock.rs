//! Mock storage implementation for testing.
//!
//! Provides [`MockStorage`] for unit testing without filesystem access.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::entry::{Entry, EntryId, sort_entries};
use crate::storage::{Storage, StorageError, in_listing};

/// Backend identifier for error messages.
const BACKEND: &str = "Mock";

/// Mock storage for testing.
///
/// Stores entries in memory. Use the builder methods to configure the mock with
/// test data.
///
/// # Example
///
/// ```ignore
/// use hobix_storage::{Entry, EntryId, MockStorage, Storage};
///
/// let storage = MockStorage::new().with_entry(Entry::new(id, created));
/// let entries = storage.list("", true).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MockStorage {
    entries: RwLock<BTreeMap<EntryId, Entry>>,
}

impl MockStorage {
    /// Create a new empty mock storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, keyed by its own id.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_entry(self, entry: Entry) -> Self {
        self.entries
            .write()
            .unwrap()
            .insert(entry.id.clone(), entry);
        self
    }

    /// Number of stored entries.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MockStorage {
    fn load(&self, id: &EntryId) -> Result<Entry, StorageError> {
        self.entries
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::not_found(id).with_backend(BACKEND))
    }

    fn save(&self, id: &EntryId, entry: &Entry) -> Result<(), StorageError> {
        let mut stored = entry.clone();
        stored.id = id.clone();
        self.entries.write().unwrap().insert(id.clone(), stored);
        Ok(())
    }

    fn list(&self, prefix: &str, recursive: bool) -> Result<Vec<Entry>, StorageError> {
        let mut entries: Vec<Entry> = self
            .entries
            .read()
            .unwrap()
            .values()
            .filter(|entry| in_listing(&entry.id, prefix, recursive))
            .cloned()
            .collect();
        sort_entries(&mut entries);
        Ok(entries)
    }

    fn delete(&self, id: &EntryId) -> Result<(), StorageError> {
        self.entries.write().unwrap().remove(id);
        Ok(())
    }
}
