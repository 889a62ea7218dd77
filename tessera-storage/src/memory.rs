//! In-memory store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tessera_core::{EntityId, StoreError};

use crate::{Record, Store, StoreOutcome};

/// Thread-safe in-memory store.
///
/// Two switches simulate an unhealthy backend: `set_read_only` makes every
/// mutation fail, and `set_enumeration_failure` makes `fetch_all` fail.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<BTreeMap<EntityId, Record>>,
    read_only: AtomicBool,
    enumeration_broken: AtomicBool,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records. Records without an id are skipped.
    pub fn with_records(records: impl IntoIterator<Item = Record>) -> Self {
        let store = Self::new();
        {
            let mut map = store.records.write();
            for record in records {
                if let Some(id) = record.id() {
                    map.insert(id, record);
                }
            }
        }
        store
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    pub fn set_enumeration_failure(&self, broken: bool) {
        self.enumeration_broken.store(broken, Ordering::SeqCst);
    }

    /// Get count of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// All stored identifiers, ascending.
    pub fn ids(&self) -> Vec<EntityId> {
        self.records.read().keys().copied().collect()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.records.read().contains_key(&id)
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.records.write().clear();
    }

    fn writable(&self) -> Result<(), StoreOutcome> {
        if self.read_only.load(Ordering::SeqCst) {
            Err(StoreOutcome::failure("store is read-only"))
        } else {
            Ok(())
        }
    }
}

fn record_id(record: &Record) -> Result<EntityId, StoreOutcome> {
    record
        .id()
        .ok_or_else(|| StoreOutcome::failure("record has no integer id"))
}

impl Store for InMemoryStore {
    fn fetch_one(&self, id: EntityId) -> Option<Record> {
        self.records.read().get(&id).cloned()
    }

    fn fetch_all(&self) -> Result<Vec<Record>, StoreError> {
        if self.enumeration_broken.load(Ordering::SeqCst) {
            return Err(StoreError::EnumerationFailed {
                reason: "in-memory store enumeration disabled".to_string(),
            });
        }
        Ok(self.records.read().values().cloned().collect())
    }

    fn insert(&self, record: &Record) -> StoreOutcome {
        let id = match record_id(record) {
            Ok(id) => id,
            Err(outcome) => return outcome,
        };
        let mut records = self.records.write();
        if records.contains_key(&id) {
            return StoreOutcome::AlreadyExists;
        }
        if let Err(outcome) = self.writable() {
            return outcome;
        }
        records.insert(id, record.clone());
        StoreOutcome::Success
    }

    fn replace(&self, record: &Record) -> StoreOutcome {
        let id = match record_id(record) {
            Ok(id) => id,
            Err(outcome) => return outcome,
        };
        if let Err(outcome) = self.writable() {
            return outcome;
        }
        match self.records.write().get_mut(&id) {
            Some(slot) => {
                *slot = record.clone();
                StoreOutcome::Success
            }
            None => StoreOutcome::NotFound,
        }
    }

    fn delete(&self, record: &Record) -> StoreOutcome {
        let id = match record_id(record) {
            Ok(id) => id,
            Err(outcome) => return outcome,
        };
        if let Err(outcome) = self.writable() {
            return outcome;
        }
        match self.records.write().remove(&id) {
            Some(_) => StoreOutcome::Success,
            None => StoreOutcome::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: i64, name: &str) -> Record {
        Record::new(json!({"id": id, "name": name}))
    }

    #[test]
    fn test_insert_then_duplicate() {
        let store = InMemoryStore::new();
        assert_eq!(store.insert(&record(1, "a")), StoreOutcome::Success);
        assert_eq!(store.insert(&record(1, "b")), StoreOutcome::AlreadyExists);
        assert_eq!(store.fetch_one(EntityId::new(1)), Some(record(1, "a")));
    }

    #[test]
    fn test_replace_and_delete_missing() {
        let store = InMemoryStore::new();
        assert_eq!(store.replace(&record(9, "x")), StoreOutcome::NotFound);
        assert_eq!(store.delete(&record(9, "x")), StoreOutcome::NotFound);
        assert!(store.is_empty());
    }

    #[test]
    fn test_read_only_rejects_mutations() {
        let store = InMemoryStore::with_records([record(1, "a")]);
        store.set_read_only(true);

        assert!(matches!(store.insert(&record(2, "b")), StoreOutcome::Failure { .. }));
        assert!(matches!(store.replace(&record(1, "z")), StoreOutcome::Failure { .. }));
        assert!(matches!(store.delete(&record(1, "a")), StoreOutcome::Failure { .. }));
        assert_eq!(store.fetch_one(EntityId::new(1)), Some(record(1, "a")));
    }

    #[test]
    fn test_record_without_id_fails() {
        let store = InMemoryStore::new();
        let outcome = store.insert(&Record::new(json!({"name": "anon"})));
        assert!(matches!(outcome, StoreOutcome::Failure { .. }));
    }

    #[test]
    fn test_enumeration_failure_is_distinct_from_empty() {
        let store = InMemoryStore::new();
        assert_eq!(store.fetch_all().unwrap(), Vec::<Record>::new());

        store.set_enumeration_failure(true);
        assert!(matches!(
            store.fetch_all(),
            Err(StoreError::EnumerationFailed { .. })
        ));
    }

    #[test]
    fn test_with_records_skips_records_without_id() {
        let store = InMemoryStore::with_records([record(3, "c"), Record::new(json!({"x": 1}))]);
        assert_eq!(store.ids(), vec![EntityId::new(3)]);
        assert!(store.contains(EntityId::new(3)));
        store.clear();
        assert_eq!(store.len(), 0);
    }
}
