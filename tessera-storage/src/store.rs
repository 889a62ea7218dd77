//! Backing store contract.

use std::sync::Arc;

use tessera_core::{EntityId, StoreError};

use crate::Record;

/// Result of a store mutation.
///
/// `AlreadyExists` and `NotFound` are ordinary answers, not failures.
/// `Failure` means the store could not complete the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    Success,
    Failure { reason: String },
    AlreadyExists,
    NotFound,
}

impl StoreOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        StoreOutcome::Failure {
            reason: reason.into(),
        }
    }
}

/// Pluggable persistent store holding the authoritative record set.
///
/// Implementations must be thread-safe; a cache calls mutators one at a
/// time but may call `fetch_one` concurrently with them.
pub trait Store: Send + Sync {
    /// Fetch a single record.
    ///
    /// Returns `None` both when the record is absent and when the store
    /// could not be read.
    fn fetch_one(&self, id: EntityId) -> Option<Record>;

    /// Fetch every record.
    ///
    /// Must return `Err` when enumeration fails so an empty store is never
    /// confused with an unreachable one.
    fn fetch_all(&self) -> Result<Vec<Record>, StoreError>;

    /// Insert a new record: `Success`, `Failure` or `AlreadyExists`.
    fn insert(&self, record: &Record) -> StoreOutcome;

    /// Replace an existing record: `Success`, `Failure` or `NotFound`.
    fn replace(&self, record: &Record) -> StoreOutcome;

    /// Delete a record: `Success`, `Failure` or `NotFound`.
    fn delete(&self, record: &Record) -> StoreOutcome;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn fetch_one(&self, id: EntityId) -> Option<Record> {
        (**self).fetch_one(id)
    }

    fn fetch_all(&self) -> Result<Vec<Record>, StoreError> {
        (**self).fetch_all()
    }

    fn insert(&self, record: &Record) -> StoreOutcome {
        (**self).insert(record)
    }

    fn replace(&self, record: &Record) -> StoreOutcome {
        (**self).replace(record)
    }

    fn delete(&self, record: &Record) -> StoreOutcome {
        (**self).delete(record)
    }
}
