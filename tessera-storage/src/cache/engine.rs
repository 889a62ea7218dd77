//! Cache engine: population, read path and mutation protocol.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tessera_core::{
    CacheError, CacheMode, CacheResult, Entity, EntityId, Operation, SerializationError,
    StoreError,
};
use tessera_events::{Observer, ObserverRegistry};

use super::stats::{CacheStats, StatsCounters};
use crate::{Serializer, Store, StoreOutcome};

/// Write-through cache keeping an in-memory map in step with a store.
///
/// # Concurrency
///
/// A `Cache` is shared between threads through `Arc`. Reads never take the
/// mutation lock. Mutations serialize "write store, then update map" under a
/// single lock so no two mutations interleave.
///
/// The fast-path checks (`add` on a cached id, and `update`/`remove` on an
/// uncached id in eager mode) run before the lock is taken. Two callers can
/// both pass the check; the second then gets the store's authoritative
/// `AlreadyExists`/`NotFound` answer inside the lock. This trades a narrow
/// race window for lock-free fast paths.
///
/// Observers run after the lock is released, so the fan-out of two
/// concurrent mutations may interleave in either order.
///
/// # Type Parameters
///
/// - `T`: The cached entity type
/// - `S`: The backing store
/// - `Z`: The serializer between `T` and store records
pub struct Cache<T, S, Z>
where
    T: Entity,
    S: Store,
    Z: Serializer<T>,
{
    mode: CacheMode,
    store: Arc<S>,
    serializer: Arc<Z>,
    entries: DashMap<EntityId, T>,
    write_lock: Mutex<()>,
    observers: ObserverRegistry<T>,
    stats: StatsCounters,
}

impl<T, S, Z> Cache<T, S, Z>
where
    T: Entity,
    S: Store,
    Z: Serializer<T>,
{
    /// Attach a cache to a store.
    ///
    /// In eager mode the whole store is loaded before this returns. Loading
    /// is all-or-nothing: if the store cannot enumerate its records, or any
    /// record fails to decode, construction fails and no cache is produced.
    pub fn new(store: Arc<S>, mode: CacheMode, serializer: Arc<Z>) -> CacheResult<Self> {
        let entries = DashMap::new();
        if mode.is_eager() {
            load_all(store.as_ref(), serializer.as_ref(), &entries)?;
        }
        Ok(Self {
            mode,
            store,
            serializer,
            entries,
            write_lock: Mutex::new(()),
            observers: ObserverRegistry::new(),
            stats: StatsCounters::default(),
        })
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    /// Number of entities currently held in memory.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `id` is held in memory. Never consults the store.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Identifiers currently held in memory, in no particular order.
    pub fn cached_ids(&self) -> Vec<EntityId> {
        self.entries.iter().map(|entry| *entry.key()).collect()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.entries.len())
    }

    /// Get an entity.
    ///
    /// In lazy mode a miss falls through to the store. A failed fetch, an
    /// absent record and an undecodable record all yield `None`.
    pub fn get(&self, id: EntityId) -> Option<T> {
        if let Some(entry) = self.entries.get(&id) {
            self.stats.hit();
            return Some(entry.value().clone());
        }
        self.stats.miss();

        if self.mode.is_eager() {
            tracing::trace!(entity_id = %id, "Eager miss, not in store");
            return None;
        }

        self.stats.store_fetch();
        let record = self.store.fetch_one(id)?;
        let entity = match self.serializer.decode(&record) {
            Ok(entity) => entity,
            Err(e) => {
                tracing::debug!(entity_id = %id, error = %e, "Fetched record did not decode");
                return None;
            }
        };
        if entity.id() != id {
            tracing::debug!(
                entity_id = %id,
                record_id = %entity.id(),
                "Fetched record carries a different id"
            );
            return None;
        }

        tracing::debug!(entity_id = %id, "Lazy fetch populated cache");
        // Keep a value a concurrent mutation may have written meanwhile.
        let cached = self.entries.entry(id).or_insert(entity);
        Some(cached.value().clone())
    }

    /// Add a new entity.
    ///
    /// Returns `Ok(true)` when the store accepted it, `Ok(false)` when the
    /// identifier already exists, and `Err` when the store failed.
    pub fn add(&self, entity: T) -> CacheResult<bool> {
        let id = entity.id();
        if self.entries.contains_key(&id) {
            tracing::debug!(entity_id = %id, "Add skipped, already cached");
            return Ok(false);
        }

        let record = self.serializer.to_record(&entity);
        let guard = self.write_lock.lock();
        match self.store.insert(&record) {
            StoreOutcome::Success => {
                self.entries.insert(id, entity.clone());
                drop(guard);
                self.observers.notify(Operation::Added, &entity);
                Ok(true)
            }
            StoreOutcome::AlreadyExists => {
                if self.mode.is_lazy() {
                    tracing::debug!(entity_id = %id, "Store already had entity, backfilling");
                    self.entries.insert(id, entity);
                    self.stats.backfill();
                }
                drop(guard);
                Ok(false)
            }
            StoreOutcome::Failure { reason } => {
                drop(guard);
                Err(self.access_failed(Operation::Added, id, reason))
            }
            StoreOutcome::NotFound => {
                drop(guard);
                Err(self.access_failed(
                    Operation::Added,
                    id,
                    "store answered not-found to an insert".to_string(),
                ))
            }
        }
    }

    /// Replace an existing entity.
    ///
    /// Returns `Ok(true)` on success, `Ok(false)` when the identifier is not
    /// in the store, and `Err` when the store failed.
    pub fn update(&self, entity: T) -> CacheResult<bool> {
        let id = entity.id();
        if self.mode.is_eager() && !self.entries.contains_key(&id) {
            tracing::debug!(entity_id = %id, "Update skipped, not in eager mirror");
            return Ok(false);
        }

        let record = self.serializer.to_record(&entity);
        let guard = self.write_lock.lock();
        match self.store.replace(&record) {
            StoreOutcome::Success => {
                self.entries.insert(id, entity.clone());
                drop(guard);
                self.observers.notify(Operation::Updated, &entity);
                Ok(true)
            }
            StoreOutcome::NotFound => {
                drop(guard);
                Ok(false)
            }
            StoreOutcome::Failure { reason } => {
                drop(guard);
                Err(self.access_failed(Operation::Updated, id, reason))
            }
            StoreOutcome::AlreadyExists => {
                drop(guard);
                Err(self.access_failed(
                    Operation::Updated,
                    id,
                    "store answered already-exists to a replace".to_string(),
                ))
            }
        }
    }

    /// Remove an entity.
    ///
    /// Returns `Ok(true)` on success, `Ok(false)` when the identifier is not
    /// in the store, and `Err` when the store failed.
    pub fn remove(&self, entity: &T) -> CacheResult<bool> {
        let id = entity.id();
        if self.mode.is_eager() && !self.entries.contains_key(&id) {
            tracing::debug!(entity_id = %id, "Remove skipped, not in eager mirror");
            return Ok(false);
        }

        let record = self.serializer.to_record(entity);
        let guard = self.write_lock.lock();
        match self.store.delete(&record) {
            StoreOutcome::Success => {
                self.entries.remove(&id);
                drop(guard);
                self.observers.notify(Operation::Removed, entity);
                Ok(true)
            }
            StoreOutcome::NotFound => {
                drop(guard);
                Ok(false)
            }
            StoreOutcome::Failure { reason } => {
                drop(guard);
                Err(self.access_failed(Operation::Removed, id, reason))
            }
            StoreOutcome::AlreadyExists => {
                drop(guard);
                Err(self.access_failed(
                    Operation::Removed,
                    id,
                    "store answered already-exists to a delete".to_string(),
                ))
            }
        }
    }

    /// Register an observer. Observers are notified in registration order.
    pub fn register(&self, observer: Arc<dyn Observer<T>>) {
        self.observers.register(observer);
    }

    /// Unregister one registration of `observer`, matched by pointer.
    pub fn unregister(&self, observer: &Arc<dyn Observer<T>>) -> bool {
        self.observers.unregister(observer)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn access_failed(&self, operation: Operation, id: EntityId, reason: String) -> CacheError {
        self.stats.store_failure();
        tracing::warn!(
            entity_id = %id,
            operation = %operation,
            reason = %reason,
            "Store mutation failed, cache unchanged"
        );
        CacheError::Store(StoreError::AccessFailed { id, reason })
    }
}

/// Load every record into `entries`, or nothing at all.
fn load_all<T, S, Z>(store: &S, serializer: &Z, entries: &DashMap<EntityId, T>) -> CacheResult<()>
where
    T: Entity,
    S: Store,
    Z: Serializer<T>,
{
    let records = store.fetch_all().map_err(|e| {
        tracing::error!(error = %e, "Eager load aborted, store not accessible");
        match e {
            StoreError::EnumerationFailed { .. } => e,
            other => StoreError::EnumerationFailed {
                reason: other.to_string(),
            },
        }
    })?;

    for record in &records {
        let entity = serializer.decode(record).map_err(|e| {
            tracing::error!(error = %e, "Eager load aborted, record did not decode");
            e
        })?;
        if let Some(record_id) = record.id() {
            if record_id != entity.id() {
                tracing::error!(
                    record_id = %record_id,
                    entity_id = %entity.id(),
                    "Eager load aborted, decoded entity id differs from record id"
                );
                return Err(SerializationError::DecodeFailed {
                    id: Some(record_id),
                    reason: format!("decoded entity has id {}", entity.id()),
                }
                .into());
            }
        }
        if entries.insert(entity.id(), entity).is_some() {
            tracing::warn!(
                entity_id = ?record.id(),
                "Store holds duplicate records for one id, keeping the last"
            );
        }
    }

    tracing::info!(count = entries.len(), mode = "eager", "Loaded all records from store");
    Ok(())
}

impl<T, S, Z> fmt::Debug for Cache<T, S, Z>
where
    T: Entity,
    S: Store,
    Z: Serializer<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("mode", &self.mode)
            .field("entries", &self.entries.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}
