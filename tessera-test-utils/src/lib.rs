//! Tessera Test Utilities
//!
//! Shared test infrastructure for the Tessera workspace:
//! - `Dog` fixture entity and its hand-written serializer
//! - Recording observer for asserting fan-out
//! - Call-counting store wrapper
//! - Proptest generators for entities and operation sequences

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;

// Re-export the types most tests need
pub use tessera_core::{CacheError, CacheMode, Entity, EntityId, Operation, StoreError};
pub use tessera_events::Observer;
pub use tessera_storage::{
    Cache, InMemoryStore, JsonLinesStore, JsonSerializer, Record, Serializer, Store, StoreOutcome,
};

// ============================================================================
// FIXTURE ENTITY
// ============================================================================

/// Sample entity used across the test suites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dog {
    pub id: EntityId,
    pub name: String,
    pub height: i32,
    pub weight: i32,
    pub race: String,
}

impl Dog {
    pub fn new(id: i64, name: &str, height: i32, weight: i32, race: &str) -> Self {
        Self {
            id: EntityId::new(id),
            name: name.to_string(),
            height,
            weight,
            race: race.to_string(),
        }
    }

    /// Same identifier, different attributes.
    pub fn renamed(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }
}

impl Entity for Dog {
    fn id(&self) -> EntityId {
        self.id
    }
}

/// Field-by-field serializer for [`Dog`]; any missing or mistyped field
/// makes decoding fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct DogSerializer;

impl Serializer<Dog> for DogSerializer {
    fn to_record(&self, dog: &Dog) -> Record {
        Record::new(json!({
            "id": dog.id.get(),
            "name": dog.name,
            "height": dog.height,
            "weight": dog.weight,
            "race": dog.race,
        }))
    }

    fn from_record(&self, record: &Record) -> Option<Dog> {
        let value = record.as_value();
        let int_field = |key: &str| -> Option<i32> {
            value.get(key)?.as_i64().and_then(|v| i32::try_from(v).ok())
        };
        Some(Dog {
            id: record.id()?,
            name: value.get("name")?.as_str()?.to_string(),
            height: int_field("height")?,
            weight: int_field("weight")?,
            race: value.get("race")?.as_str()?.to_string(),
        })
    }
}

pub type DogCache<S> = Cache<Dog, S, DogSerializer>;

/// Build a cache of dogs over `store`.
pub fn dog_cache<S: Store>(store: &Arc<S>, mode: CacheMode) -> Result<DogCache<S>, CacheError> {
    Cache::new(Arc::clone(store), mode, Arc::new(DogSerializer))
}

/// In-memory store pre-populated with `dogs`.
pub fn store_with(dogs: &[Dog]) -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::with_records(
        dogs.iter().map(|dog| DogSerializer.to_record(dog)),
    ))
}

// ============================================================================
// OBSERVERS
// ============================================================================

/// Observer that records every event it receives.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<(Operation, Dog)>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<(Operation, Dog)> {
        self.events.lock().clone()
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.events.lock().iter().map(|(op, _)| *op).collect()
    }
}

impl Observer<Dog> for RecordingObserver {
    fn inform(&self, operation: Operation, entity: &Dog) {
        self.events.lock().push((operation, entity.clone()));
    }
}

// ============================================================================
// INSTRUMENTED STORE
// ============================================================================

/// Store wrapper that counts calls per operation.
#[derive(Debug, Default)]
pub struct CountingStore<S> {
    inner: S,
    fetch_one: AtomicUsize,
    fetch_all: AtomicUsize,
    insert: AtomicUsize,
    replace: AtomicUsize,
    delete: AtomicUsize,
}

/// Call counts observed by a [`CountingStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub fetch_one: usize,
    pub fetch_all: usize,
    pub insert: usize,
    pub replace: usize,
    pub delete: usize,
}

impl StoreCalls {
    pub fn mutations(&self) -> usize {
        self.insert + self.replace + self.delete
    }
}

impl<S: Store> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fetch_one: AtomicUsize::new(0),
            fetch_all: AtomicUsize::new(0),
            insert: AtomicUsize::new(0),
            replace: AtomicUsize::new(0),
            delete: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn calls(&self) -> StoreCalls {
        StoreCalls {
            fetch_one: self.fetch_one.load(Ordering::SeqCst),
            fetch_all: self.fetch_all.load(Ordering::SeqCst),
            insert: self.insert.load(Ordering::SeqCst),
            replace: self.replace.load(Ordering::SeqCst),
            delete: self.delete.load(Ordering::SeqCst),
        }
    }
}

impl<S: Store> Store for CountingStore<S> {
    fn fetch_one(&self, id: EntityId) -> Option<Record> {
        self.fetch_one.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_one(id)
    }

    fn fetch_all(&self) -> Result<Vec<Record>, StoreError> {
        self.fetch_all.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_all()
    }

    fn insert(&self, record: &Record) -> StoreOutcome {
        self.insert.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(record)
    }

    fn replace(&self, record: &Record) -> StoreOutcome {
        self.replace.fetch_add(1, Ordering::SeqCst);
        self.inner.replace(record)
    }

    fn delete(&self, record: &Record) -> StoreOutcome {
        self.delete.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(record)
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Tessera fixtures.

    use super::*;
    use proptest::prelude::*;

    /// A single cache call, used to drive random operation sequences.
    #[derive(Debug, Clone)]
    pub enum CacheOp {
        Get(EntityId),
        Add(Dog),
        Update(Dog),
        Remove(Dog),
    }

    /// Generate a dog whose id is drawn from a small range so sequences collide.
    pub fn arb_dog() -> impl Strategy<Value = Dog> {
        (
            0i64..8,
            "[A-Z][a-z]{2,8}",
            1i32..120,
            1i32..90,
            prop::sample::select(vec!["Labrador", "Pincher", "Amstaf", "Beagle"]),
        )
            .prop_map(|(id, name, height, weight, race)| {
                Dog::new(id, &name, height, weight, race)
            })
    }

    pub fn arb_operation() -> impl Strategy<Value = CacheOp> {
        prop_oneof![
            (0i64..8).prop_map(|id| CacheOp::Get(EntityId::new(id))),
            arb_dog().prop_map(CacheOp::Add),
            arb_dog().prop_map(CacheOp::Update),
            arb_dog().prop_map(CacheOp::Remove),
        ]
    }

    pub fn arb_operations(max_len: usize) -> impl Strategy<Value = Vec<CacheOp>> {
        prop::collection::vec(arb_operation(), 0..max_len)
    }
}
