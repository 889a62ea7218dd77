//! Write-through cache over a pluggable store.
//!
//! The cache keeps an in-memory map of entities in step with a [`Store`].
//! Two population modes are supported:
//!
//! - [`CacheMode::Eager`]: the whole store is loaded at construction and the
//!   map mirrors it from then on. A map miss is definitive.
//! - [`CacheMode::Lazy`]: entries are fetched on first access. A map miss
//!   means nothing until the store has been asked.
//!
//! Every mutation writes the store first and applies the same change to the
//! map under one lock, then notifies observers once the lock is released.
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(JsonLinesStore::open("dogs.jsonl")?);
//! let cache = Cache::new(store, CacheMode::Eager, Arc::new(JsonSerializer::<Dog>::new()))?;
//!
//! cache.register(Arc::new(LoggingObserver::new("User A")));
//! assert!(cache.add(dog.clone())?);
//! assert_eq!(cache.get(dog.id()), Some(dog));
//! ```
//!
//! [`Store`]: crate::Store
//! [`CacheMode::Eager`]: tessera_core::CacheMode::Eager
//! [`CacheMode::Lazy`]: tessera_core::CacheMode::Lazy

pub mod engine;
pub mod stats;

pub use engine::Cache;
pub use stats::CacheStats;
