//! Tessera Storage - Store Contract and Cache Engine
//!
//! Defines the store and serializer contracts, two reference stores, and
//! the write-through cache built on top of them.

pub mod cache;
pub mod json_file;
pub mod memory;
pub mod record;
pub mod serializer;
pub mod store;

pub use cache::{Cache, CacheStats};
pub use json_file::JsonLinesStore;
pub use memory::InMemoryStore;
pub use record::Record;
pub use serializer::{JsonSerializer, Serializer};
pub use store::{Store, StoreOutcome};

// Re-export core and event types so callers need a single dependency.
pub use tessera_core::{
    CacheConfig, CacheError, CacheMode, CacheResult, Entity, EntityId, Operation,
    SerializationError, StoreError,
};
pub use tessera_events::{CacheEvent, ChannelObserver, LoggingObserver, Observer};
