//! Tessera Core - Shared Types
//!
//! Identity, cache modes, mutation kinds, errors and configuration.
//! Every other Tessera crate depends on this one. No caching logic lives here.

pub mod config;
pub mod entity;
pub mod error;
pub mod mode;

pub use config::CacheConfig;
pub use entity::{Entity, EntityId, Operation};
pub use error::{CacheError, CacheResult, ConfigError, SerializationError, StoreError};
pub use mode::{CacheMode, CacheModeParseError};
