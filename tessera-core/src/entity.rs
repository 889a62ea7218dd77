//! Identity types for cached entities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-assigned entity identifier.
///
/// Identifiers are unique within one keyspace and never change once an
/// entity has been handed to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(i64);

impl EntityId {
    /// Wrap a raw integer identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw integer value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for EntityId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl From<EntityId> for i64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A domain value that can live in the cache.
///
/// # Implementation Requirements
///
/// - `id()` must return the same value for the lifetime of the entity
/// - Implementations must be `Clone` since reads hand out owned copies
/// - Implementations must be `Send + Sync + 'static` so the cache can be shared across threads
pub trait Entity: Clone + Send + Sync + 'static {
    /// Get the identifier of this entity.
    fn id(&self) -> EntityId;
}

/// Kind of mutation reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Added,
    Updated,
    Removed,
}

impl Operation {
    /// Upper-case label used in observer log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Added => "ADDED",
            Operation::Updated => "UPDATED",
            Operation::Removed => "REMOVED",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
