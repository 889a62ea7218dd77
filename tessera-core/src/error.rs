//! Error types for Tessera operations

use crate::EntityId;
use thiserror::Error;

/// Backing store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store not accessible, entity {id} not modified: {reason}")]
    AccessFailed { id: EntityId, reason: String },

    #[error("Store not accessible, records could not be enumerated: {reason}")]
    EnumerationFailed { reason: String },

    #[error("Store I/O failed on {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Malformed record at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Entity <-> record conversion errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SerializationError {
    #[error("Failed to decode record{}: {reason}", fmt_id(.id))]
    DecodeFailed { id: Option<EntityId>, reason: String },

    #[error("Record is missing an integer \"id\" field")]
    MissingId,
}

fn fmt_id(id: &Option<EntityId>) -> String {
    match id {
        Some(id) => format!(" {}", id),
        None => String::new(),
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse config TOML: {reason}")]
    Parse { reason: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Tessera errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl CacheError {
    /// Whether this error means the backing store could not be reached or written.
    pub fn is_store_access(&self) -> bool {
        matches!(
            self,
            CacheError::Store(StoreError::AccessFailed { .. })
                | CacheError::Store(StoreError::EnumerationFailed { .. })
        )
    }
}

/// Result type alias for Tessera operations.
pub type CacheResult<T> = Result<T, CacheError>;

// =============================================================================
// TESTS
// =============================================================================
