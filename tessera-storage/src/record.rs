//! Serialized entity form.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessera_core::EntityId;

/// A serialized entity as held by a store.
///
/// Records are JSON objects carrying at least an integer `"id"` field plus
/// whatever attributes the serializer needs to rebuild the entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Value);

impl Record {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The `"id"` field, if present and integral.
    pub fn id(&self) -> Option<EntityId> {
        self.0.get("id").and_then(Value::as_i64).map(EntityId::new)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Single-line JSON text, as written by line-oriented stores.
    pub fn to_line(&self) -> String {
        self.0.to_string()
    }

    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line).map(Self)
    }
}
