//! Entity <-> record mapping.

use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tessera_core::{Entity, SerializationError};

use crate::Record;

/// Bidirectional mapping between an entity and its stored record.
pub trait Serializer<T>: Send + Sync {
    /// Encode an entity. Always succeeds for a well-formed entity.
    fn to_record(&self, entity: &T) -> Record;

    /// Decode a record, or `None` if it does not describe a valid entity.
    fn from_record(&self, record: &Record) -> Option<T>;

    /// Decode a record, reporting why it failed.
    ///
    /// The default wraps [`Serializer::from_record`]; implementations with
    /// richer diagnostics should override it.
    fn decode(&self, record: &Record) -> Result<T, SerializationError> {
        let id = record.id().ok_or(SerializationError::MissingId)?;
        self.from_record(record)
            .ok_or_else(|| SerializationError::DecodeFailed {
                id: Some(id),
                reason: "record does not describe a valid entity".to_string(),
            })
    }
}

/// Serializer for any serde-capable entity.
///
/// Entities are encoded with `serde_json`, so the entity's `id()` must be
/// serialized under the `"id"` key.
pub struct JsonSerializer<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonSerializer<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for JsonSerializer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JsonSerializer")
    }
}

impl<T> Serializer<T> for JsonSerializer<T>
where
    T: Entity + Serialize + DeserializeOwned,
{
    fn to_record(&self, entity: &T) -> Record {
        match serde_json::to_value(entity) {
            Ok(value) => Record::new(value),
            Err(e) => {
                // Stores reject records without an id, which surfaces as a
                // store-access error on the mutation.
                tracing::error!(entity_id = %entity.id(), error = %e, "Failed to encode entity");
                Record::new(Value::Null)
            }
        }
    }

    fn from_record(&self, record: &Record) -> Option<T> {
        self.decode(record).ok()
    }

    fn decode(&self, record: &Record) -> Result<T, SerializationError> {
        let id = record.id().ok_or(SerializationError::MissingId)?;
        serde_json::from_value(record.as_value().clone()).map_err(|e| {
            SerializationError::DecodeFailed {
                id: Some(id),
                reason: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use tessera_core::EntityId;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Cat {
        id: EntityId,
        name: String,
    }

    impl Entity for Cat {
        fn id(&self) -> EntityId {
            self.id
        }
    }

    #[test]
    fn test_json_serializer_encodes_id_field() {
        let serializer = JsonSerializer::<Cat>::new();
        let record = serializer.to_record(&Cat {
            id: EntityId::new(11),
            name: "Tom".to_string(),
        });
        assert_eq!(record.id(), Some(EntityId::new(11)));
        assert_eq!(record.as_value()["name"], "Tom");
    }

    #[test]
    fn test_json_serializer_decode_failure_carries_id() {
        let serializer = JsonSerializer::<Cat>::new();
        let record = Record::new(json!({"id": 3}));

        assert!(serializer.from_record(&record).is_none());
        match serializer.decode(&record) {
            Err(SerializationError::DecodeFailed { id, reason }) => {
                assert_eq!(id, Some(EntityId::new(3)));
                assert!(reason.contains("name"));
            }
            other => panic!("expected decode failure, got {:?}", other),
        }
    }

    struct NameOnly;

    impl Serializer<Cat> for NameOnly {
        fn to_record(&self, entity: &Cat) -> Record {
            Record::new(json!({"id": entity.id, "name": entity.name}))
        }

        fn from_record(&self, record: &Record) -> Option<Cat> {
            Some(Cat {
                id: record.id()?,
                name: record.as_value().get("name")?.as_str()?.to_string(),
            })
        }
    }

    #[test]
    fn test_default_decode_wraps_from_record() {
        let err = NameOnly.decode(&Record::new(json!({"id": 1}))).unwrap_err();
        assert!(matches!(
            err,
            SerializationError::DecodeFailed { id: Some(id), .. } if id == EntityId::new(1)
        ));

        let cat = NameOnly
            .decode(&Record::new(json!({"id": 2, "name": "Felix"})))
            .unwrap();
        assert_eq!(cat.name, "Felix");
    }

    #[test]
    fn test_decode_without_id_is_missing_id() {
        let record = Record::new(json!({"name": "Anon"}));
        assert_eq!(NameOnly.decode(&record).unwrap_err(), SerializationError::MissingId);
        assert_eq!(
            JsonSerializer::<Cat>::new().decode(&record).unwrap_err(),
            SerializationError::MissingId
        );
    }
}
