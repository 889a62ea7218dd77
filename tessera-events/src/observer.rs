//! Observer trait and a logging implementation.

use tessera_core::{Entity, Operation};

/// A sink notified after each successful cache mutation.
///
/// `inform` runs on the thread that performed the mutation, after the
/// cache's mutation lock has been released. Implementations may call back
/// into the cache.
pub trait Observer<T: Entity>: Send + Sync {
    /// Called once per successful add, update or remove.
    fn inform(&self, operation: Operation, entity: &T);
}

/// Observer that logs `(name): Entity <id> <OPERATION>` for every event.
#[derive(Debug, Clone)]
pub struct LoggingObserver {
    name: String,
}

impl LoggingObserver {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl<T: Entity> Observer<T> for LoggingObserver {
    fn inform(&self, operation: Operation, entity: &T) {
        tracing::info!(
            observer = %self.name,
            entity_id = %entity.id(),
            operation = %operation,
            "({}): Entity {} {}",
            self.name,
            entity.id(),
            operation
        );
    }
}
