//! Ordered observer registry.

use std::sync::Arc;

use parking_lot::RwLock;
use tessera_core::{Entity, Operation};

use crate::Observer;

/// Ordered list of observers.
///
/// Registering the same observer twice keeps both entries, so it is
/// notified twice per event. Unregistering removes one entry at a time,
/// matched by pointer identity.
pub struct ObserverRegistry<T: Entity> {
    observers: RwLock<Vec<Arc<dyn Observer<T>>>>,
}

impl<T: Entity> ObserverRegistry<T> {
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Append an observer to the end of the notification order.
    pub fn register(&self, observer: Arc<dyn Observer<T>>) {
        self.observers.write().push(observer);
    }

    /// Remove the first entry pointing at `observer`.
    ///
    /// Returns `false` when the observer was not registered.
    pub fn unregister(&self, observer: &Arc<dyn Observer<T>>) -> bool {
        let mut observers = self.observers.write();
        match observers.iter().position(|o| same_observer(o, observer)) {
            Some(index) => {
                observers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    /// Notify every registered observer, in registration order.
    ///
    /// The list is snapshotted first so observers can register or unregister
    /// from inside `inform` without deadlocking.
    pub fn notify(&self, operation: Operation, entity: &T) {
        let snapshot: Vec<Arc<dyn Observer<T>>> = self.observers.read().clone();
        tracing::trace!(
            entity_id = %entity.id(),
            operation = %operation,
            count = snapshot.len(),
            "Fanning out cache event"
        );
        for observer in snapshot {
            observer.inform(operation, entity);
        }
    }
}

impl<T: Entity> Default for ObserverRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> std::fmt::Debug for ObserverRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.len())
            .finish()
    }
}

// Compare data pointers only; vtable pointers for the same type may differ
// across codegen units.
fn same_observer<T: Entity>(a: &Arc<dyn Observer<T>>, b: &Arc<dyn Observer<T>>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
