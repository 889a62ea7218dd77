//! Queue-backed observer.
//!
//! Each `ChannelObserver` owns one unbounded queue, so events for that
//! observer are delivered in the order the cache produced them while the
//! mutating thread never waits on the consumer.

use tessera_core::{Entity, Operation};
use tokio::sync::mpsc;

use crate::Observer;

/// A mutation event as delivered through a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent<T> {
    pub operation: Operation,
    pub entity: T,
}

/// Observer that forwards every event into a channel.
#[derive(Debug)]
pub struct ChannelObserver<T> {
    sender: mpsc::UnboundedSender<CacheEvent<T>>,
}

impl<T: Entity> ChannelObserver<T> {
    /// Create the observer and the receiving end of its queue.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CacheEvent<T>>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl<T: Entity> Observer<T> for ChannelObserver<T> {
    fn inform(&self, operation: Operation, entity: &T) {
        let event = CacheEvent {
            operation,
            entity: entity.clone(),
        };
        if self.sender.send(event).is_err() {
            tracing::debug!(
                entity_id = %entity.id(),
                operation = %operation,
                "Channel observer receiver dropped, event discarded"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::EntityId;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item(i64);

    impl Entity for Item {
        fn id(&self) -> EntityId {
            EntityId::new(self.0)
        }
    }

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (observer, mut receiver) = ChannelObserver::new();
        observer.inform(Operation::Added, &Item(1));
        observer.inform(Operation::Updated, &Item(1));
        observer.inform(Operation::Removed, &Item(1));
        drop(observer);

        let mut ops = Vec::new();
        while let Some(event) = receiver.recv().await {
            assert_eq!(event.entity, Item(1));
            ops.push(event.operation);
        }
        assert_eq!(
            ops,
            vec![Operation::Added, Operation::Updated, Operation::Removed]
        );
    }

    #[test]
    fn test_dropped_receiver_does_not_panic() {
        let (observer, receiver) = ChannelObserver::<Item>::new();
        drop(receiver);
        observer.inform(Operation::Added, &Item(2));
    }
}
