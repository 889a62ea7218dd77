//! Tessera Events - Observer Contract and Fan-out
//!
//! Caches report every successful mutation to registered observers.
//!
//! # Delivery
//!
//! Fan-out is synchronous and follows registration order:
//!
//! ```text
//! add/update/remove ─ lock released ─→ observer 1 → observer 2 → ... → caller
//! ```
//!
//! Observers that must not block the mutating thread can be wrapped in a
//! [`ChannelObserver`], which forwards events over a per-observer queue and
//! keeps their order.
//!
//! # Key Types
//!
//! - [`Observer`]: the sink trait
//! - [`ObserverRegistry`]: ordered, non-deduplicating list of sinks
//! - [`LoggingObserver`]: named sink that logs each event
//! - [`ChannelObserver`]: queue-backed sink

mod channel;
mod observer;
mod registry;

pub use channel::{CacheEvent, ChannelObserver};
pub use observer::{LoggingObserver, Observer};
pub use registry::ObserverRegistry;

pub use tessera_core::Operation;
