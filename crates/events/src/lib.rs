//! Storefront events and the pub/sub plumbing that carries them.
//!
//! The bus is best-effort: it fans messages out to whoever is subscribed at the
//! time of publishing and keeps nothing.

pub mod bus;
pub mod event;
pub mod in_memory_bus;
pub mod integration;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use integration::{RankedProduct, TopProductsUpdated};
