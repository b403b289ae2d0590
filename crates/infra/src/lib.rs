//! Infrastructure: configuration, in-memory wiring and the adapters behind the
//! checkout's outbound ports.

pub mod config;
pub mod gateway;
pub mod notify;
pub mod storefront;

pub use config::{CheckoutConfig, ConfigError};
pub use gateway::SimulatedCardGateway;
pub use notify::{BusTopProductsNotifier, LoggingInvoiceSender};
pub use storefront::{SeedError, Storefront};
