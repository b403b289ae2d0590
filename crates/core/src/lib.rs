//! `estore-core` — storefront foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, money, the shared error model and a clock seam.

pub mod clock;
pub mod error;
pub mod id;
pub mod value_object;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use id::{BatchId, OrderId, ProductId, SessionId};
pub use value_object::{Money, ValueObject};
