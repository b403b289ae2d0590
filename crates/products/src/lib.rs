//! Product catalog.
//!
//! Products carry the prices the checkout snapshots into orders: the current
//! selling price and an append-only history of purchasing prices. Stock levels
//! live in `estore-inventory`, not here.

pub mod catalog;
pub mod product;

pub use catalog::{InMemoryProductCatalog, ProductCatalog};
pub use product::{PricePoint, Product};
