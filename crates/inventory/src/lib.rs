//! Inventory: stock counters and batch reservations.
//!
//! - [`StockLedger`] owns the per-product counters (`available`, `held`, `sold`)
//!   behind one lock per product row.
//! - [`ReservationCoordinator`] reserves a whole cart against the ledger with
//!   all-or-nothing semantics.

pub mod reservation;
pub mod stock;

pub use reservation::{LineItem, ReservationCoordinator};
pub use stock::{StockError, StockLedger, StockRecord};
