//! Sales: committed orders and what is computed from them.
//!
//! Orders are only ever created by a successful checkout. Their line prices are
//! snapshots taken at commit time and never change afterwards.

pub mod criteria;
pub mod order;
pub mod repository;
pub mod revenue;

pub use criteria::{OrderCriteria, OrderSortColumn, SortDirection};
pub use order::{Order, OrderLine, OrderStatus, PaymentMethod, PaymentStatus, ShippingMethod};
pub use repository::{InMemoryOrderRepository, OrderRepository, RepositoryError};
pub use revenue::{
    Granularity, Period, RevenueAggregator, RevenueBucket, RevenueError, RevenueReport, YearMonth,
};
