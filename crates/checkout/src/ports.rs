//! Post-commit side effects. Failures are logged by checkout and never undo a sale.

use async_trait::async_trait;
use thiserror::Error;

use estore_events::RankedProduct;
use estore_sales::Order;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct DeliveryError(pub String);

/// Sends the invoice for a committed order.
#[async_trait]
pub trait InvoiceSender: Send + Sync {
    async fn send_invoice(&self, order: &Order) -> Result<(), DeliveryError>;
}

/// Pushes the current top-selling ranking to the display board.
pub trait TopProductsNotifier: Send + Sync {
    fn publish(&self, ranking: Vec<RankedProduct>) -> Result<(), DeliveryError>;
}
