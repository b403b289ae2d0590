//! Adapters for post-commit side effects.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use estore_checkout::{DeliveryError, InvoiceSender, TopProductsNotifier};
use estore_core::Clock;
use estore_events::{Event, EventBus, RankedProduct, TopProductsUpdated};
use estore_sales::Order;

/// Publishes the top-selling ranking on an event bus for the display board.
pub struct BusTopProductsNotifier<B> {
    bus: B,
    clock: Arc<dyn Clock>,
}

impl<B> BusTopProductsNotifier<B> {
    pub fn new(bus: B, clock: Arc<dyn Clock>) -> Self {
        Self { bus, clock }
    }
}

impl<B> TopProductsNotifier for BusTopProductsNotifier<B>
where
    B: EventBus<TopProductsUpdated>,
{
    fn publish(&self, ranking: Vec<RankedProduct>) -> Result<(), DeliveryError> {
        let message = TopProductsUpdated {
            products: ranking,
            occurred_at: self.clock.now(),
        };
        debug!(
            event_type = message.event_type(),
            version = message.version(),
            entries = message.products.len(),
            "publishing ranking"
        );
        self.bus
            .publish(message)
            .map_err(|err| DeliveryError(format!("{err:?}")))
    }
}

/// Stand-in for the mail/PDF pipeline: records the invoice in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingInvoiceSender;

#[async_trait]
impl InvoiceSender for LoggingInvoiceSender {
    async fn send_invoice(&self, order: &Order) -> Result<(), DeliveryError> {
        info!(
            order_id = %order.id(),
            customer = order.customer_email(),
            lines = order.lines().len(),
            units = order.total_units(),
            total = %order.total_selling_price(),
            payment_status = ?order.payment_status(),
            "invoice issued"
        );
        Ok(())
    }
}
