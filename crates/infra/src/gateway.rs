//! Development card gateway.

use async_trait::async_trait;
use tracing::info;

use estore_checkout::{CardDetails, PaymentError, PaymentGateway};
use estore_sales::Order;

/// Approves every card except numbers ending in `0000`, which are declined.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedCardGateway;

const DECLINED_SUFFIX: &str = "0000";

#[async_trait]
impl PaymentGateway for SimulatedCardGateway {
    async fn charge(&self, order: &Order, card: &CardDetails) -> Result<(), PaymentError> {
        if card.number.ends_with(DECLINED_SUFFIX) {
            return Err(PaymentError::Declined("card declined by issuer".into()));
        }
        info!(order_id = %order.id(), amount = %order.total_selling_price(), card = card.last4(), "card charged");
        Ok(())
    }
}
