use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estore_core::{DomainError, DomainResult, Money, OrderId, ProductId};
use estore_products::Product;

/// Fulfilment lifecycle of a committed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    AwaitingDelivery,
    Dispatched,
    Delivered,
}

impl OrderStatus {
    fn rank(self) -> u8 {
        match self {
            OrderStatus::AwaitingDelivery => 0,
            OrderStatus::Dispatched => 1,
            OrderStatus::Delivered => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    /// Paid on delivery; no gateway call at checkout.
    Cash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    AwaitingPayment,
}

impl PaymentMethod {
    /// Payment status an order starts with when paid this way.
    pub fn initial_status(self) -> PaymentStatus {
        match self {
            PaymentMethod::Card => PaymentStatus::Paid,
            PaymentMethod::Cash => PaymentStatus::AwaitingPayment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    Standard,
    Express,
}

/// Order line: product, quantity and the prices captured at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    /// Selling price per unit when the order was placed.
    pub unit_price: Money,
    /// Purchasing price per unit in force when the order was placed.
    pub unit_cost: Money,
}

impl OrderLine {
    /// Capture a product's current prices for `quantity` units.
    pub fn snapshot(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id(),
            product_name: product.name().to_string(),
            quantity,
            unit_price: product.selling_price(),
            unit_cost: product.recent_purchasing_price(),
        }
    }

    pub fn total_price(&self) -> Money {
        self.unit_price.times(self.quantity)
    }

    pub fn total_cost(&self) -> Money {
        self.unit_cost.times(self.quantity)
    }
}

/// A committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer_email: String,
    lines: Vec<OrderLine>,
    total_selling_price: Money,
    total_purchasing_price: Money,
    created_at: DateTime<Utc>,
    status: OrderStatus,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    shipping_method: ShippingMethod,
}

impl Order {
    pub fn new(
        id: OrderId,
        customer_email: impl Into<String>,
        lines: Vec<OrderLine>,
        payment_method: PaymentMethod,
        shipping_method: ShippingMethod,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let customer_email = customer_email.into();
        if customer_email.trim().is_empty() {
            return Err(DomainError::validation("customer email cannot be empty"));
        }
        if lines.is_empty() {
            return Err(DomainError::validation("cannot place an order without lines"));
        }
        if lines.iter().any(|l| l.quantity == 0) {
            return Err(DomainError::validation("quantity must be positive"));
        }

        let total_selling_price = lines.iter().map(OrderLine::total_price).sum();
        let total_purchasing_price = lines.iter().map(OrderLine::total_cost).sum();

        Ok(Self {
            id,
            customer_email,
            lines,
            total_selling_price,
            total_purchasing_price,
            created_at,
            status: OrderStatus::AwaitingDelivery,
            payment_method,
            payment_status: payment_method.initial_status(),
            shipping_method,
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn customer_email(&self) -> &str {
        &self.customer_email
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total_selling_price(&self) -> Money {
        self.total_selling_price
    }

    pub fn total_purchasing_price(&self) -> Money {
        self.total_purchasing_price
    }

    /// Selling total minus cost basis.
    pub fn revenue(&self) -> Money {
        self.total_selling_price - self.total_purchasing_price
    }

    pub fn total_units(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn shipping_method(&self) -> ShippingMethod {
        self.shipping_method
    }

    /// Move the order along its fulfilment lifecycle (forward only).
    pub fn advance_status(&mut self, next: OrderStatus) -> DomainResult<()> {
        if next.rank() < self.status.rank() {
            return Err(DomainError::invariant(format!(
                "cannot move order from {:?} back to {:?}",
                self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }

    /// Record that a cash-on-delivery order has been paid.
    pub fn mark_paid(&mut self) {
        self.payment_status = PaymentStatus::Paid;
    }
}
