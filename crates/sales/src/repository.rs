//! Order storage port and its in-memory implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use thiserror::Error;

use estore_core::{DomainError, OrderId};

use crate::{Order, OrderCriteria, OrderStatus, PaymentStatus};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("order {0} already exists")]
    Duplicate(OrderId),

    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("order store unavailable: {0}")]
    Unavailable(String),
}

/// Committed-order storage.
pub trait OrderRepository: Send + Sync {
    fn save(&self, order: Order) -> Result<(), RepositoryError>;

    fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    fn find_by_criteria(&self, criteria: &OrderCriteria) -> Result<Vec<Order>, RepositoryError>;

    /// Orders created in `[from, to)`, oldest first.
    fn find_by_time_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepositoryError>;

    fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, RepositoryError>;
}

#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> RepositoryError {
    RepositoryError::Unavailable("order store lock poisoned".to_string())
}

impl OrderRepository for InMemoryOrderRepository {
    fn save(&self, order: Order) -> Result<(), RepositoryError> {
        let mut orders = self.orders.write().map_err(poisoned)?;
        if orders.contains_key(&order.id()) {
            return Err(RepositoryError::Duplicate(order.id()));
        }
        orders.insert(order.id(), order);
        Ok(())
    }

    fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let orders = self.orders.read().map_err(poisoned)?;
        Ok(orders.get(&id).cloned())
    }

    fn find_by_criteria(&self, criteria: &OrderCriteria) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.orders.read().map_err(poisoned)?;
        let mut found: Vec<Order> = orders.values().filter(|o| criteria.matches(o)).cloned().collect();
        drop(orders);
        criteria.sort(&mut found);
        Ok(found)
    }

    fn find_by_time_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.orders.read().map_err(poisoned)?;
        let mut found: Vec<Order> = orders
            .values()
            .filter(|o| o.created_at() >= from && o.created_at() < to)
            .cloned()
            .collect();
        drop(orders);
        found.sort_by(|a, b| a.created_at().cmp(&b.created_at()).then_with(|| a.id().cmp(&b.id())));
        Ok(found)
    }

    fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, RepositoryError> {
        let mut orders = self.orders.write().map_err(poisoned)?;
        let order = orders.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;
        order.advance_status(status)?;
        if status == OrderStatus::Delivered && order.payment_status() == PaymentStatus::AwaitingPayment {
            // Cash is collected at the door.
            order.mark_paid();
        }
        Ok(order.clone())
    }
}
