//! Order search criteria (back-office order list and "my orders").

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use estore_core::{Money, OrderId};

use crate::{Order, OrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSortColumn {
    #[default]
    Id,
    Date,
    Email,
    Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Filter + sort over committed orders. Every filter is optional.
///
/// `start_date`/`end_date` are whole days, both inclusive, compared against the
/// order's UTC creation date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCriteria {
    pub order_id: Option<OrderId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub customer_email: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub sort_by: OrderSortColumn,
    #[serde(default)]
    pub direction: SortDirection,
}

impl OrderCriteria {
    pub fn for_customer(email: impl Into<String>) -> Self {
        Self {
            customer_email: Some(email.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        let created: DateTime<Utc> = order.created_at();
        let day = created.date_naive();

        self.order_id.is_none_or(|id| order.id() == id)
            && self.start_date.is_none_or(|d| day >= d)
            && self.end_date.is_none_or(|d| day <= d)
            && self
                .customer_email
                .as_deref()
                .filter(|e| !e.is_empty())
                .is_none_or(|e| order.customer_email() == e)
            && self.min_price.is_none_or(|p| order.total_selling_price() >= p)
            && self.max_price.is_none_or(|p| order.total_selling_price() <= p)
            && self.status.is_none_or(|s| order.status() == s)
    }

    /// Sort in place by the requested column. Ties keep id order.
    pub fn sort(&self, orders: &mut [Order]) {
        orders.sort_by(|a, b| {
            let ord = match self.sort_by {
                OrderSortColumn::Id => a.id().cmp(&b.id()),
                OrderSortColumn::Date => a.created_at().cmp(&b.created_at()),
                OrderSortColumn::Email => a.customer_email().cmp(b.customer_email()),
                OrderSortColumn::Price => a.total_selling_price().cmp(&b.total_selling_price()),
            }
            .then_with(|| a.id().cmp(&b.id()));
            match self.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
    }
}
