//! Integration messages leaving the storefront.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estore_core::ProductId;

use crate::Event;

/// One entry of the top-selling list shown on the display board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedProduct {
    pub product_id: ProductId,
    pub name: String,
    pub sale_count: u64,
}

/// Full snapshot of the current top-selling products, best seller first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopProductsUpdated {
    pub products: Vec<RankedProduct>,
    pub occurred_at: DateTime<Utc>,
}

impl Event for TopProductsUpdated {
    fn event_type(&self) -> &'static str {
        "catalog.top_products.updated"
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
