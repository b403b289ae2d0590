use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use estore_core::{Money, ProductId, SessionId};
use estore_sales::{Granularity, OrderStatus, RevenueReport};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct RevenueQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub granularity: Granularity,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: SessionId,
}

#[derive(Debug, Serialize)]
pub struct ProductListing {
    pub id: ProductId,
    pub name: String,
    pub price: String,
    pub price_minor: i64,
    pub available: u32,
}

#[derive(Debug, Serialize)]
pub struct RevenueBucketDto {
    pub period: String,
    pub revenue: String,
    pub revenue_minor: i64,
}

#[derive(Debug, Serialize)]
pub struct RevenueReportDto {
    pub granularity: Granularity,
    pub buckets: Vec<RevenueBucketDto>,
    pub total: String,
}

impl From<RevenueReport> for RevenueReportDto {
    fn from(report: RevenueReport) -> Self {
        let total = report.total();
        Self {
            granularity: report.granularity,
            buckets: report
                .buckets
                .into_iter()
                .map(|b| RevenueBucketDto {
                    period: b.period.to_string(),
                    revenue: b.revenue.to_string(),
                    revenue_minor: b.revenue.minor_units(),
                })
                .collect(),
            total: total.to_string(),
        }
    }
}

pub fn listing(id: ProductId, name: &str, price: Money, available: u32) -> ProductListing {
    ProductListing {
        id,
        name: name.to_string(),
        price: price.to_string(),
        price_minor: price.minor_units(),
        available,
    }
}
