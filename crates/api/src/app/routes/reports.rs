use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use estore_infra::Storefront;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/revenue", get(revenue))
}

/// `GET /reports/revenue?start=2024-01-01&end=2024-04-01&granularity=month`
pub async fn revenue(Extension(store): Extension<Arc<Storefront>>, Query(q): Query<dto::RevenueQuery>) -> Response {
    match store.revenue.revenues(q.start, q.end, q.granularity) {
        Ok(report) => Json(dto::RevenueReportDto::from(report)).into_response(),
        Err(e) => errors::revenue_error_to_response(e),
    }
}
