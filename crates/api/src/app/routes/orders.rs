//! Back-office order lookups: search, single order, fulfilment status.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};

use estore_core::OrderId;
use estore_infra::Storefront;
use estore_sales::{OrderCriteria, OrderRepository};

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(search_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", patch(update_status))
}

/// `GET /orders?status=dispatched&sort_by=price&direction=asc`
pub async fn search_orders(
    Extension(store): Extension<Arc<Storefront>>,
    Query(criteria): Query<OrderCriteria>,
) -> Response {
    match store.orders.find_by_criteria(&criteria) {
        Ok(orders) => Json(orders).into_response(),
        Err(e) => errors::repository_error_to_response(e),
    }
}

pub async fn get_order(Extension(store): Extension<Arc<Storefront>>, Path(id): Path<String>) -> Response {
    let order_id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.orders.find_by_id(order_id) {
        Ok(Some(order)) => Json(order).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "order not found"),
        Err(e) => errors::repository_error_to_response(e),
    }
}

pub async fn update_status(
    Extension(store): Extension<Arc<Storefront>>,
    Path(id): Path<String>,
    Json(body): Json<dto::StatusUpdate>,
) -> Response {
    let order_id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.orders.update_status(order_id, body.status) {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::repository_error_to_response(e),
    }
}
