//! Read-only catalog listing.

use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    Json,
};

use estore_infra::Storefront;
use estore_products::ProductCatalog;

use crate::app::dto;

pub async fn list_products(Extension(store): Extension<Arc<Storefront>>) -> Response {
    let listings: Vec<dto::ProductListing> = store
        .catalog
        .list()
        .iter()
        .map(|p| {
            let available = store.ledger.snapshot(p.id()).map_or(0, |r| r.available);
            dto::listing(p.id(), p.name(), p.selling_price(), available)
        })
        .collect();
    Json(listings).into_response()
}
