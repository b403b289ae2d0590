//! HTTP API application wiring.
//!
//! - `routes/`: handlers, one file per area (sessions, orders, reports, catalog)
//! - `dto.rs`: request/response shapes that differ from the domain types
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use estore_infra::Storefront;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router over an already wired storefront.
pub fn build_app(storefront: Storefront) -> Router {
    let storefront = Arc::new(storefront);

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_log))
                .layer(Extension(storefront)),
        )
}
