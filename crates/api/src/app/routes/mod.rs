use axum::{
    routing::{get, post},
    Router,
};

pub mod catalog;
pub mod orders;
pub mod reports;
pub mod sessions;
pub mod system;

/// Router for every storefront endpoint except `/health`.
pub fn router() -> Router {
    Router::new()
        .route("/products", get(catalog::list_products))
        .route("/sessions", post(sessions::create_session))
        .nest("/sessions", sessions::router())
        .nest("/orders", orders::router())
        .nest("/reports", reports::router())
}
