//! Cart and checkout endpoints, all scoped to a shopper session.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, post},
    Json, Router,
};

use estore_checkout::PaymentSubmission;
use estore_core::{ProductId, SessionId};
use estore_infra::Storefront;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/:id", delete(close_session))
        .route("/:id/cart", post(add_to_cart).get(view_cart))
        .route("/:id/cart/:product_id", delete(remove_from_cart))
        .route("/:id/checkout", post(begin_checkout).get(checkout_status).delete(release_hold))
        .route("/:id/checkout/payment", post(proceed_to_payment))
        .route("/:id/checkout/submit", post(submit_payment))
}

fn session_id(raw: &str) -> Result<SessionId, Response> {
    errors::parse_id(raw, "session")
}

pub async fn create_session(Extension(store): Extension<Arc<Storefront>>) -> Response {
    let session_id = store.checkout.create_session();
    (StatusCode::CREATED, Json(dto::SessionCreated { session_id })).into_response()
}

pub async fn close_session(Extension(store): Extension<Arc<Storefront>>, Path(id): Path<String>) -> Response {
    let session_id = match session_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.checkout.close_session(session_id).await {
        Ok(status) => Json(status).into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}

pub async fn add_to_cart(
    Extension(store): Extension<Arc<Storefront>>,
    Path(id): Path<String>,
    Json(body): Json<dto::AddToCartRequest>,
) -> Response {
    let session_id = match session_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let product_id: ProductId = match errors::parse_id(&body.product_id, "product") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.checkout.add_to_cart(session_id, product_id, body.quantity).await {
        Ok(cart) => Json(cart).into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}

pub async fn remove_from_cart(
    Extension(store): Extension<Arc<Storefront>>,
    Path((id, product)): Path<(String, String)>,
) -> Response {
    let session_id = match session_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let product_id: ProductId = match errors::parse_id(&product, "product") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.checkout.remove_from_cart(session_id, product_id).await {
        Ok(cart) => Json(cart).into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}

pub async fn view_cart(Extension(store): Extension<Arc<Storefront>>, Path(id): Path<String>) -> Response {
    let session_id = match session_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.checkout.view_cart(session_id).await {
        Ok(cart) => Json(cart).into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}

pub async fn begin_checkout(Extension(store): Extension<Arc<Storefront>>, Path(id): Path<String>) -> Response {
    let session_id = match session_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.checkout.begin_checkout(session_id).await {
        Ok(status) => Json(status).into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}

pub async fn checkout_status(Extension(store): Extension<Arc<Storefront>>, Path(id): Path<String>) -> Response {
    let session_id = match session_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.checkout.status(session_id).await {
        Ok(status) => Json(status).into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}

pub async fn release_hold(Extension(store): Extension<Arc<Storefront>>, Path(id): Path<String>) -> Response {
    let session_id = match session_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.checkout.release(session_id).await {
        Ok(status) => Json(status).into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}

pub async fn proceed_to_payment(Extension(store): Extension<Arc<Storefront>>, Path(id): Path<String>) -> Response {
    let session_id = match session_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.checkout.proceed_to_payment(session_id).await {
        Ok(status) => Json(status).into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}

pub async fn submit_payment(
    Extension(store): Extension<Arc<Storefront>>,
    Path(id): Path<String>,
    Json(body): Json<PaymentSubmission>,
) -> Response {
    let session_id = match session_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.checkout.submit_payment(session_id, body).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}
