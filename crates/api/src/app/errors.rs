use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use estore_checkout::CheckoutError;
use estore_core::DomainError;
use estore_inventory::StockError;
use estore_sales::{RepositoryError, RevenueError};

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn checkout_error_to_response(err: CheckoutError) -> Response {
    let message = err.to_string();
    match err {
        CheckoutError::InsufficientStock {
            product_id,
            requested,
            available,
        } => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": "insufficient_stock",
                "message": message,
                "product_id": product_id,
                "requested": requested,
                "available": available,
            })),
        )
            .into_response(),
        CheckoutError::HoldExpired => json_error(StatusCode::GONE, "hold_expired", message),
        CheckoutError::PaymentDeclined { remaining, .. } => (
            StatusCode::PAYMENT_REQUIRED,
            axum::Json(json!({
                "error": "payment_declined",
                "message": message,
                "remaining_secs": remaining.as_secs(),
            })),
        )
            .into_response(),
        CheckoutError::EmptyCart => json_error(StatusCode::BAD_REQUEST, "empty_cart", message),
        CheckoutError::NoActiveHold => json_error(StatusCode::CONFLICT, "no_active_hold", message),
        CheckoutError::InvalidTransition { .. } => {
            json_error(StatusCode::CONFLICT, "invalid_transition", message)
        }
        CheckoutError::SessionNotFound(_) => json_error(StatusCode::NOT_FOUND, "session_not_found", message),
        CheckoutError::Stock(e) => stock_error_to_response(e),
        CheckoutError::Domain(e) => domain_error_to_response(e),
        CheckoutError::Repository(e) => repository_error_to_response(e),
    }
}

pub fn stock_error_to_response(err: StockError) -> Response {
    let message = err.to_string();
    match err {
        StockError::InsufficientStock { .. } => json_error(StatusCode::CONFLICT, "insufficient_stock", message),
        StockError::UnknownProduct(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        StockError::InvalidQuantity => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
        StockError::AlreadyRegistered(_) => json_error(StatusCode::CONFLICT, "conflict", message),
        StockError::HeldUnderflow { .. } | StockError::Poisoned => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "stock_error", message)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    let message = err.to_string();
    match err {
        DomainError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
        DomainError::InvariantViolation(_) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", message)
        }
    }
}

pub fn repository_error_to_response(err: RepositoryError) -> Response {
    let message = err.to_string();
    match err {
        RepositoryError::Duplicate(_) => json_error(StatusCode::CONFLICT, "conflict", message),
        RepositoryError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        RepositoryError::Domain(e) => domain_error_to_response(e),
        RepositoryError::Unavailable(_) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", message)
        }
    }
}

pub fn revenue_error_to_response(err: RevenueError) -> Response {
    match err {
        RevenueError::InvalidPeriod { .. } => {
            json_error(StatusCode::BAD_REQUEST, "invalid_period", err.to_string())
        }
        RevenueError::Repository(e) => repository_error_to_response(e),
    }
}

/// Parse a path segment into a typed id, or a 400 response.
pub fn parse_id<T>(raw: &str, what: &'static str) -> Result<T, Response>
where
    T: std::str::FromStr,
{
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id")))
}
