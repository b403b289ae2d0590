use std::time::Duration;

use thiserror::Error;

use estore_core::{DomainError, ProductId, SessionId};
use estore_inventory::StockError;
use estore_sales::RepositoryError;

/// Everything a shopper-facing checkout operation can fail with.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Cart needs adjusting; nothing was reserved.
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The hold ran out; checkout must start again.
    #[error("hold expired; restart checkout")]
    HoldExpired,

    /// The hold is still in place and `remaining` is left on it.
    #[error("payment declined: {reason}")]
    PaymentDeclined { reason: String, remaining: Duration },

    #[error("cart is empty")]
    EmptyCart,

    #[error("no active hold")]
    NoActiveHold,

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    #[error(transparent)]
    Stock(StockError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<StockError> for CheckoutError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::InsufficientStock {
                product_id,
                requested,
                available,
            } => CheckoutError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            other => CheckoutError::Stock(other),
        }
    }
}

pub type CheckoutResult<T> = Result<T, CheckoutError>;
