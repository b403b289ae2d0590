//! Payment details and the gateway port.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use estore_core::{DomainError, DomainResult};
use estore_sales::{Order, PaymentMethod, ShippingMethod};

const CARD_NUMBER_LEN: usize = 16;
const CVV_LEN: usize = 3;
const MAX_HOLDER_LEN: usize = 70;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    pub number: String,
    pub holder: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub cvv: String,
}

impl CardDetails {
    /// Syntactic checks only; whether the card is good is the gateway's call.
    pub fn validate(&self, today: NaiveDate) -> DomainResult<()> {
        if self.number.len() != CARD_NUMBER_LEN || !all_digits(&self.number) {
            return Err(DomainError::validation("card number must be 16 digits"));
        }
        let holder = self.holder.trim();
        if holder.is_empty() || holder.chars().count() > MAX_HOLDER_LEN {
            return Err(DomainError::validation(
                "card holder must be between 1 and 70 characters",
            ));
        }
        if !(1..=12).contains(&self.expiry_month) {
            return Err(DomainError::validation("expiry month must be 1-12"));
        }
        if (self.expiry_year, self.expiry_month) < (today.year(), today.month()) {
            return Err(DomainError::validation("card has expired"));
        }
        if self.cvv.len() != CVV_LEN || !all_digits(&self.cvv) {
            return Err(DomainError::validation("cvv must be 3 digits"));
        }
        Ok(())
    }

    /// Last four digits, for logs.
    pub fn last4(&self) -> &str {
        let n = self.number.len();
        self.number.get(n.saturating_sub(4)..).unwrap_or("")
    }
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// What the shopper submits on the payment page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSubmission {
    pub payment_method: PaymentMethod,
    pub shipping_method: ShippingMethod,
    pub customer_email: String,
    #[serde(default)]
    pub card: Option<CardDetails>,
}

impl PaymentSubmission {
    pub fn validate(&self, today: NaiveDate) -> DomainResult<()> {
        let email = self.customer_email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("a valid customer email is required"));
        }
        match (self.payment_method, &self.card) {
            (PaymentMethod::Card, Some(card)) => card.validate(today),
            (PaymentMethod::Card, None) => Err(DomainError::validation("card details are required")),
            (PaymentMethod::Cash, _) => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("{0}")]
    Declined(String),

    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),
}

impl PaymentError {
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

/// Card payment provider.
///
/// Any error is treated the same way by checkout: the shopper goes back to the
/// payment step with the hold intact.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, order: &Order, card: &CardDetails) -> Result<(), PaymentError>;
}
