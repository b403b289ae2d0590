use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use estore_core::{DomainError, DomainResult, Money, ProductId};

/// A purchasing price effective from a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: Money,
    pub effective_from: NaiveDate,
}

/// A sellable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    selling_price: Money,
    /// Oldest first; never empty, never rewritten.
    purchasing_prices: Vec<PricePoint>,
}

impl Product {
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        selling_price: Money,
        purchasing_price: Money,
        effective_from: NaiveDate,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        ensure_non_negative("selling price", selling_price)?;
        ensure_non_negative("purchasing price", purchasing_price)?;

        Ok(Self {
            id,
            name,
            selling_price,
            purchasing_prices: vec![PricePoint {
                price: purchasing_price,
                effective_from,
            }],
        })
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn selling_price(&self) -> Money {
        self.selling_price
    }

    pub fn purchasing_prices(&self) -> &[PricePoint] {
        &self.purchasing_prices
    }

    /// The purchasing price currently in force (last entry of the history).
    pub fn recent_purchasing_price(&self) -> Money {
        self.purchasing_prices
            .last()
            .map(|p| p.price)
            .unwrap_or(Money::ZERO)
    }

    pub fn set_selling_price(&mut self, price: Money) -> DomainResult<()> {
        ensure_non_negative("selling price", price)?;
        self.selling_price = price;
        Ok(())
    }

    /// Record a new purchasing price.
    ///
    /// The history is append-only; a price equal to the current one is not recorded
    /// again. Returns whether an entry was appended.
    pub fn record_purchasing_price(&mut self, price: Money, effective_from: NaiveDate) -> DomainResult<bool> {
        ensure_non_negative("purchasing price", price)?;
        if price == self.recent_purchasing_price() {
            return Ok(false);
        }
        if let Some(last) = self.purchasing_prices.last() {
            if effective_from < last.effective_from {
                return Err(DomainError::invariant(
                    "purchasing price history must be chronological",
                ));
            }
        }
        self.purchasing_prices.push(PricePoint {
            price,
            effective_from,
        });
        Ok(true)
    }
}

fn ensure_non_negative(what: &str, price: Money) -> DomainResult<()> {
    if price < Money::ZERO {
        return Err(DomainError::validation(format!("{what} cannot be negative")));
    }
    Ok(())
}
