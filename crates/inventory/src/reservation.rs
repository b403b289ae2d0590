//! Batch reservations with compensating rollback.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use estore_core::ProductId;

use crate::stock::{StockError, StockLedger};

/// A (product, quantity) pair within a batch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl LineItem {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Reserves, releases and commits whole batches against a [`StockLedger`].
///
/// Stateless apart from the shared ledger handle; safe to call from any thread.
#[derive(Debug, Clone)]
pub struct ReservationCoordinator {
    ledger: Arc<StockLedger>,
}

impl ReservationCoordinator {
    pub fn new(ledger: Arc<StockLedger>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Arc<StockLedger> {
        &self.ledger
    }

    /// Reserve every line in input order, all or nothing.
    ///
    /// On the first failure the lines already reserved are released in reverse
    /// order and the failing line's error is returned, so nothing stays held.
    pub fn reserve_batch(&self, items: &[LineItem]) -> Result<(), StockError> {
        for (idx, item) in items.iter().enumerate() {
            if let Err(err) = self.ledger.reserve(item.product_id, item.quantity) {
                warn!(
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    rolled_back = idx,
                    error = %err,
                    "batch reservation failed; rolling back"
                );
                for done in items[..idx].iter().rev() {
                    if let Err(undo) = self.ledger.release(done.product_id, done.quantity) {
                        // Only reachable if someone released our hold behind our back.
                        error!(product_id = %done.product_id, error = %undo, "rollback release failed");
                    }
                }
                return Err(err);
            }
        }
        info!(lines = items.len(), "batch reserved");
        Ok(())
    }

    /// Release every line of a previously reserved batch.
    ///
    /// Keeps going past individual failures and reports the first one. Must be
    /// invoked at most once per batch; the checkout state machine guarantees that.
    pub fn release_batch(&self, items: &[LineItem]) -> Result<(), StockError> {
        let mut first_err = None;
        for item in items {
            if let Err(err) = self.ledger.release(item.product_id, item.quantity) {
                error!(product_id = %item.product_id, error = %err, "release failed");
                first_err.get_or_insert(err);
            }
        }
        info!(lines = items.len(), "batch released");
        first_err.map_or(Ok(()), Err)
    }

    /// Convert a held batch into sales.
    ///
    /// Lines naming the same product are merged first, so each distinct product's
    /// sale counter moves by exactly one per batch.
    pub fn commit_batch(&self, items: &[LineItem]) -> Result<(), StockError> {
        let merged = merge_by_product(items);
        let mut first_err = None;
        for item in &merged {
            if let Err(err) = self.ledger.commit(item.product_id, item.quantity) {
                error!(product_id = %item.product_id, error = %err, "commit failed");
                first_err.get_or_insert(err);
            }
        }
        info!(products = merged.len(), "batch committed");
        first_err.map_or(Ok(()), Err)
    }
}

/// Sum quantities per product, keeping first-seen order.
pub fn merge_by_product(items: &[LineItem]) -> Vec<LineItem> {
    let mut merged: Vec<LineItem> = Vec::with_capacity(items.len());
    for item in items {
        match merged.iter_mut().find(|m| m.product_id == item.product_id) {
            Some(existing) => existing.quantity += item.quantity,
            None => merged.push(*item),
        }
    }
    merged
}
