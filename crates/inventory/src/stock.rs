use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use estore_core::ProductId;

/// Stock counters of one product.
///
/// `available` and `held` are unsigned, so neither can go negative; the ledger
/// refuses any operation that would need them to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub product_id: ProductId,
    pub available: u32,
    pub held: u32,
    /// Number of committed sales involving this product (ranking only).
    pub sold: u64,
}

impl StockRecord {
    pub fn new(product_id: ProductId, available: u32) -> Self {
        Self {
            product_id,
            available,
            held: 0,
            sold: 0,
        }
    }

    /// Units physically on the shelf (free or held).
    pub fn on_hand(&self) -> u64 {
        u64::from(self.available) + u64::from(self.held)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    #[error("unknown product {0}")]
    UnknownProduct(ProductId),

    #[error("quantity must be positive")]
    InvalidQuantity,

    /// A release/commit asked for more than is held. Indicates a double release
    /// upstream; the row is left untouched.
    #[error("product {product_id} holds {held}, cannot take back {requested}")]
    HeldUnderflow {
        product_id: ProductId,
        requested: u32,
        held: u32,
    },

    #[error("product {0} already registered")]
    AlreadyRegistered(ProductId),

    #[error("stock row lock poisoned")]
    Poisoned,
}

impl StockError {
    /// The product the error is about, if any.
    pub fn product_id(&self) -> Option<ProductId> {
        match self {
            StockError::InsufficientStock { product_id, .. }
            | StockError::HeldUnderflow { product_id, .. } => Some(*product_id),
            StockError::UnknownProduct(id) | StockError::AlreadyRegistered(id) => Some(*id),
            StockError::InvalidQuantity | StockError::Poisoned => None,
        }
    }
}

type Row = Arc<Mutex<StockRecord>>;

/// Per-product stock counters with row-level mutual exclusion.
///
/// The outer map lock is only held long enough to look up (or insert) a row; every
/// counter change happens under that row's own mutex. Operations on different
/// products never wait on each other, and no operation holds more than one row lock.
#[derive(Debug, Default)]
pub struct StockLedger {
    rows: RwLock<HashMap<ProductId, Row>>,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a product with `available` units on the shelf.
    pub fn register(&self, product_id: ProductId, available: u32) -> Result<StockRecord, StockError> {
        let mut rows = self.rows.write().map_err(|_| StockError::Poisoned)?;
        if rows.contains_key(&product_id) {
            return Err(StockError::AlreadyRegistered(product_id));
        }
        let record = StockRecord::new(product_id, available);
        rows.insert(product_id, Arc::new(Mutex::new(record)));
        debug!(%product_id, available, "stock row registered");
        Ok(record)
    }

    /// Add freshly delivered units to `available`.
    pub fn restock(&self, product_id: ProductId, quantity: u32) -> Result<StockRecord, StockError> {
        ensure_positive(quantity)?;
        self.with_row(product_id, |row| {
            row.available = row.available.saturating_add(quantity);
            Ok(())
        })
    }

    /// Move `quantity` units from `available` to `held`, or fail leaving the row unchanged.
    pub fn reserve(&self, product_id: ProductId, quantity: u32) -> Result<StockRecord, StockError> {
        ensure_positive(quantity)?;
        let record = self.with_row(product_id, |row| {
            if row.available < quantity {
                return Err(StockError::InsufficientStock {
                    product_id,
                    requested: quantity,
                    available: row.available,
                });
            }
            row.available -= quantity;
            row.held += quantity;
            Ok(())
        })?;
        debug!(%product_id, quantity, available = record.available, held = record.held, "stock reserved");
        Ok(record)
    }

    /// Move `quantity` units from `held` back to `available`.
    ///
    /// Not idempotent: calling it twice for one reservation credits `available`
    /// twice unless `held` runs out first. Callers guarantee single invocation.
    pub fn release(&self, product_id: ProductId, quantity: u32) -> Result<StockRecord, StockError> {
        ensure_positive(quantity)?;
        let record = self.with_row(product_id, |row| {
            take_held(row, quantity)?;
            row.available += quantity;
            Ok(())
        })?;
        debug!(%product_id, quantity, available = record.available, held = record.held, "stock released");
        Ok(record)
    }

    /// Turn `quantity` held units into a sale and bump the sale counter once.
    pub fn commit(&self, product_id: ProductId, quantity: u32) -> Result<StockRecord, StockError> {
        ensure_positive(quantity)?;
        let record = self.with_row(product_id, |row| {
            take_held(row, quantity)?;
            row.sold += 1;
            Ok(())
        })?;
        debug!(%product_id, quantity, held = record.held, sold = record.sold, "stock committed");
        Ok(record)
    }

    /// Current counters of one product.
    pub fn snapshot(&self, product_id: ProductId) -> Result<StockRecord, StockError> {
        let row = self.row(product_id)?;
        let guard = row.lock().map_err(|_| StockError::Poisoned)?;
        Ok(*guard)
    }

    /// Counters of every product, in no particular order.
    ///
    /// Each row is read under its own lock, so the result is per-row consistent but
    /// not a point-in-time snapshot across rows.
    pub fn snapshot_all(&self) -> Result<Vec<StockRecord>, StockError> {
        let rows: Vec<Row> = {
            let map = self.rows.read().map_err(|_| StockError::Poisoned)?;
            map.values().cloned().collect()
        };
        rows.iter()
            .map(|row| row.lock().map(|g| *g).map_err(|_| StockError::Poisoned))
            .collect()
    }

    /// Best sellers first, at most `limit` of them, skipping products never sold.
    pub fn top_selling(&self, limit: usize) -> Result<Vec<StockRecord>, StockError> {
        let mut records = self.snapshot_all()?;
        records.sort_by(|a, b| b.sold.cmp(&a.sold).then_with(|| a.product_id.cmp(&b.product_id)));
        records.truncate(limit);
        records.retain(|r| r.sold >= 1);
        Ok(records)
    }

    fn row(&self, product_id: ProductId) -> Result<Row, StockError> {
        let rows = self.rows.read().map_err(|_| StockError::Poisoned)?;
        rows.get(&product_id)
            .cloned()
            .ok_or(StockError::UnknownProduct(product_id))
    }

    /// Run `mutate` on a copy of the row under its lock; the copy is written back
    /// only if `mutate` succeeds.
    fn with_row<F>(&self, product_id: ProductId, mutate: F) -> Result<StockRecord, StockError>
    where
        F: FnOnce(&mut StockRecord) -> Result<(), StockError>,
    {
        let row = self.row(product_id)?;
        let mut guard = row.lock().map_err(|_| {
            error!(%product_id, "stock row lock poisoned");
            StockError::Poisoned
        })?;
        let mut next = *guard;
        mutate(&mut next)?;
        *guard = next;
        Ok(next)
    }
}

fn ensure_positive(quantity: u32) -> Result<(), StockError> {
    if quantity == 0 {
        return Err(StockError::InvalidQuantity);
    }
    Ok(())
}

fn take_held(row: &mut StockRecord, quantity: u32) -> Result<(), StockError> {
    if row.held < quantity {
        return Err(StockError::HeldUnderflow {
            product_id: row.product_id,
            requested: quantity,
            held: row.held,
        });
    }
    row.held -= quantity;
    Ok(())
}
