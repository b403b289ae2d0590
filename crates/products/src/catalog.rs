//! Catalog port and its in-memory adapter.

use std::collections::HashMap;
use std::sync::RwLock;

use estore_core::ProductId;

use crate::Product;

/// Read/write access to products.
///
/// The checkout only reads from it (price snapshots, names for the display board).
pub trait ProductCatalog: Send + Sync {
    fn get(&self, id: ProductId) -> Option<Product>;

    fn list(&self) -> Vec<Product>;

    fn upsert(&self, product: Product);
}

/// In-memory catalog.
///
/// Intended for tests/dev. A poisoned lock reads as an empty catalog.
#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let catalog = Self::new();
        for p in products {
            catalog.upsert(p);
        }
        catalog
    }
}

impl ProductCatalog for InMemoryProductCatalog {
    fn get(&self, id: ProductId) -> Option<Product> {
        self.products.read().ok()?.get(&id).cloned()
    }

    fn list(&self) -> Vec<Product> {
        let Ok(products) = self.products.read() else {
            return Vec::new();
        };
        let mut all: Vec<Product> = products.values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    fn upsert(&self, product: Product) {
        if let Ok(mut products) = self.products.write() {
            products.insert(product.id(), product);
        }
    }
}
