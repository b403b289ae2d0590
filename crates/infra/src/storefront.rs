//! Wires the in-memory adapters into a running storefront.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use estore_checkout::{CheckoutPorts, CheckoutService, InMemorySessionStore, PaymentGateway};
use estore_core::{Clock, DomainError, Money, ProductId, SystemClock};
use estore_events::{InMemoryEventBus, TopProductsUpdated};
use estore_inventory::{ReservationCoordinator, StockError, StockLedger};
use estore_products::{InMemoryProductCatalog, Product, ProductCatalog};
use estore_sales::{InMemoryOrderRepository, RevenueAggregator};

use crate::config::CheckoutConfig;
use crate::gateway::SimulatedCardGateway;
use crate::notify::{BusTopProductsNotifier, LoggingInvoiceSender};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Stock(#[from] StockError),
}

/// Everything a single storefront process shares.
#[derive(Clone)]
pub struct Storefront {
    pub config: CheckoutConfig,
    pub catalog: Arc<InMemoryProductCatalog>,
    pub ledger: Arc<StockLedger>,
    pub orders: Arc<InMemoryOrderRepository>,
    /// Display-board feed.
    pub top_products: Arc<InMemoryEventBus<TopProductsUpdated>>,
    pub checkout: CheckoutService,
    pub revenue: RevenueAggregator,
}

impl Storefront {
    /// System clock and the simulated card gateway.
    pub fn in_memory(config: CheckoutConfig) -> Self {
        Self::with_parts(config, Arc::new(SystemClock), Arc::new(SimulatedCardGateway))
    }

    pub fn with_parts(config: CheckoutConfig, clock: Arc<dyn Clock>, gateway: Arc<dyn PaymentGateway>) -> Self {
        let catalog = Arc::new(InMemoryProductCatalog::new());
        let ledger = Arc::new(StockLedger::new());
        let orders = Arc::new(InMemoryOrderRepository::new());
        let top_products = Arc::new(InMemoryEventBus::new());

        let checkout = CheckoutService::new(
            CheckoutPorts {
                coordinator: ReservationCoordinator::new(Arc::clone(&ledger)),
                catalog: catalog.clone(),
                orders: orders.clone(),
                sessions: Arc::new(InMemorySessionStore::new()),
                gateway,
                invoices: Arc::new(LoggingInvoiceSender),
                notifier: Arc::new(BusTopProductsNotifier::new(Arc::clone(&top_products), Arc::clone(&clock))),
                clock,
            },
            config.checkout_settings(),
        );
        let revenue = RevenueAggregator::new(orders.clone());

        Self {
            config,
            catalog,
            ledger,
            orders,
            top_products,
            checkout,
            revenue,
        }
    }

    /// Add a product to the catalog with `available` units on the shelf.
    pub fn stock_product(&self, product: Product, available: u32) -> Result<ProductId, StockError> {
        let id = product.id();
        self.ledger.register(id, available)?;
        self.catalog.upsert(product);
        Ok(id)
    }

    /// A handful of products for local runs.
    pub fn seed_demo_catalog(&self) -> Result<Vec<ProductId>, SeedError> {
        let since = NaiveDate::from_ymd_opt(2024, 1, 1)
            .ok_or_else(|| DomainError::validation("bad seed date"))?;
        let demo = [
            ("Espresso cup", 1_250, 400, 40),
            ("French press", 3_900, 2_100, 15),
            ("Grinder", 8_900, 5_600, 6),
            ("Filter papers", 450, 120, 200),
        ];
        let mut ids = Vec::with_capacity(demo.len());
        for (name, selling, purchasing, available) in demo {
            let product = Product::new(
                ProductId::new(),
                name,
                Money::from_minor(selling),
                Money::from_minor(purchasing),
                since,
            )?;
            ids.push(self.stock_product(product, available)?);
        }
        info!(products = ids.len(), "demo catalog seeded");
        Ok(ids)
    }
}
