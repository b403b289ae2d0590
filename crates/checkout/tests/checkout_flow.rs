//! End-to-end checkout behaviour against in-memory collaborators.

use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tokio::time;

use estore_checkout::{
    CardDetails, CheckoutError, CheckoutPorts, CheckoutService, CheckoutSettings, CheckoutState,
    DeliveryError, InMemorySessionStore, InvoiceSender, PaymentError, PaymentGateway, PaymentSubmission,
    TopProductsNotifier,
};
use estore_core::{FixedClock, Money, OrderId, ProductId};
use estore_events::RankedProduct;
use estore_inventory::{ReservationCoordinator, StockLedger};
use estore_products::{InMemoryProductCatalog, Product, ProductCatalog};
use estore_sales::{
    InMemoryOrderRepository, Order, OrderCriteria, OrderRepository, OrderStatus, PaymentMethod, PaymentStatus,
    RepositoryError, ShippingMethod,
};

#[derive(Default)]
struct ScriptedGateway {
    outcomes: Mutex<VecDeque<Result<(), PaymentError>>>,
    charges: Mutex<Vec<OrderId>>,
}

impl ScriptedGateway {
    fn decline_next(&self, reason: &str) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Err(PaymentError::Declined(reason.to_string())));
    }

    fn charge_count(&self) -> usize {
        self.charges.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn charge(&self, order: &Order, _card: &CardDetails) -> Result<(), PaymentError> {
        self.charges.lock().unwrap().push(order.id());
        self.outcomes.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

#[derive(Default)]
struct RecordingInvoices {
    fail: bool,
    sent: Mutex<Vec<OrderId>>,
}

#[async_trait]
impl InvoiceSender for RecordingInvoices {
    async fn send_invoice(&self, order: &Order) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError("smtp down".into()));
        }
        self.sent.lock().unwrap().push(order.id());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    fail: bool,
    published: Mutex<Vec<Vec<RankedProduct>>>,
}

impl TopProductsNotifier for RecordingNotifier {
    fn publish(&self, ranking: Vec<RankedProduct>) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError("queue unreachable".into()));
        }
        self.published.lock().unwrap().push(ranking);
        Ok(())
    }
}

/// Order store whose next `failing_saves` saves report the store as down.
#[derive(Default)]
struct FlakyOrders {
    inner: InMemoryOrderRepository,
    failing_saves: AtomicUsize,
}

impl FlakyOrders {
    fn fail_next_saves(&self, n: usize) {
        self.failing_saves.store(n, Ordering::SeqCst);
    }
}

impl Deref for FlakyOrders {
    type Target = InMemoryOrderRepository;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl OrderRepository for FlakyOrders {
    fn save(&self, order: Order) -> Result<(), RepositoryError> {
        let failing = self
            .failing_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(RepositoryError::Unavailable("disk full".into()));
        }
        self.inner.save(order)
    }

    fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        self.inner.find_by_id(id)
    }

    fn find_by_criteria(&self, criteria: &OrderCriteria) -> Result<Vec<Order>, RepositoryError> {
        self.inner.find_by_criteria(criteria)
    }

    fn find_by_time_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepositoryError> {
        self.inner.find_by_time_range(from, to)
    }

    fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, RepositoryError> {
        self.inner.update_status(id, status)
    }
}

struct Fixture {
    service: CheckoutService,
    ledger: Arc<StockLedger>,
    orders: Arc<FlakyOrders>,
    sessions: Arc<InMemorySessionStore>,
    gateway: Arc<ScriptedGateway>,
    invoices: Arc<RecordingInvoices>,
    notifier: Arc<RecordingNotifier>,
    products: Vec<ProductId>,
}

impl Fixture {
    fn counters(&self, idx: usize) -> (u32, u32, u64) {
        let rec = self.ledger.snapshot(self.products[idx]).unwrap();
        (rec.available, rec.held, rec.sold)
    }
}

fn fixture(window_secs: u64, stock: &[u32]) -> Fixture {
    build(
        Duration::from_secs(window_secs),
        stock,
        RecordingInvoices::default(),
        RecordingNotifier::default(),
    )
}

fn build(window: Duration, stock: &[u32], invoices: RecordingInvoices, notifier: RecordingNotifier) -> Fixture {
    let ledger = Arc::new(StockLedger::new());
    let catalog = InMemoryProductCatalog::new();
    let mut products = Vec::new();
    for (i, &available) in stock.iter().enumerate() {
        let id = ProductId::new();
        let product = Product::new(
            id,
            format!("Product {i}"),
            Money::from_minor(1_000 * (i as i64 + 1)),
            Money::from_minor(600 * (i as i64 + 1)),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .unwrap();
        catalog.upsert(product);
        ledger.register(id, available).unwrap();
        products.push(id);
    }

    let orders = Arc::new(FlakyOrders::default());
    let sessions = Arc::new(InMemorySessionStore::new());
    let gateway = Arc::new(ScriptedGateway::default());
    let invoices = Arc::new(invoices);
    let notifier = Arc::new(notifier);
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap());

    let service = CheckoutService::new(
        CheckoutPorts {
            coordinator: ReservationCoordinator::new(Arc::clone(&ledger)),
            catalog: Arc::new(catalog),
            orders: orders.clone(),
            sessions: sessions.clone(),
            gateway: gateway.clone(),
            invoices: invoices.clone(),
            notifier: notifier.clone(),
            clock: Arc::new(clock),
        },
        CheckoutSettings {
            hold_window: window,
            top_products_len: 5,
        },
    );

    Fixture {
        service,
        ledger,
        orders,
        sessions,
        gateway,
        invoices,
        notifier,
        products,
    }
}

fn card_payment() -> PaymentSubmission {
    PaymentSubmission {
        payment_method: PaymentMethod::Card,
        shipping_method: ShippingMethod::Standard,
        customer_email: "shopper@example.com".into(),
        card: Some(CardDetails {
            number: "4111111111111111".into(),
            holder: "Sam Shopper".into(),
            expiry_month: 12,
            expiry_year: 2030,
            cvv: "123".into(),
        }),
    }
}

fn cash_payment() -> PaymentSubmission {
    PaymentSubmission {
        payment_method: PaymentMethod::Cash,
        card: None,
        ..card_payment()
    }
}

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn card_checkout_commits_stock_and_persists_the_order() {
    let f = fixture(600, &[10, 4]);
    let s = f.service.create_session();
    f.service.add_to_cart(s, f.products[0], 2).await.unwrap();
    f.service.add_to_cart(s, f.products[1], 1).await.unwrap();

    let held = f.service.begin_checkout(s).await.unwrap();
    assert_eq!(held.state, CheckoutState::Held);
    assert_eq!(f.counters(0), (8, 2, 0));

    f.service.proceed_to_payment(s).await.unwrap();
    let order = f.service.submit_payment(s, card_payment()).await.unwrap();

    assert_eq!(order.total_selling_price(), Money::from_minor(2 * 1_000 + 2_000));
    assert_eq!(order.total_purchasing_price(), Money::from_minor(2 * 600 + 1_200));
    assert_eq!(order.payment_status(), PaymentStatus::Paid);
    assert_eq!(f.counters(0), (8, 0, 1));
    assert_eq!(f.counters(1), (3, 0, 1));
    assert!(f.orders.find_by_id(order.id()).unwrap().is_some());
    assert_eq!(f.gateway.charge_count(), 1);
    assert_eq!(f.invoices.sent.lock().unwrap().as_slice(), &[order.id()]);
    assert_eq!(f.notifier.published.lock().unwrap()[0].len(), 2);

    let status = f.service.status(s).await.unwrap();
    assert_eq!(status.state, CheckoutState::Committed { order_id: order.id() });
    assert!(status.held.is_empty());

    // A stale timer must not touch committed stock.
    time::advance(Duration::from_secs(700)).await;
    settle().await;
    assert_eq!(f.counters(0), (8, 0, 1));
    assert!(f.service.view_cart(s).await.unwrap().lines.is_empty());
}

#[tokio::test(start_paused = true)]
async fn hold_counts_down_and_expires_on_its_own() {
    let f = fixture(60, &[5]);
    let s = f.service.create_session();
    f.service.add_to_cart(s, f.products[0], 3).await.unwrap();
    f.service.begin_checkout(s).await.unwrap();

    time::advance(Duration::from_secs(55)).await;
    let status = f.service.status(s).await.unwrap();
    assert_eq!(status.remaining_secs, Some(5));
    assert_eq!(status.elapsed_secs, Some(55));

    time::advance(Duration::from_secs(6)).await;
    settle().await;

    assert_eq!(f.counters(0), (5, 0, 0));
    let status = f.service.status(s).await.unwrap();
    assert_eq!(status.state, CheckoutState::Expired);
    assert_eq!(status.remaining_secs, None);
    assert!(matches!(
        f.service.proceed_to_payment(s).await,
        Err(CheckoutError::HoldExpired)
    ));
}

#[tokio::test(start_paused = true)]
async fn expired_session_can_restart_from_its_cart() {
    let f = fixture(60, &[5]);
    let s = f.service.create_session();
    f.service.add_to_cart(s, f.products[0], 3).await.unwrap();
    f.service.begin_checkout(s).await.unwrap();
    time::advance(Duration::from_secs(61)).await;
    settle().await;

    let again = f.service.begin_checkout(s).await.unwrap();
    assert_eq!(again.state, CheckoutState::Held);
    assert_eq!(again.remaining_secs, Some(60));
    assert_eq!(f.counters(0), (2, 3, 0));
}

#[tokio::test(start_paused = true)]
async fn deadline_is_enforced_even_before_the_timer_runs() {
    let f = fixture(60, &[5]);
    let s = f.service.create_session();
    f.service.add_to_cart(s, f.products[0], 1).await.unwrap();
    f.service.begin_checkout(s).await.unwrap();
    f.service.proceed_to_payment(s).await.unwrap();

    time::advance(Duration::from_secs(60)).await;
    let result = f.service.submit_payment(s, card_payment()).await;
    settle().await;

    assert!(matches!(result, Err(CheckoutError::HoldExpired)));
    assert_eq!(f.counters(0), (5, 0, 0));
    assert_eq!(f.gateway.charge_count(), 0);
    assert!(f.orders.is_empty());
}

#[tokio::test(start_paused = true)]
async fn insufficient_stock_leaves_everything_untouched() {
    let f = fixture(600, &[10, 1]);
    let s = f.service.create_session();
    f.service.add_to_cart(s, f.products[0], 10).await.unwrap();
    f.service.add_to_cart(s, f.products[1], 2).await.unwrap();

    match f.service.begin_checkout(s).await {
        Err(CheckoutError::InsufficientStock {
            product_id,
            requested: 2,
            available: 1,
        }) => assert_eq!(product_id, f.products[1]),
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
    assert_eq!(f.counters(0), (10, 0, 0));
    assert_eq!(f.counters(1), (1, 0, 0));
    assert_eq!(f.service.status(s).await.unwrap().state, CheckoutState::Empty);
}

#[tokio::test(start_paused = true)]
async fn re_entering_checkout_keeps_the_single_hold() {
    let f = fixture(600, &[5]);
    let s = f.service.create_session();
    f.service.add_to_cart(s, f.products[0], 2).await.unwrap();

    f.service.begin_checkout(s).await.unwrap();
    time::advance(Duration::from_secs(100)).await;
    let again = f.service.begin_checkout(s).await.unwrap();

    assert_eq!(f.counters(0), (3, 2, 0));
    assert_eq!(again.remaining_secs, Some(500));
}

#[tokio::test(start_paused = true)]
async fn declined_payment_keeps_the_hold_and_the_original_deadline() {
    let f = fixture(60, &[5]);
    let s = f.service.create_session();
    f.service.add_to_cart(s, f.products[0], 2).await.unwrap();
    f.service.begin_checkout(s).await.unwrap();
    f.service.proceed_to_payment(s).await.unwrap();
    f.gateway.decline_next("insufficient funds");

    time::advance(Duration::from_secs(20)).await;
    match f.service.submit_payment(s, card_payment()).await {
        Err(CheckoutError::PaymentDeclined { reason, remaining }) => {
            assert!(reason.contains("insufficient funds"));
            assert_eq!(remaining, Duration::from_secs(40));
        }
        other => panic!("expected PaymentDeclined, got {other:?}"),
    }
    assert_eq!(f.service.status(s).await.unwrap().state, CheckoutState::Held);
    assert_eq!(f.counters(0), (3, 2, 0));
    assert!(f.orders.is_empty());

    // The re-armed timer still fires at the original deadline.
    time::advance(Duration::from_secs(41)).await;
    settle().await;
    assert_eq!(f.counters(0), (5, 0, 0));
    assert_eq!(f.service.status(s).await.unwrap().state, CheckoutState::Expired);
}

#[tokio::test(start_paused = true)]
async fn retry_after_decline_can_commit() {
    let f = fixture(60, &[5]);
    let s = f.service.create_session();
    f.service.add_to_cart(s, f.products[0], 1).await.unwrap();
    f.service.begin_checkout(s).await.unwrap();
    f.service.proceed_to_payment(s).await.unwrap();
    f.gateway.decline_next("do not honour");

    assert!(f.service.submit_payment(s, card_payment()).await.is_err());
    f.service.proceed_to_payment(s).await.unwrap();
    let order = f.service.submit_payment(s, card_payment()).await.unwrap();

    assert_eq!(f.gateway.charge_count(), 2);
    assert_eq!(f.counters(0), (4, 0, 1));
    assert_eq!(f.orders.len(), 1);
    time::advance(Duration::from_secs(120)).await;
    settle().await;
    assert_eq!(f.counters(0), (4, 0, 1));
    assert!(f.orders.find_by_id(order.id()).unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn cash_orders_skip_the_gateway() {
    let f = fixture(600, &[5]);
    let s = f.service.create_session();
    f.service.add_to_cart(s, f.products[0], 1).await.unwrap();
    f.service.begin_checkout(s).await.unwrap();
    f.service.proceed_to_payment(s).await.unwrap();

    let order = f.service.submit_payment(s, cash_payment()).await.unwrap();

    assert_eq!(order.payment_status(), PaymentStatus::AwaitingPayment);
    assert_eq!(f.gateway.charge_count(), 0);
    assert_eq!(f.counters(0), (4, 0, 1));
}

#[tokio::test(start_paused = true)]
async fn invalid_payment_details_keep_the_session_paying() {
    let f = fixture(600, &[5]);
    let s = f.service.create_session();
    f.service.add_to_cart(s, f.products[0], 1).await.unwrap();
    f.service.begin_checkout(s).await.unwrap();
    f.service.proceed_to_payment(s).await.unwrap();

    let bad = PaymentSubmission {
        card: None,
        ..card_payment()
    };
    assert!(matches!(
        f.service.submit_payment(s, bad).await,
        Err(CheckoutError::Domain(_))
    ));
    assert_eq!(f.service.status(s).await.unwrap().state, CheckoutState::Paying);
    assert_eq!(f.counters(0), (4, 1, 0));
}

#[tokio::test(start_paused = true)]
async fn side_effect_failures_do_not_undo_the_sale() {
    let f = build(
        Duration::from_secs(600),
        &[5],
        RecordingInvoices {
            fail: true,
            ..RecordingInvoices::default()
        },
        RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        },
    );
    let s = f.service.create_session();
    f.service.add_to_cart(s, f.products[0], 1).await.unwrap();
    f.service.begin_checkout(s).await.unwrap();
    f.service.proceed_to_payment(s).await.unwrap();

    let order = f.service.submit_payment(s, card_payment()).await.unwrap();

    assert!(f.orders.find_by_id(order.id()).unwrap().is_some());
    assert_eq!(f.counters(0), (4, 0, 1));
    assert!(f.invoices.sent.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn viewing_or_changing_the_cart_releases_the_hold() {
    let f = fixture(600, &[5, 5]);
    let s = f.service.create_session();
    f.service.add_to_cart(s, f.products[0], 2).await.unwrap();
    f.service.begin_checkout(s).await.unwrap();

    let cart = f.service.view_cart(s).await.unwrap();
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].available, 5);
    assert_eq!(cart.total, Money::from_minor(2_000));
    assert_eq!(f.service.status(s).await.unwrap().state, CheckoutState::Released);
    assert_eq!(f.counters(0), (5, 0, 0));

    f.service.begin_checkout(s).await.unwrap();
    f.service.proceed_to_payment(s).await.unwrap();
    f.service.add_to_cart(s, f.products[1], 1).await.unwrap();
    assert_eq!(f.service.status(s).await.unwrap().state, CheckoutState::Released);
    assert_eq!(f.counters(0), (5, 0, 0));

    // The cancelled timer stays quiet.
    time::advance(Duration::from_secs(601)).await;
    settle().await;
    assert_eq!(f.service.status(s).await.unwrap().state, CheckoutState::Released);
}

#[tokio::test(start_paused = true)]
async fn explicit_release_is_idempotent() {
    let f = fixture(600, &[5]);
    let s = f.service.create_session();
    f.service.add_to_cart(s, f.products[0], 4).await.unwrap();
    f.service.begin_checkout(s).await.unwrap();

    let first = f.service.release(s).await.unwrap();
    let second = f.service.release(s).await.unwrap();

    assert_eq!(first.state, CheckoutState::Released);
    assert_eq!(second.state, CheckoutState::Released);
    assert_eq!(f.counters(0), (5, 0, 0));
}

#[tokio::test(start_paused = true)]
async fn out_of_order_calls_are_rejected() {
    let f = fixture(600, &[5]);
    let s = f.service.create_session();

    assert!(matches!(f.service.begin_checkout(s).await, Err(CheckoutError::EmptyCart)));
    assert!(matches!(f.service.proceed_to_payment(s).await, Err(CheckoutError::NoActiveHold)));

    f.service.add_to_cart(s, f.products[0], 1).await.unwrap();
    f.service.begin_checkout(s).await.unwrap();
    assert!(matches!(
        f.service.submit_payment(s, card_payment()).await,
        Err(CheckoutError::InvalidTransition { state: "held", .. })
    ));

    let unknown = estore_core::SessionId::new();
    assert!(matches!(
        f.service.status(unknown).await,
        Err(CheckoutError::SessionNotFound(_))
    ));
    assert!(matches!(
        f.service.add_to_cart(s, ProductId::new(), 1).await,
        Err(CheckoutError::Domain(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn two_sessions_compete_for_the_last_units() {
    let f = fixture(600, &[3]);
    let (a, b) = (f.service.create_session(), f.service.create_session());
    f.service.add_to_cart(a, f.products[0], 2).await.unwrap();
    f.service.add_to_cart(b, f.products[0], 2).await.unwrap();

    f.service.begin_checkout(a).await.unwrap();
    assert!(matches!(
        f.service.begin_checkout(b).await,
        Err(CheckoutError::InsufficientStock { available: 1, .. })
    ));

    f.service.release(a).await.unwrap();
    f.service.begin_checkout(b).await.unwrap();
    assert_eq!(f.counters(0), (1, 2, 0));
}

/// Commit and expiry racing on real time: exactly one of them takes effect.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn commit_and_expiry_race_resolves_to_exactly_one_outcome() {
    for round in 0..40u64 {
        let f = build(
            Duration::from_millis(5),
            &[5],
            RecordingInvoices::default(),
            RecordingNotifier::default(),
        );
        let s = f.service.create_session();
        f.service.add_to_cart(s, f.products[0], 2).await.unwrap();
        f.service.begin_checkout(s).await.unwrap();
        f.service.proceed_to_payment(s).await.unwrap();

        time::sleep(Duration::from_micros(4_000 + (round % 4) * 500)).await;
        let result = f.service.submit_payment(s, cash_payment()).await;
        time::sleep(Duration::from_millis(20)).await;

        let (available, held, sold) = f.counters(0);
        assert_eq!(held, 0, "round {round}: nothing may stay held");
        match result {
            Ok(_) => {
                assert_eq!((available, sold), (3, 1), "round {round}");
                assert_eq!(f.orders.len(), 1);
            }
            Err(CheckoutError::HoldExpired) => {
                assert_eq!((available, sold), (5, 0), "round {round}");
                assert!(f.orders.is_empty());
            }
            Err(other) => panic!("round {round}: unexpected {other:?}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn failed_order_save_is_retried_without_a_second_charge() {
    let f = fixture(60, &[5]);
    let s = f.service.create_session();
    f.service.add_to_cart(s, f.products[0], 2).await.unwrap();
    f.service.begin_checkout(s).await.unwrap();
    f.service.proceed_to_payment(s).await.unwrap();
    f.orders.fail_next_saves(1);

    match f.service.submit_payment(s, card_payment()).await {
        Err(CheckoutError::Repository(RepositoryError::Unavailable(_))) => {}
        other => panic!("expected the store failure, got {other:?}"),
    }
    assert_eq!(f.gateway.charge_count(), 1);
    assert_eq!(f.service.status(s).await.unwrap().state, CheckoutState::Held);
    assert_eq!(f.counters(0), (3, 2, 0));

    f.service.proceed_to_payment(s).await.unwrap();
    let order = f.service.submit_payment(s, card_payment()).await.unwrap();

    assert_eq!(f.gateway.charge_count(), 1);
    assert_eq!(order.payment_status(), PaymentStatus::Paid);
    assert_eq!(f.orders.len(), 1);
    assert_eq!(f.counters(0), (3, 0, 1));
}

#[tokio::test(start_paused = true)]
async fn closing_a_session_releases_its_hold_and_forgets_it() {
    let f = fixture(600, &[5]);
    let s = f.service.create_session();
    let other = f.service.create_session();
    f.service.add_to_cart(s, f.products[0], 3).await.unwrap();
    f.service.begin_checkout(s).await.unwrap();
    assert_eq!(f.sessions.len(), 2);

    let last = f.service.close_session(s).await.unwrap();

    assert_eq!(last.state, CheckoutState::Released);
    assert_eq!(f.counters(0), (5, 0, 0));
    assert_eq!(f.sessions.len(), 1);
    assert!(matches!(f.service.status(s).await, Err(CheckoutError::SessionNotFound(_))));
    assert!(f.service.status(other).await.is_ok());

    // The cancelled timer has nothing left to release.
    time::advance(Duration::from_secs(700)).await;
    settle().await;
    assert_eq!(f.counters(0), (5, 0, 0));
}

#[tokio::test(start_paused = true)]
async fn idle_sweep_evicts_settled_sessions_only() {
    let f = fixture(600, &[5]);
    let idle = Duration::from_secs(1_800);

    let done = f.service.create_session();
    f.service.add_to_cart(done, f.products[0], 1).await.unwrap();
    f.service.begin_checkout(done).await.unwrap();
    f.service.proceed_to_payment(done).await.unwrap();
    f.service.submit_payment(done, cash_payment()).await.unwrap();

    let browsing = f.service.create_session();
    f.service.add_to_cart(browsing, f.products[0], 1).await.unwrap();

    let recent = f.service.create_session();
    assert_eq!(f.sessions.len(), 3);
    assert_eq!(f.service.evict_idle(idle), 0);

    time::advance(Duration::from_secs(1_000)).await;
    f.service.view_cart(recent).await.unwrap();
    time::advance(Duration::from_secs(900)).await;

    assert_eq!(f.service.evict_idle(idle), 2);
    assert_eq!(f.sessions.len(), 1);
    assert!(f.service.status(recent).await.is_ok());
    assert!(matches!(
        f.service.status(done).await,
        Err(CheckoutError::SessionNotFound(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn idle_sweep_keeps_sessions_holding_stock() {
    let f = fixture(7_200, &[5]);
    let s = f.service.create_session();
    f.service.add_to_cart(s, f.products[0], 2).await.unwrap();
    f.service.begin_checkout(s).await.unwrap();

    time::advance(Duration::from_secs(3_600)).await;

    assert_eq!(f.service.evict_idle(Duration::from_secs(60)), 0);
    assert_eq!(f.sessions.len(), 1);
    assert_eq!(f.counters(0), (3, 2, 0));
}
