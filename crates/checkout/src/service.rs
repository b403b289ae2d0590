//! The checkout state machine.
//!
//! ```text
//! Empty ──begin──▶ Held ──proceed──▶ Paying ──submit ok──▶ Committed
//!                   ▲ │                 │ │
//!                   │ └────release──────┼─┴──▶ Released
//!                   └──── declined ─────┘
//!          Held/Paying ──deadline──▶ Expired
//! ```
//!
//! Every operation runs under the session's mutex, and the hold timer's callback
//! takes the same mutex before touching stock. Whoever takes the hold out of the
//! session releases or commits it; everyone after finds nothing to do.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use estore_core::{BatchId, Clock, DomainError, Money, OrderId, ProductId, SessionId};
use estore_events::RankedProduct;
use estore_inventory::{LineItem, ReservationCoordinator, StockError};
use estore_products::ProductCatalog;
use estore_sales::{Order, OrderLine, OrderRepository, PaymentMethod};

use crate::cart::{Cart, CartLineView, CartView};
use crate::error::{CheckoutError, CheckoutResult};
use crate::payment::{PaymentGateway, PaymentSubmission};
use crate::ports::{InvoiceSender, TopProductsNotifier};
use crate::session::{ActiveHold, CheckoutSession, CheckoutState, SessionStore, SharedSession};
use crate::timer::TimerHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    /// How long a hold survives without a commit.
    pub hold_window: Duration,
    /// Length of the ranking pushed to the display board after each sale.
    pub top_products_len: usize,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            hold_window: Duration::from_secs(600),
            top_products_len: 10,
        }
    }
}

/// Collaborators the state machine drives.
#[derive(Clone)]
pub struct CheckoutPorts {
    pub coordinator: ReservationCoordinator,
    pub catalog: Arc<dyn ProductCatalog>,
    pub orders: Arc<dyn OrderRepository>,
    pub sessions: Arc<dyn SessionStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub invoices: Arc<dyn InvoiceSender>,
    pub notifier: Arc<dyn TopProductsNotifier>,
    pub clock: Arc<dyn Clock>,
}

/// Snapshot of a session's checkout progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldStatus {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub state: CheckoutState,
    /// Lines under hold; empty unless `Held`/`Paying`.
    pub held: Vec<LineItem>,
    pub elapsed_secs: Option<u64>,
    pub remaining_secs: Option<u64>,
    pub window_secs: u64,
}

#[derive(Clone)]
pub struct CheckoutService {
    ports: CheckoutPorts,
    settings: CheckoutSettings,
}

impl CheckoutService {
    pub fn new(ports: CheckoutPorts, settings: CheckoutSettings) -> Self {
        Self { ports, settings }
    }

    pub fn settings(&self) -> &CheckoutSettings {
        &self.settings
    }

    pub fn coordinator(&self) -> &ReservationCoordinator {
        &self.ports.coordinator
    }

    pub fn create_session(&self) -> SessionId {
        let id = self.ports.sessions.create();
        info!(session_id = %id, "session created");
        id
    }

    pub async fn add_to_cart(
        &self,
        session_id: SessionId,
        product_id: ProductId,
        quantity: u32,
    ) -> CheckoutResult<CartView> {
        if self.ports.catalog.get(product_id).is_none() {
            return Err(DomainError::not_found(format!("product {product_id}")).into());
        }
        let shared = self.session(session_id)?;
        let mut session = shared.lock().await;
        session.touch();
        session.cart.add(product_id, quantity)?;
        self.end_hold(&mut session, "cart changed");
        debug!(session_id = %session_id, product_id = %product_id, quantity, "added to cart");
        Ok(self.cart_view(&session.cart))
    }

    pub async fn remove_from_cart(
        &self,
        session_id: SessionId,
        product_id: ProductId,
    ) -> CheckoutResult<CartView> {
        let shared = self.session(session_id)?;
        let mut session = shared.lock().await;
        session.touch();
        if !session.cart.remove(product_id) {
            return Err(DomainError::not_found(format!("cart line for product {product_id}")).into());
        }
        self.end_hold(&mut session, "cart changed");
        Ok(self.cart_view(&session.cart))
    }

    /// Show the cart. Leaving checkout for the cart page gives up any hold.
    pub async fn view_cart(&self, session_id: SessionId) -> CheckoutResult<CartView> {
        let shared = self.session(session_id)?;
        let mut session = shared.lock().await;
        session.touch();
        self.end_hold(&mut session, "returned to cart");
        Ok(self.cart_view(&session.cart))
    }

    /// Reserve the cart and start the hold timer.
    ///
    /// Re-entering while a hold is live keeps that hold. A hold whose deadline
    /// has passed is expired first and checkout restarts from the cart.
    pub async fn begin_checkout(&self, session_id: SessionId) -> CheckoutResult<HoldStatus> {
        let shared = self.session(session_id)?;
        let mut session = shared.lock().await;
        session.touch();
        let now = Instant::now();

        if session.state.is_live() {
            match &session.hold {
                Some(hold) if !hold.is_past_deadline(now) => {
                    debug!(session_id = %session_id, batch_id = %hold.batch_id, "checkout re-entered; hold kept");
                    return Ok(self.status_of(&session, now));
                }
                _ => self.expire_hold(&mut session),
            }
        }

        if session.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let items = session.cart.lines().to_vec();
        if let Err(err) = self.ports.coordinator.reserve_batch(&items) {
            info!(session_id = %session_id, error = %err, "checkout refused");
            return Err(err.into());
        }

        let batch_id = BatchId::new();
        let deadline = now + self.settings.hold_window;
        let timer = self.arm_expiry(&shared, batch_id, deadline);
        session.hold = Some(ActiveHold {
            batch_id,
            items,
            started_at: now,
            deadline,
            charged: false,
            timer,
        });
        session.state = CheckoutState::Held;
        info!(
            session_id = %session_id,
            batch_id = %batch_id,
            window_secs = self.settings.hold_window.as_secs(),
            "hold placed"
        );
        Ok(self.status_of(&session, now))
    }

    /// Move from the hold page to the payment page.
    pub async fn proceed_to_payment(&self, session_id: SessionId) -> CheckoutResult<HoldStatus> {
        let shared = self.session(session_id)?;
        let mut session = shared.lock().await;
        session.touch();
        let now = Instant::now();

        match session.state {
            CheckoutState::Held | CheckoutState::Paying => {}
            CheckoutState::Expired => return Err(CheckoutError::HoldExpired),
            _ => return Err(CheckoutError::NoActiveHold),
        }
        self.ensure_alive(&mut session, now)?;
        session.state = CheckoutState::Paying;
        Ok(self.status_of(&session, now))
    }

    /// Pay for the held batch and turn it into an order.
    ///
    /// The hold is claimed from its timer before the gateway is called, so an
    /// expiry can no longer release stock that is being paid for. A decline
    /// puts the timer back for the original deadline.
    pub async fn submit_payment(
        &self,
        session_id: SessionId,
        submission: PaymentSubmission,
    ) -> CheckoutResult<Order> {
        let shared = self.session(session_id)?;
        let mut session = shared.lock().await;
        session.touch();
        let now = Instant::now();

        match session.state {
            CheckoutState::Paying => {}
            CheckoutState::Expired => return Err(CheckoutError::HoldExpired),
            CheckoutState::Held => {
                return Err(CheckoutError::InvalidTransition {
                    state: "held",
                    action: "submit payment",
                });
            }
            _ => return Err(CheckoutError::NoActiveHold),
        }
        self.ensure_alive(&mut session, now)?;

        let created_at = self.ports.clock.now();
        submission.validate(created_at.date_naive())?;
        let items = session
            .hold
            .as_ref()
            .map(|h| h.items.clone())
            .ok_or(CheckoutError::NoActiveHold)?;
        let order = self.build_order(&items, &submission, created_at)?;

        let claimed = session.hold.as_ref().is_some_and(|h| h.timer.cancel());
        if !claimed {
            self.expire_hold(&mut session);
            return Err(CheckoutError::HoldExpired);
        }

        let already_charged = session.hold.as_ref().is_some_and(|h| h.charged);
        if let (PaymentMethod::Card, Some(card)) = (submission.payment_method, &submission.card) {
            if already_charged {
                info!(session_id = %session_id, "card already charged for this hold; gateway skipped");
            } else {
                if let Err(err) = self.ports.gateway.charge(&order, card).await {
                    warn!(session_id = %session_id, card = card.last4(), error = %err, "payment declined");
                    return Err(self.resume_hold(&shared, &mut session, err.reason()));
                }
                if let Some(hold) = session.hold.as_mut() {
                    hold.charged = true;
                }
            }
        }

        if let Err(err) = self.ports.orders.save(order.clone()) {
            error!(session_id = %session_id, order_id = %order.id(), error = %err, "order not saved");
            self.resume_hold(&shared, &mut session, err.to_string());
            return Err(err.into());
        }
        if let Some(hold) = session.hold.take() {
            if let Err(err) = self.ports.coordinator.commit_batch(&hold.items) {
                error!(session_id = %session_id, order_id = %order.id(), error = %err, "stock commit incomplete");
            }
        }
        session.state = CheckoutState::Committed {
            order_id: order.id(),
        };
        session.cart.clear();
        drop(session);

        info!(
            session_id = %session_id,
            order_id = %order.id(),
            total = %order.total_selling_price(),
            payment_method = ?order.payment_method(),
            "order committed"
        );
        self.after_commit(&order).await;
        Ok(order)
    }

    /// Give up the hold explicitly. A no-op when nothing is held.
    pub async fn release(&self, session_id: SessionId) -> CheckoutResult<HoldStatus> {
        let shared = self.session(session_id)?;
        let mut session = shared.lock().await;
        session.touch();
        self.end_hold(&mut session, "released by shopper");
        Ok(self.status_of(&session, Instant::now()))
    }

    /// End the session: release any hold and forget the session.
    pub async fn close_session(&self, session_id: SessionId) -> CheckoutResult<HoldStatus> {
        let shared = self.session(session_id)?;
        let status = {
            let mut session = shared.lock().await;
            self.end_hold(&mut session, "session closed");
            self.status_of(&session, Instant::now())
        };
        self.ports.sessions.remove(session_id);
        info!(session_id = %session_id, "session closed");
        Ok(status)
    }

    /// Forget sessions with no live hold and no activity for `idle`.
    ///
    /// Sessions locked by an in-flight call are left for the next sweep.
    pub fn evict_idle(&self, idle: Duration) -> usize {
        let now = Instant::now();
        let mut evicted = 0;
        for id in self.ports.sessions.ids() {
            let Some(shared) = self.ports.sessions.get(id) else {
                continue;
            };
            let Ok(session) = shared.try_lock() else {
                continue;
            };
            if session.is_idle(now, idle) && self.ports.sessions.remove(id).is_some() {
                evicted += 1;
            }
        }
        if evicted > 0 {
            info!(evicted, "idle sessions evicted");
        }
        evicted
    }

    pub async fn status(&self, session_id: SessionId) -> CheckoutResult<HoldStatus> {
        let shared = self.session(session_id)?;
        let session = shared.lock().await;
        Ok(self.status_of(&session, Instant::now()))
    }

    fn session(&self, id: SessionId) -> CheckoutResult<SharedSession> {
        self.ports
            .sessions
            .get(id)
            .ok_or(CheckoutError::SessionNotFound(id))
    }

    fn arm_expiry(&self, shared: &SharedSession, batch_id: BatchId, deadline: Instant) -> TimerHandle {
        let session = Arc::clone(shared);
        let coordinator = self.ports.coordinator.clone();
        TimerHandle::arm(deadline, move || expire_on_timer(session, coordinator, batch_id))
    }

    /// Fail with `HoldExpired` (expiring the hold) once the deadline has passed.
    fn ensure_alive(&self, session: &mut CheckoutSession, now: Instant) -> CheckoutResult<()> {
        match &session.hold {
            Some(hold) if !hold.is_past_deadline(now) => Ok(()),
            Some(_) => {
                self.expire_hold(session);
                Err(CheckoutError::HoldExpired)
            }
            None => Err(CheckoutError::NoActiveHold),
        }
    }

    fn expire_hold(&self, session: &mut CheckoutSession) {
        if let Some(hold) = session.hold.take() {
            hold.timer.cancel();
            self.release_items(session.id(), &hold);
            warn!(session_id = %session.id(), batch_id = %hold.batch_id, "hold expired");
        }
        session.state = CheckoutState::Expired;
    }

    /// Leave `Held`/`Paying` without a sale. If the timer fired first the
    /// session ends `Expired`, otherwise `Released`.
    fn end_hold(&self, session: &mut CheckoutSession, reason: &'static str) {
        let Some(hold) = session.hold.take() else {
            return;
        };
        let next = if hold.timer.cancel() {
            CheckoutState::Released
        } else {
            CheckoutState::Expired
        };
        self.release_items(session.id(), &hold);
        session.state = next;
        info!(session_id = %session.id(), batch_id = %hold.batch_id, state = next.name(), reason, "hold ended");
    }

    fn release_items(&self, session_id: SessionId, hold: &ActiveHold) {
        report_orphaned_charge(session_id, hold);
        if let Err(err) = self.ports.coordinator.release_batch(&hold.items) {
            error!(session_id = %session_id, batch_id = %hold.batch_id, error = %err, "hold release incomplete");
        }
    }

    /// Back to `Held` after a failed payment, keeping the original deadline.
    fn resume_hold(&self, shared: &SharedSession, session: &mut CheckoutSession, reason: String) -> CheckoutError {
        let now = Instant::now();
        let window = self.settings.hold_window;
        let Some(hold) = session.hold.as_mut() else {
            return CheckoutError::NoActiveHold;
        };
        if hold.is_past_deadline(now) {
            self.expire_hold(session);
            return CheckoutError::HoldExpired;
        }
        hold.timer = self.arm_expiry(shared, hold.batch_id, hold.deadline);
        let remaining = hold.remaining(now, window);
        session.state = CheckoutState::Held;
        CheckoutError::PaymentDeclined { reason, remaining }
    }

    fn build_order(
        &self,
        items: &[LineItem],
        submission: &PaymentSubmission,
        created_at: DateTime<Utc>,
    ) -> CheckoutResult<Order> {
        let lines = items
            .iter()
            .map(|item| {
                self.ports
                    .catalog
                    .get(item.product_id)
                    .map(|product| OrderLine::snapshot(&product, item.quantity))
                    .ok_or_else(|| DomainError::not_found(format!("product {}", item.product_id)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Order::new(
            OrderId::new(),
            submission.customer_email.trim(),
            lines,
            submission.payment_method,
            submission.shipping_method,
            created_at,
        )?)
    }

    async fn after_commit(&self, order: &Order) {
        if let Err(err) = self.ports.invoices.send_invoice(order).await {
            error!(order_id = %order.id(), error = %err, "invoice not sent");
        }
        match self.ranking() {
            Ok(ranking) => {
                if let Err(err) = self.ports.notifier.publish(ranking) {
                    error!(order_id = %order.id(), error = %err, "top products not published");
                }
            }
            Err(err) => error!(order_id = %order.id(), error = %err, "top products unavailable"),
        }
    }

    fn ranking(&self) -> Result<Vec<RankedProduct>, StockError> {
        let top = self
            .ports
            .coordinator
            .ledger()
            .top_selling(self.settings.top_products_len)?;
        Ok(top
            .into_iter()
            .map(|rec| RankedProduct {
                product_id: rec.product_id,
                name: self
                    .ports
                    .catalog
                    .get(rec.product_id)
                    .map(|p| p.name().to_string())
                    .unwrap_or_else(|| rec.product_id.to_string()),
                sale_count: rec.sold,
            })
            .collect())
    }

    fn cart_view(&self, cart: &Cart) -> CartView {
        let ledger = self.ports.coordinator.ledger();
        let lines: Vec<CartLineView> = cart
            .lines()
            .iter()
            .filter_map(|item| {
                let product = self.ports.catalog.get(item.product_id)?;
                Some(CartLineView {
                    product_id: item.product_id,
                    name: product.name().to_string(),
                    quantity: item.quantity,
                    unit_price: product.selling_price(),
                    line_total: product.selling_price().times(item.quantity),
                    available: ledger.snapshot(item.product_id).map_or(0, |r| r.available),
                })
            })
            .collect();
        let total: Money = lines.iter().map(|l| l.line_total).sum();
        CartView { lines, total }
    }

    fn status_of(&self, session: &CheckoutSession, now: Instant) -> HoldStatus {
        let window = self.settings.hold_window;
        let hold = session.hold.as_ref();
        HoldStatus {
            session_id: session.id(),
            state: session.state,
            held: hold.map(|h| h.items.clone()).unwrap_or_default(),
            elapsed_secs: hold.map(|h| h.elapsed(now, window).as_secs()),
            remaining_secs: hold.map(|h| h.remaining(now, window).as_secs()),
            window_secs: window.as_secs(),
        }
    }
}

/// Timer callback: expire the batch if it is still the session's hold.
async fn expire_on_timer(shared: SharedSession, coordinator: ReservationCoordinator, batch_id: BatchId) {
    let mut session = shared.lock().await;
    let Some(hold) = session.hold.take_if(|h| h.batch_id == batch_id) else {
        debug!(session_id = %session.id(), batch_id = %batch_id, "timer fired for a settled batch");
        return;
    };
    report_orphaned_charge(session.id(), &hold);
    if let Err(err) = coordinator.release_batch(&hold.items) {
        error!(session_id = %session.id(), batch_id = %batch_id, error = %err, "expiry release incomplete");
    }
    session.state = CheckoutState::Expired;
    warn!(session_id = %session.id(), batch_id = %batch_id, "hold expired; stock released");
}

/// A charged hold ending without an order needs a manual refund.
fn report_orphaned_charge(session_id: SessionId, hold: &ActiveHold) {
    if hold.charged {
        error!(session_id = %session_id, batch_id = %hold.batch_id, "hold ended after a card charge; no order was recorded");
    }
}
