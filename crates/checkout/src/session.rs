//! Per-shopper checkout sessions and where they live.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;

use estore_core::{BatchId, OrderId, SessionId};
use estore_inventory::LineItem;

use crate::cart::Cart;
use crate::timer::TimerHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckoutState {
    Empty,
    Held,
    Paying,
    Committed { order_id: OrderId },
    Released,
    Expired,
}

impl CheckoutState {
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutState::Empty => "empty",
            CheckoutState::Held => "held",
            CheckoutState::Paying => "paying",
            CheckoutState::Committed { .. } => "committed",
            CheckoutState::Released => "released",
            CheckoutState::Expired => "expired",
        }
    }

    /// `Held` or `Paying`: a batch is reserved and its timer is running.
    pub fn is_live(&self) -> bool {
        matches!(self, CheckoutState::Held | CheckoutState::Paying)
    }
}

/// The reserved batch behind a live session.
#[derive(Debug)]
pub struct ActiveHold {
    pub batch_id: BatchId,
    pub items: Vec<LineItem>,
    pub started_at: Instant,
    pub deadline: Instant,
    /// Set once the card was charged for this batch. A retry after a failed
    /// order save must not charge again.
    pub charged: bool,
    pub(crate) timer: TimerHandle,
}

impl ActiveHold {
    pub fn is_past_deadline(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// Time left, within `[0, window]`.
    pub fn remaining(&self, now: Instant, window: Duration) -> Duration {
        self.deadline.saturating_duration_since(now).min(window)
    }

    /// Time since the hold was placed, within `[0, window]`.
    pub fn elapsed(&self, now: Instant, window: Duration) -> Duration {
        now.saturating_duration_since(self.started_at).min(window)
    }
}

#[derive(Debug)]
pub struct CheckoutSession {
    id: SessionId,
    pub cart: Cart,
    pub state: CheckoutState,
    pub hold: Option<ActiveHold>,
    touched: Instant,
}

impl CheckoutSession {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            cart: Cart::new(),
            state: CheckoutState::Empty,
            hold: None,
            touched: Instant::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Last time a shopper action reached this session.
    pub fn touched(&self) -> Instant {
        self.touched
    }

    pub fn touch(&mut self) {
        self.touched = Instant::now();
    }

    /// No live hold and no activity for at least `idle`.
    pub fn is_idle(&self, now: Instant, idle: Duration) -> bool {
        !self.state.is_live() && now.saturating_duration_since(self.touched) >= idle
    }
}

pub type SharedSession = Arc<Mutex<CheckoutSession>>;

/// Keyed storage of checkout sessions.
pub trait SessionStore: Send + Sync {
    fn create(&self) -> SessionId;

    fn get(&self, id: SessionId) -> Option<SharedSession>;

    /// Snapshot of every stored id.
    fn ids(&self) -> Vec<SessionId>;

    /// Forget a session. Its hold, if any, still expires on its own timer.
    fn remove(&self, id: SessionId) -> Option<SharedSession>;
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SharedSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Each map operation is a single insert/lookup/remove, so a poisoned map is
// still consistent and is used as is.
impl SessionStore for InMemorySessionStore {
    fn create(&self) -> SessionId {
        let id = SessionId::new();
        let session = Arc::new(Mutex::new(CheckoutSession::new(id)));
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, session);
        id
    }

    fn get(&self, id: SessionId) -> Option<SharedSession> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    fn ids(&self) -> Vec<SessionId> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    fn remove(&self, id: SessionId) -> Option<SharedSession> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
    }
}
