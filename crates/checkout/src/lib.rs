//! Checkout: carts, time-bound stock holds, and turning a paid hold into an order.
//!
//! A session moves `Empty → Held → Paying → Committed`, or leaves the hold via
//! `Released` (shopper gave up) or `Expired` (the hold timer ran out).

pub mod cart;
pub mod error;
pub mod payment;
pub mod ports;
pub mod service;
pub mod session;
pub mod timer;

pub use cart::{Cart, CartLineView, CartView};
pub use error::{CheckoutError, CheckoutResult};
pub use payment::{CardDetails, PaymentError, PaymentGateway, PaymentSubmission};
pub use ports::{DeliveryError, InvoiceSender, TopProductsNotifier};
pub use service::{CheckoutPorts, CheckoutService, CheckoutSettings, HoldStatus};
pub use session::{ActiveHold, CheckoutSession, CheckoutState, InMemorySessionStore, SessionStore, SharedSession};
pub use timer::{TimerHandle, TimerState};
