//! Checkout and inventory reservation for the storefront.
//!
//! A checkout runs through these steps:
//! 1. Revalidate prices and stock, recompute totals
//! 2. Reserve stock (all lines or none)
//! 3. Capture payment for online orders
//! 4. Persist the order
//!
//! Any failure after step 2 releases the reserved stock before the error
//! is returned.

pub mod attempt;
pub mod catalog;
pub mod error;
pub mod lifecycle;
pub mod notifier;
pub mod orchestrator;
pub mod payment;
pub mod reservation;
pub mod state;

pub use attempt::CheckoutAttempt;
pub use catalog::Catalog;
pub use error::{CheckoutError, Result};
pub use lifecycle::{OrderLifecycle, StatusUpdate};
pub use notifier::{DEFAULT_CHANNEL_CAPACITY, Notifier};
pub use orchestrator::{CheckoutLine, CheckoutOrchestrator, CheckoutRequest, Customer};
pub use payment::{PaymentGateway, SimulatedPaymentGateway};
pub use reservation::{ReleaseLine, Reservation, ReservationEngine, ReservationLine};
pub use state::CheckoutState;
