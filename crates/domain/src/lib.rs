//! Domain model for the storefront checkout service.
//!
//! This crate holds the pure types shared by the stores, the checkout
//! engine and the HTTP layer:
//! - Money, product identifiers, addresses and payment methods
//! - The order document with its tagged status state machine
//! - Server-side pricing rules and order totals
//! - Admin notifications and live broadcast events

pub mod notification;
pub mod order;
pub mod pricing;
pub mod product;

pub use common::{NotificationId, OrderId, UserId};
pub use notification::{LiveEvent, Notification, NotificationKind};
pub use order::{
    Address, Money, Order, OrderError, OrderItem, OrderStatus, PaymentMethod, PaymentResult,
    ProductId,
};
pub use pricing::{OrderTotals, PricingPolicy};
pub use product::Product;
