//! Order document and related types.

mod entity;
mod state;
mod value_objects;

pub use entity::Order;
pub use state::OrderStatus;
pub use value_objects::{Address, Money, OrderItem, PaymentMethod, PaymentResult, ProductId};

use thiserror::Error;

/// Errors that can occur when moving an order through its lifecycle.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order is not in a state that allows the requested action.
    #[error("Cannot {action} order in {current} state")]
    InvalidStatusTransition {
        current: OrderStatus,
        action: &'static str,
    },

    /// The order has already left the warehouse.
    #[error("Cannot {action} shipped orders")]
    AlreadyShipped { action: &'static str },

    /// Payment was already recorded.
    #[error("Order is already paid")]
    AlreadyPaid,

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Order has no items.
    #[error("No order items")]
    NoItems,
}
