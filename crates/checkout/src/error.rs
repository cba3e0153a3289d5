//! Checkout error types.

use domain::{NotificationId, OrderError, OrderId, ProductId};
use store::StoreError;
use thiserror::Error;

use crate::state::CheckoutState;

/// Errors that can occur while checking out or managing orders.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request contained no items.
    #[error("No order items")]
    EmptyOrder,

    /// A line asked for zero units.
    #[error("Invalid quantity {quantity} for product {product}")]
    InvalidQuantity { product: ProductId, quantity: u32 },

    /// The discount is negative or exceeds the order total.
    #[error("Invalid discount")]
    InvalidDiscount,

    /// A requested product does not exist.
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    /// The client's unit price differs from the catalogue price.
    #[error("Price mismatch for {name}")]
    PriceMismatch { product: ProductId, name: String },

    /// Not enough units are in stock.
    #[error("Insufficient stock for {name}")]
    InsufficientStock {
        product: ProductId,
        name: String,
        available: u32,
    },

    /// The client's total differs from the server-computed total.
    #[error("Price mismatch, please review your order.")]
    TotalMismatch,

    /// A line or order total does not fit in the money representation.
    #[error("Order total is too large")]
    AmountOverflow,

    /// The payment provider declined the charge.
    #[error("Payment failed, order not completed")]
    PaymentFailed(String),

    /// No order with that ID exists (or the caller does not own it).
    #[error("Order not found")]
    OrderNotFound(OrderId),

    /// No notification with that ID exists.
    #[error("Notification not found")]
    NotificationNotFound(NotificationId),

    /// A catalogue price was negative.
    #[error("Invalid price for product {0}")]
    InvalidPrice(ProductId),

    /// Restock quantity must be positive.
    #[error("Invalid quantity")]
    InvalidRestockQuantity,

    /// A checkout attempt tried to move to a state it cannot reach.
    #[error("Invalid checkout transition from {from} to {to}")]
    InvalidTransition {
        from: CheckoutState,
        to: CheckoutState,
    },

    /// The order refused a lifecycle transition.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// The document store failed.
    #[error("Store unavailable: {0}")]
    Store(#[from] StoreError),
}

impl CheckoutError {
    /// Returns true for errors raised before any stock was touched.
    ///
    /// These never need compensation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CheckoutError::EmptyOrder
                | CheckoutError::InvalidQuantity { .. }
                | CheckoutError::InvalidDiscount
                | CheckoutError::ProductNotFound(_)
                | CheckoutError::PriceMismatch { .. }
                | CheckoutError::InsufficientStock { .. }
                | CheckoutError::TotalMismatch
                | CheckoutError::AmountOverflow
        )
    }

    /// Returns a short, stable label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            CheckoutError::EmptyOrder => "empty_order",
            CheckoutError::InvalidQuantity { .. } => "invalid_quantity",
            CheckoutError::InvalidDiscount => "invalid_discount",
            CheckoutError::ProductNotFound(_) => "product_not_found",
            CheckoutError::PriceMismatch { .. } => "price_mismatch",
            CheckoutError::InsufficientStock { .. } => "insufficient_stock",
            CheckoutError::TotalMismatch => "total_mismatch",
            CheckoutError::AmountOverflow => "amount_overflow",
            CheckoutError::PaymentFailed(_) => "payment_failed",
            CheckoutError::OrderNotFound(_) => "order_not_found",
            CheckoutError::NotificationNotFound(_) => "notification_not_found",
            CheckoutError::InvalidPrice(_) => "invalid_price",
            CheckoutError::InvalidRestockQuantity => "invalid_restock_quantity",
            CheckoutError::InvalidTransition { .. } => "invalid_transition",
            CheckoutError::Order(_) => "order",
            CheckoutError::Store(_) => "store_unavailable",
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
