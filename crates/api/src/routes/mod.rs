//! HTTP route handlers.

pub mod admin;
pub mod checkout;
pub mod events;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use ::checkout::{Catalog, CheckoutOrchestrator, Notifier, OrderLifecycle, SimulatedPaymentGateway};
use domain::{NotificationId, Order, OrderId};
use serde::Serialize;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub store: S,
    pub orchestrator: CheckoutOrchestrator<S, SimulatedPaymentGateway>,
    pub lifecycle: OrderLifecycle<S>,
    pub catalog: Catalog<S>,
    pub notifier: Notifier<S>,
}

// -- Shared response types --

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderMessageResponse {
    pub message: String,
    pub order: Order,
}

/// Order ids that do not parse cannot name an existing order.
fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    OrderId::parse(id).map_err(|_| ApiError::NotFound("Order not found".to_string()))
}

fn parse_notification_id(id: &str) -> Result<NotificationId, ApiError> {
    NotificationId::parse(id).map_err(|_| ApiError::NotFound("Notification not found".to_string()))
}
