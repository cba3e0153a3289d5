//! Payment gateway seam and a simulated implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use domain::{Money, OrderId, PaymentResult, UserId};

use crate::error::{CheckoutError, Result};

/// Charges customers for online orders.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges `amount` for an order.
    ///
    /// Returns [`CheckoutError::PaymentFailed`] if the charge is declined.
    async fn charge(&self, order_id: OrderId, customer: UserId, amount: Money)
    -> Result<PaymentResult>;
}

#[derive(Debug, Default)]
struct SimulatedState {
    fail_on_charge: AtomicBool,
    next_id: AtomicU64,
}

/// Payment gateway that approves (or declines) every charge without I/O.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPaymentGateway {
    state: Arc<SimulatedState>,
}

impl SimulatedPaymentGateway {
    /// Creates a gateway that approves every charge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway that declines every charge.
    pub fn declining() -> Self {
        let gateway = Self::new();
        gateway.set_fail_on_charge(true);
        gateway
    }

    /// Configures the gateway to decline subsequent charges.
    pub fn set_fail_on_charge(&self, fail: bool) {
        self.state.fail_on_charge.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of approved charges.
    pub fn charge_count(&self) -> u64 {
        self.state.next_id.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    async fn charge(
        &self,
        order_id: OrderId,
        customer: UserId,
        amount: Money,
    ) -> Result<PaymentResult> {
        if self.state.fail_on_charge.load(Ordering::SeqCst) {
            tracing::warn!(%order_id, %customer, %amount, "payment declined");
            return Err(CheckoutError::PaymentFailed("Payment declined".to_string()));
        }

        let seq = self.state.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(%order_id, %customer, %amount, "payment captured");

        Ok(PaymentResult {
            id: format!("PAY-{seq:04}"),
            status: "COMPLETED".to_string(),
            update_time: Utc::now(),
        })
    }
}
