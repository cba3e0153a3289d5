//! Checkout orchestrator: turns a cart into a persisted order.

use std::time::Instant;

use chrono::Utc;
use domain::{
    Address, Money, Order, OrderItem, OrderTotals, PaymentMethod, PricingPolicy, ProductId, UserId,
};
use serde::Deserialize;
use store::Store;

use crate::attempt::CheckoutAttempt;
use crate::error::{CheckoutError, Result};
use crate::notifier::Notifier;
use crate::payment::PaymentGateway;
use crate::reservation::{ReleaseLine, Reservation, ReservationEngine, ReservationLine};
use crate::state::CheckoutState;

/// The verified customer placing an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: UserId,
    pub name: String,
}

/// One cart line as submitted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutLine {
    pub product: ProductId,
    pub quantity: u32,
    /// Unit price the client saw, in cents.
    pub price: Money,
}

/// A checkout request as submitted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(rename = "orderItems")]
    pub items: Vec<CheckoutLine>,
    pub shipping_address: Address,
    #[serde(default)]
    pub billing_address: Option<Address>,
    pub payment_method: PaymentMethod,
    /// Total the client expects to pay, in cents.
    pub total_price: Money,
    #[serde(default)]
    pub discount: Money,
}

/// Everything derived from a request once it has passed validation.
struct ValidatedCheckout {
    lines: Vec<ReservationLine>,
    items: Vec<OrderItem>,
    totals: OrderTotals,
}

/// Drives a checkout through validation, reservation, payment and persistence.
///
/// Any failure after stock has been reserved releases that stock exactly
/// once before the error is returned.
pub struct CheckoutOrchestrator<S, P> {
    store: S,
    engine: ReservationEngine<S>,
    notifier: Notifier<S>,
    payment: P,
    policy: PricingPolicy,
}

impl<S, P> CheckoutOrchestrator<S, P>
where
    S: Store + Clone,
    P: PaymentGateway,
{
    /// Creates a new checkout orchestrator.
    pub fn new(store: S, notifier: Notifier<S>, payment: P, policy: PricingPolicy) -> Self {
        let engine = ReservationEngine::new(store.clone(), notifier.clone(), policy);
        Self {
            store,
            engine,
            notifier,
            payment,
            policy,
        }
    }

    /// Returns the pricing policy in force.
    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Places an order for `customer`.
    pub async fn checkout(&self, customer: &Customer, request: CheckoutRequest) -> Result<Order> {
        self.execute(customer, request).await.1
    }

    /// Places an order and also returns the trace of the attempt.
    #[tracing::instrument(skip(self, customer, request), fields(user_id = %customer.id, items = request.items.len()))]
    pub async fn execute(
        &self,
        customer: &Customer,
        request: CheckoutRequest,
    ) -> (CheckoutAttempt, Result<Order>) {
        metrics::counter!("checkout_attempts_total").increment(1);
        let started = Instant::now();

        let mut attempt = CheckoutAttempt::new();
        let result = self.run(&mut attempt, customer, request).await;

        match &result {
            Ok(order) => {
                metrics::counter!("checkout_completed_total").increment(1);
                tracing::info!(
                    order_id = %order.id(),
                    state = %attempt.state(),
                    total = %order.totals().total_price,
                    "checkout completed"
                );
            }
            Err(e) => {
                metrics::counter!("checkout_rejected_total", "reason" => e.reason()).increment(1);
                if attempt.state() == CheckoutState::RolledBack {
                    metrics::counter!("checkout_rolled_back_total").increment(1);
                }
                tracing::warn!(error = %e, state = %attempt.state(), "checkout failed");
            }
        }
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());

        (attempt, result)
    }

    /// Returns stock held by an abandoned client-side checkout.
    pub async fn restore(&self, lines: &[ReleaseLine]) -> Result<()> {
        self.engine.restore(lines).await
    }

    async fn run(
        &self,
        attempt: &mut CheckoutAttempt,
        customer: &Customer,
        request: CheckoutRequest,
    ) -> Result<Order> {
        attempt.advance(CheckoutState::Validating)?;

        let validated = match self.validate(&request).await {
            Ok(validated) => validated,
            Err(e) => return Err(Self::reject(attempt, e)),
        };

        let mut order = match Order::place(
            customer.id,
            validated.items,
            request.shipping_address,
            request.billing_address,
            request.payment_method,
            validated.totals,
        ) {
            Ok(order) => order,
            Err(e) => return Err(Self::reject(attempt, e.into())),
        };

        let reservation = match self.engine.reserve(&validated.lines).await {
            Ok(reservation) => reservation,
            Err(e) => return Err(Self::reject(attempt, e)),
        };
        attempt.advance(CheckoutState::Reserved)?;

        if order.payment_method() == PaymentMethod::OnlinePayment {
            let charged = self
                .payment
                .charge(order.id(), customer.id, order.totals().total_price)
                .await
                .and_then(|result| {
                    order
                        .mark_paid(result, Utc::now())
                        .map_err(CheckoutError::from)
                });
            if let Err(e) = charged {
                return Err(self.roll_back(attempt, reservation, e).await);
            }
        }

        if let Err(e) = self.store.save_order(&order).await {
            return Err(self.roll_back(attempt, reservation, e.into()).await);
        }
        reservation.commit();
        attempt.advance(CheckoutState::Persisted)?;

        let terminal = if order.is_paid() {
            CheckoutState::Paid
        } else {
            CheckoutState::PendingCod
        };
        attempt.advance(terminal)?;

        self.notifier.new_order(order.id(), &customer.name);
        Ok(order)
    }

    /// Revalidates prices and stock and recomputes the totals server-side.
    async fn validate(&self, request: &CheckoutRequest) -> Result<ValidatedCheckout> {
        if request.items.is_empty() {
            return Err(CheckoutError::EmptyOrder);
        }
        if request.discount.is_negative() {
            return Err(CheckoutError::InvalidDiscount);
        }

        let mut lines = Vec::with_capacity(request.items.len());
        let mut items = Vec::with_capacity(request.items.len());
        let mut items_price = Money::zero();

        for line in &request.items {
            if line.quantity == 0 {
                return Err(CheckoutError::InvalidQuantity {
                    product: line.product.clone(),
                    quantity: line.quantity,
                });
            }

            let product = self
                .store
                .find_product(&line.product)
                .await?
                .ok_or_else(|| CheckoutError::ProductNotFound(line.product.clone()))?;

            if product.price != line.price {
                return Err(CheckoutError::PriceMismatch {
                    product: product.id,
                    name: product.name,
                });
            }
            if !product.has_stock_for(line.quantity) {
                return Err(CheckoutError::InsufficientStock {
                    product: product.id,
                    name: product.name,
                    available: product.stock,
                });
            }

            let item = OrderItem::new(product.id.clone(), product.name, line.quantity, product.price);
            items_price = item
                .checked_line_total()
                .and_then(|line_total| items_price.checked_add(line_total))
                .ok_or(CheckoutError::AmountOverflow)?;
            lines.push(ReservationLine::new(product.id, line.quantity, product.price));
            items.push(item);
        }

        let totals = self
            .policy
            .checked_totals(items_price, request.discount)
            .ok_or(CheckoutError::AmountOverflow)?;
        if totals.total_price.is_negative() {
            return Err(CheckoutError::InvalidDiscount);
        }
        if totals.total_price != request.total_price {
            tracing::debug!(
                expected = %totals.total_price,
                submitted = %request.total_price,
                "client total differs"
            );
            return Err(CheckoutError::TotalMismatch);
        }

        Ok(ValidatedCheckout {
            lines,
            items,
            totals,
        })
    }

    fn reject(attempt: &mut CheckoutAttempt, error: CheckoutError) -> CheckoutError {
        if let Err(e) = attempt.fail(CheckoutState::Rejected, &error) {
            tracing::error!(error = %e, "could not record rejection");
        }
        error
    }

    /// Releases the reservation and ends the attempt as rolled back.
    async fn roll_back(
        &self,
        attempt: &mut CheckoutAttempt,
        reservation: Reservation,
        error: CheckoutError,
    ) -> CheckoutError {
        tracing::warn!(error = %error, units = reservation.total_units(), "rolling back reservation");

        if let Err(e) = self.engine.release(reservation).await {
            tracing::error!(error = %e, "failed to release reservation");
        }
        attempt.record_release();

        if let Err(e) = attempt.fail(CheckoutState::RolledBack, &error) {
            tracing::error!(error = %e, "could not record rollback");
        }
        error
    }
}
