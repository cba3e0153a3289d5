//! Inventory reservation engine.
//!
//! Reserving stock means decrementing it: there is no separate "held"
//! quantity. Every change goes through the store's single-step conditional
//! decrement or increment, so concurrent checkouts can never drive stock
//! below zero.

use domain::{Money, PricingPolicy, Product, ProductId};
use store::{StockUpdate, Store};

use crate::error::{CheckoutError, Result};
use crate::notifier::Notifier;

/// A line to reserve, with the unit price the caller expects to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationLine {
    pub product: ProductId,
    pub quantity: u32,
    pub expected_price: Money,
}

impl ReservationLine {
    pub fn new(product: impl Into<ProductId>, quantity: u32, expected_price: Money) -> Self {
        Self {
            product: product.into(),
            quantity,
            expected_price,
        }
    }
}

/// A quantity of a product to put back into stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseLine {
    pub product: ProductId,
    pub quantity: u32,
}

impl ReleaseLine {
    pub fn new(product: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product: product.into(),
            quantity,
        }
    }
}

/// Stock held by one checkout attempt.
///
/// Not `Clone`: releasing consumes the reservation, so it can be released
/// at most once. A reservation that is simply dropped stays decremented,
/// which is what happens once its order has been persisted.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a reservation must be released or committed"]
pub struct Reservation {
    lines: Vec<ReleaseLine>,
}

impl Reservation {
    /// The lines that were decremented.
    pub fn lines(&self) -> &[ReleaseLine] {
        &self.lines
    }

    /// Total units held across all lines.
    pub fn total_units(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Keeps the stock decremented for good.
    pub fn commit(self) {
        tracing::debug!(units = self.total_units(), "reservation committed");
    }
}

/// Validates and atomically reserves stock for order lines.
#[derive(Clone)]
pub struct ReservationEngine<S> {
    store: S,
    notifier: Notifier<S>,
    policy: PricingPolicy,
}

impl<S: Store> ReservationEngine<S> {
    /// Creates a new reservation engine.
    pub fn new(store: S, notifier: Notifier<S>, policy: PricingPolicy) -> Self {
        Self {
            store,
            notifier,
            policy,
        }
    }

    /// Reserves every line or none of them.
    ///
    /// Lines are validated in order (existence, exact price, stock). Then
    /// each is decremented; if any decrement fails, those already applied
    /// are put back before the error is returned. Low-stock alerts are
    /// raised only once the whole batch has been applied.
    #[tracing::instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn reserve(&self, lines: &[ReservationLine]) -> Result<Reservation> {
        let mut names = Vec::with_capacity(lines.len());
        for line in lines {
            let product = self.check_line(line).await?;
            names.push(product.name);
        }

        let mut applied: Vec<(ReleaseLine, Product)> = Vec::with_capacity(lines.len());
        for (line, name) in lines.iter().zip(names) {
            let failure = match self.store.decrement_stock(&line.product, line.quantity).await {
                Ok(StockUpdate::Applied(product)) => {
                    applied.push((ReleaseLine::new(line.product.clone(), line.quantity), product));
                    continue;
                }
                Ok(StockUpdate::Insufficient { available }) => CheckoutError::InsufficientStock {
                    product: line.product.clone(),
                    name,
                    available,
                },
                Ok(StockUpdate::NotFound) => CheckoutError::ProductNotFound(line.product.clone()),
                Err(e) => CheckoutError::Store(e),
            };

            tracing::warn!(
                product_id = %line.product,
                error = %failure,
                applied = applied.len(),
                "decrement failed mid-batch, rolling back"
            );
            let undo: Vec<ReleaseLine> = applied.into_iter().map(|(line, _)| line).collect();
            if let Err(e) = self.increment_all(&undo).await {
                tracing::error!(error = %e, "failed to roll back partial reservation");
            }
            return Err(failure);
        }

        let reservation = Reservation {
            lines: applied.iter().map(|(line, _)| line.clone()).collect(),
        };
        metrics::counter!("inventory_units_reserved_total").increment(reservation.total_units());

        for (_, product) in &applied {
            if self.policy.is_low_stock(product.stock) {
                self.notifier.low_stock(product).await;
            }
        }

        tracing::info!(units = reservation.total_units(), "stock reserved");
        Ok(reservation)
    }

    /// Returns every unit held by `reservation` to stock.
    #[tracing::instrument(skip(self, reservation), fields(units = reservation.total_units()))]
    pub async fn release(&self, reservation: Reservation) -> Result<()> {
        self.increment_all(&reservation.lines).await
    }

    /// Puts arbitrary quantities back into stock.
    ///
    /// Used for abandoned checkouts and cancelled orders. Calling it twice
    /// with the same lines credits the stock twice.
    #[tracing::instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn restore(&self, lines: &[ReleaseLine]) -> Result<()> {
        self.increment_all(lines).await
    }

    async fn check_line(&self, line: &ReservationLine) -> Result<Product> {
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

        if product.price != line.expected_price {
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

        Ok(product)
    }

    /// Applies every increment, skipping products that no longer exist.
    ///
    /// Keeps going past store errors and reports the first one.
    async fn increment_all(&self, lines: &[ReleaseLine]) -> Result<()> {
        let mut first_error = None;
        let mut released = 0u64;

        for line in lines.iter().rev() {
            match self.store.increment_stock(&line.product, line.quantity).await {
                Ok(Some(_)) => released += u64::from(line.quantity),
                Ok(None) => {
                    tracing::warn!(product_id = %line.product, "product gone, skipping restore");
                }
                Err(e) => {
                    tracing::error!(product_id = %line.product, error = %e, "restore failed");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        metrics::counter!("inventory_units_released_total").increment(released);
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
