//! Order lifecycle after checkout: fulfilment, cancellation and reads.

use chrono::Utc;
use domain::{Address, Order, OrderId, UserId};
use store::Store;

use crate::error::{CheckoutError, Result};
use crate::notifier::Notifier;
use crate::reservation::{ReleaseLine, ReservationEngine};

/// Status an admin may move an order to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    Shipped,
    Delivered,
    Cancelled,
}

impl StatusUpdate {
    /// Parses a status name as sent by the admin dashboard.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Shipped" => Some(StatusUpdate::Shipped),
            "Delivered" => Some(StatusUpdate::Delivered),
            "Cancelled" => Some(StatusUpdate::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusUpdate::Shipped => "Shipped",
            StatusUpdate::Delivered => "Delivered",
            StatusUpdate::Cancelled => "Cancelled",
        }
    }
}

/// Moves persisted orders through fulfilment and serves order reads.
#[derive(Clone)]
pub struct OrderLifecycle<S> {
    store: S,
    engine: ReservationEngine<S>,
    notifier: Notifier<S>,
}

impl<S: Store + Clone> OrderLifecycle<S> {
    /// Creates a new lifecycle service.
    pub fn new(store: S, engine: ReservationEngine<S>, notifier: Notifier<S>) -> Self {
        Self {
            store,
            engine,
            notifier,
        }
    }

    /// Applies an admin status change.
    pub async fn update_status(&self, id: OrderId, status: StatusUpdate) -> Result<Order> {
        match status {
            StatusUpdate::Shipped => self.ship(id).await,
            StatusUpdate::Delivered => self.deliver(id).await,
            StatusUpdate::Cancelled => self.cancel(id).await,
        }
    }

    /// Marks a pending order as shipped.
    #[tracing::instrument(skip(self))]
    pub async fn ship(&self, id: OrderId) -> Result<Order> {
        let mut order = self.load(id).await?;
        order.ship(Utc::now())?;
        self.store.save_order(&order).await?;

        tracing::info!("order shipped");
        self.notifier
            .order_event(format!("Order #{id} has been shipped"))
            .await;
        Ok(order)
    }

    /// Marks a shipped order as delivered.
    #[tracing::instrument(skip(self))]
    pub async fn deliver(&self, id: OrderId) -> Result<Order> {
        let mut order = self.load(id).await?;
        order.deliver(Utc::now())?;
        self.store.save_order(&order).await?;

        tracing::info!("order delivered");
        self.notifier
            .order_event(format!("Order #{id} has been delivered"))
            .await;
        Ok(order)
    }

    /// Cancels any customer's pending order and returns its items to stock.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, id: OrderId) -> Result<Order> {
        let order = self.load(id).await?;
        self.cancel_loaded(order).await
    }

    /// Cancels one of the caller's own pending orders.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_for_customer(&self, user: UserId, id: OrderId) -> Result<Order> {
        let order = self.load_owned(user, id).await?;
        self.cancel_loaded(order).await
    }

    /// Replaces the shipping and/or billing address of an unshipped order.
    #[tracing::instrument(skip(self, shipping, billing))]
    pub async fn update_addresses(
        &self,
        user: UserId,
        id: OrderId,
        shipping: Option<Address>,
        billing: Option<Address>,
    ) -> Result<Order> {
        let mut order = self.load_owned(user, id).await?;
        order.update_addresses(shipping, billing)?;
        self.store.save_order(&order).await?;
        Ok(order)
    }

    /// Fetches one of the caller's orders.
    pub async fn order_for_customer(&self, user: UserId, id: OrderId) -> Result<Order> {
        self.load_owned(user, id).await
    }

    /// Lists the caller's orders, newest first.
    pub async fn orders_for_customer(&self, user: UserId) -> Result<Vec<Order>> {
        Ok(self.store.orders_for_user(user).await?)
    }

    /// Lists every order, newest first, with the total count.
    pub async fn all_orders(&self) -> Result<(u64, Vec<Order>)> {
        let orders = self.store.all_orders().await?;
        let count = self.store.count_orders().await?;
        Ok((count, orders))
    }

    /// Removes an order document. Stock is not touched.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, id: OrderId) -> Result<Order> {
        let order = self
            .store
            .find_one_and_delete(id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(id))?;
        tracing::info!("order deleted");
        Ok(order)
    }

    async fn load(&self, id: OrderId) -> Result<Order> {
        self.store
            .find_order(id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(id))
    }

    async fn load_owned(&self, user: UserId, id: OrderId) -> Result<Order> {
        let order = self.load(id).await?;
        if order.user() != user {
            return Err(CheckoutError::OrderNotFound(id));
        }
        Ok(order)
    }

    /// The status change is saved before stock is restored, so a second
    /// cancel is refused by the order itself rather than crediting twice.
    async fn cancel_loaded(&self, mut order: Order) -> Result<Order> {
        order.cancel(Utc::now())?;
        self.store.save_order(&order).await?;

        let lines: Vec<ReleaseLine> = order
            .items()
            .iter()
            .map(|item| ReleaseLine::new(item.product.clone(), item.quantity))
            .collect();
        self.engine.restore(&lines).await?;

        tracing::info!(order_id = %order.id(), units = order.total_quantity(), "order cancelled");
        self.notifier
            .order_event(format!("Order #{} has been cancelled", order.id()))
            .await;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{
        Money, OrderError, OrderItem, PaymentMethod, PricingPolicy, Product, ProductId,
    };
    use store::{InMemoryStore, NotificationStore, OrderStore};

    fn address(city: &str) -> Address {
        Address {
            address: "1 Timber Lane".into(),
            city: city.into(),
            postal_code: "97201".into(),
            state: "OR".into(),
            country: "US".into(),
        }
    }

    async fn setup() -> (InMemoryStore, OrderLifecycle<InMemoryStore>) {
        let store = InMemoryStore::with_products([Product::new(
            "BED-1",
            "Maple Bed",
            Money::from_dollars(600),
            3,
        )])
        .await;
        let notifier = Notifier::new(store.clone(), 16);
        let engine = ReservationEngine::new(store.clone(), notifier.clone(), PricingPolicy::default());
        (store.clone(), OrderLifecycle::new(store, engine, notifier))
    }

    async fn placed_order(store: &InMemoryStore, user: UserId) -> Order {
        let items = vec![OrderItem::new("BED-1", "Maple Bed", 2, Money::from_dollars(600))];
        let totals = PricingPolicy::default().totals(Money::from_dollars(1200), Money::zero());
        let order = Order::place(
            user,
            items,
            address("Portland"),
            None,
            PaymentMethod::CashOnDelivery,
            totals,
        )
        .unwrap();
        store.save_order(&order).await.unwrap();
        order
    }

    #[test]
    fn test_status_update_names() {
        for status in [
            StatusUpdate::Shipped,
            StatusUpdate::Delivered,
            StatusUpdate::Cancelled,
        ] {
            assert_eq!(StatusUpdate::parse(status.as_str()), Some(status));
        }
        assert_eq!(StatusUpdate::parse("Refunded"), None);
        assert_eq!(StatusUpdate::parse("shipped"), None);
    }

    #[tokio::test]
    async fn test_ship_then_deliver() {
        let (store, lifecycle) = setup().await;
        let order = placed_order(&store, UserId::new()).await;

        let shipped = lifecycle.update_status(order.id(), StatusUpdate::Shipped).await.unwrap();
        assert!(shipped.status().is_shipped());

        let delivered = lifecycle.deliver(order.id()).await.unwrap();
        assert!(delivered.status().is_delivered());
        assert!(delivered.status().shipped_at().is_some());

        let inbox = store.list_notifications().await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert!(inbox[0].message.ends_with("has been delivered"));
    }

    #[tokio::test]
    async fn test_deliver_requires_shipment() {
        let (store, lifecycle) = setup().await;
        let order = placed_order(&store, UserId::new()).await;

        let err = lifecycle.deliver(order.id()).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Order(OrderError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_once() {
        let (store, lifecycle) = setup().await;
        let user = UserId::new();
        let order = placed_order(&store, user).await;
        let bed = ProductId::new("BED-1");

        let cancelled = lifecycle.cancel_for_customer(user, order.id()).await.unwrap();
        assert!(cancelled.status().is_terminal());
        assert_eq!(store.stock_of(&bed).await, Some(5));

        let err = lifecycle.cancel(order.id()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Order(_)));
        assert_eq!(store.stock_of(&bed).await, Some(5));
    }

    #[tokio::test]
    async fn test_cannot_cancel_shipped_order() {
        let (store, lifecycle) = setup().await;
        let order = placed_order(&store, UserId::new()).await;
        lifecycle.ship(order.id()).await.unwrap();

        let err = lifecycle.cancel(order.id()).await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot cancel shipped orders");
        assert_eq!(store.stock_of(&ProductId::new("BED-1")).await, Some(3));
    }

    #[tokio::test]
    async fn test_other_customers_orders_are_hidden() {
        let (store, lifecycle) = setup().await;
        let order = placed_order(&store, UserId::new()).await;
        let stranger = UserId::new();

        assert!(matches!(
            lifecycle.order_for_customer(stranger, order.id()).await,
            Err(CheckoutError::OrderNotFound(_))
        ));
        assert!(matches!(
            lifecycle.cancel_for_customer(stranger, order.id()).await,
            Err(CheckoutError::OrderNotFound(_))
        ));
        assert!(lifecycle.orders_for_customer(stranger).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_address_update_before_and_after_shipment() {
        let (store, lifecycle) = setup().await;
        let user = UserId::new();
        let order = placed_order(&store, user).await;

        let updated = lifecycle
            .update_addresses(user, order.id(), Some(address("Seattle")), None)
            .await
            .unwrap();
        assert_eq!(updated.shipping_address().city, "Seattle");

        lifecycle.ship(order.id()).await.unwrap();
        let err = lifecycle
            .update_addresses(user, order.id(), Some(address("Boise")), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot update address for shipped orders");
    }

    #[tokio::test]
    async fn test_admin_listing_and_delete() {
        let (store, lifecycle) = setup().await;
        let order = placed_order(&store, UserId::new()).await;
        placed_order(&store, UserId::new()).await;

        let (count, orders) = lifecycle.all_orders().await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(orders.len(), 2);

        lifecycle.delete_order(order.id()).await.unwrap();
        assert!(matches!(
            lifecycle.delete_order(order.id()).await,
            Err(CheckoutError::OrderNotFound(_))
        ));
    }
}
