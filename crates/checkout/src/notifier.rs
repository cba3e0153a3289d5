//! Admin notifications: persisted inbox entries plus a live broadcast channel.

use domain::{LiveEvent, Notification, NotificationId, NotificationKind, OrderId, Product};
use store::NotificationStore;
use tokio::sync::broadcast;

use crate::error::{CheckoutError, Result};

/// Default capacity of the live event channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Publishes admin notifications.
///
/// Persisted notifications go to the store; live events go to every
/// currently subscribed receiver. Neither path ever fails the caller:
/// errors are logged and dropped.
#[derive(Clone)]
pub struct Notifier<S> {
    store: S,
    sender: broadcast::Sender<LiveEvent>,
}

impl<S: NotificationStore> Notifier<S> {
    /// Creates a notifier with a bounded live channel.
    pub fn new(store: S, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { store, sender }
    }

    /// Subscribes to live events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.sender.subscribe()
    }

    /// Number of connected live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Sends a live event to connected subscribers.
    pub fn publish(&self, event: LiveEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => tracing::debug!(event = name, receivers, "live event published"),
            Err(_) => tracing::trace!(event = name, "no live subscribers"),
        }
    }

    /// Persists a notification, logging on failure.
    pub async fn record(&self, kind: NotificationKind, message: impl Into<String>) {
        let notification = Notification::new(kind, message);
        if let Err(e) = self.store.insert_notification(&notification).await {
            tracing::warn!(error = %e, kind = %kind, "failed to persist notification");
        }
    }

    /// Raises a low-stock alert for a product whose stock just dropped.
    #[tracing::instrument(skip(self, product), fields(product_id = %product.id, stock = product.stock))]
    pub async fn low_stock(&self, product: &Product) {
        metrics::counter!("low_stock_alerts_total").increment(1);
        tracing::info!("low stock alert");

        self.record(
            NotificationKind::LowStock,
            format!(
                "Low stock alert: {} has only {} left",
                product.name, product.stock
            ),
        )
        .await;

        self.publish(LiveEvent::LowStockAlert {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            remaining_stock: product.stock,
        });
    }

    /// Announces a newly placed order to live subscribers.
    pub fn new_order(&self, order_id: OrderId, user_name: &str) {
        self.publish(LiveEvent::NewOrder {
            order_id,
            user_name: user_name.to_string(),
        });
    }

    /// Records an order lifecycle notification.
    pub async fn order_event(&self, message: String) {
        self.record(NotificationKind::Order, message).await;
    }

    /// Records that a product was restocked.
    pub async fn restocked(&self, product: &Product) {
        self.record(
            NotificationKind::LowStock,
            format!(
                "{} has been restocked. New stock: {}",
                product.name, product.stock
            ),
        )
        .await;
    }

    /// Lists the inbox, newest first, with the unread count.
    pub async fn inbox(&self) -> Result<(u64, Vec<Notification>)> {
        let notifications = self.store.list_notifications().await?;
        let unread = self.store.count_unread().await?;
        Ok((unread, notifications))
    }

    /// Marks a notification as read.
    pub async fn mark_read(&self, id: NotificationId) -> Result<Notification> {
        self.store
            .mark_notification_read(id)
            .await?
            .ok_or(CheckoutError::NotificationNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Money;
    use store::InMemoryStore;

    fn lamp(stock: u32) -> Product {
        Product::new("LAMP-1", "Brass Lamp", Money::from_dollars(80), stock)
    }

    #[tokio::test]
    async fn test_low_stock_persists_and_broadcasts() {
        let store = InMemoryStore::new();
        let notifier = Notifier::new(store.clone(), 16);
        let mut rx = notifier.subscribe();

        notifier.low_stock(&lamp(3)).await;

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            LiveEvent::LowStockAlert {
                product_id: "LAMP-1".into(),
                product_name: "Brass Lamp".into(),
                remaining_stock: 3,
            }
        );

        let (unread, inbox) = notifier.inbox().await.unwrap();
        assert_eq!(unread, 1);
        assert_eq!(inbox[0].kind, NotificationKind::LowStock);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let notifier = Notifier::new(InMemoryStore::new(), 16);
        assert_eq!(notifier.subscriber_count(), 0);
        notifier.new_order(OrderId::new(), "Ada");
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let notifier = Notifier::new(InMemoryStore::new(), 16);
        notifier.new_order(OrderId::new(), "Ada");

        let mut rx = notifier.subscribe();
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_store_failure_does_not_propagate() {
        let store = InMemoryStore::new();
        store.set_fail_on_notification_insert(true).await;
        let notifier = Notifier::new(store.clone(), 16);
        let mut rx = notifier.subscribe();

        notifier.low_stock(&lamp(1)).await;

        assert!(rx.recv().await.is_ok());
        assert_eq!(store.count_unread().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_read_unknown_notification() {
        let notifier = Notifier::new(InMemoryStore::new(), 16);
        let err = notifier.mark_read(NotificationId::new()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::NotificationNotFound(_)));
    }
}
