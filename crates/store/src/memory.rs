use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{Notification, NotificationId, Order, OrderId, Product, ProductId, UserId};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{NotificationStore, OrderStore, ProductStore, StockUpdate},
};

#[derive(Debug, Default)]
struct Collections {
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    notifications: Vec<Notification>,
}

/// Injected failures used to exercise compensation paths.
#[derive(Debug, Default)]
struct Faults {
    fail_on_order_save: bool,
    fail_on_decrement: Option<ProductId>,
    fail_on_notification_insert: bool,
    stock_increments: u64,
}

/// In-memory document store for tests and single-process deployments.
///
/// Every stock change happens under one write lock, so the
/// check-and-decrement is atomic with respect to concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<Collections>>,
    faults: Arc<RwLock<Faults>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with products.
    pub async fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let store = Self::new();
        {
            let mut collections = store.collections.write().await;
            for product in products {
                collections.products.insert(product.id.clone(), product);
            }
        }
        store
    }

    /// Returns the current stock of a product, if it exists.
    pub async fn stock_of(&self, id: &ProductId) -> Option<u32> {
        self.collections
            .read()
            .await
            .products
            .get(id)
            .map(|p| p.stock)
    }

    /// Makes subsequent order saves fail as if the store were unreachable.
    pub async fn set_fail_on_order_save(&self, fail: bool) {
        self.faults.write().await.fail_on_order_save = fail;
    }

    /// Makes decrements of the given product fail as if the store were unreachable.
    pub async fn set_fail_on_decrement(&self, product: Option<ProductId>) {
        self.faults.write().await.fail_on_decrement = product;
    }

    /// Makes subsequent notification inserts fail.
    pub async fn set_fail_on_notification_insert(&self, fail: bool) {
        self.faults.write().await.fail_on_notification_insert = fail;
    }

    /// Returns how many successful stock increments have been applied.
    pub async fn stock_increment_count(&self) -> u64 {
        self.faults.read().await.stock_increments
    }

    /// Clears all collections.
    pub async fn clear(&self) {
        let mut collections = self.collections.write().await;
        collections.products.clear();
        collections.orders.clear();
        collections.notifications.clear();
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>> {
        Ok(self.collections.read().await.products.get(id).cloned())
    }

    async fn save_product(&self, product: &Product) -> Result<()> {
        let mut collections = self.collections.write().await;
        match collections.products.get_mut(&product.id) {
            Some(existing) => {
                existing.name = product.name.clone();
                existing.price = product.price;
            }
            None => {
                collections
                    .products
                    .insert(product.id.clone(), product.clone());
            }
        }
        Ok(())
    }

    async fn decrement_stock(&self, id: &ProductId, quantity: u32) -> Result<StockUpdate> {
        if self.faults.read().await.fail_on_decrement.as_ref() == Some(id) {
            return Err(StoreError::Unavailable(format!(
                "injected decrement failure for {id}"
            )));
        }

        let mut collections = self.collections.write().await;
        let Some(product) = collections.products.get_mut(id) else {
            return Ok(StockUpdate::NotFound);
        };

        if product.stock < quantity {
            return Ok(StockUpdate::Insufficient {
                available: product.stock,
            });
        }

        product.stock -= quantity;
        Ok(StockUpdate::Applied(product.clone()))
    }

    async fn increment_stock(&self, id: &ProductId, quantity: u32) -> Result<Option<Product>> {
        let updated = {
            let mut collections = self.collections.write().await;
            match collections.products.get_mut(id) {
                Some(product) => {
                    product.stock = product
                        .stock
                        .checked_add(quantity)
                        .ok_or_else(|| StoreError::StockOverflow(id.clone()))?;
                    Some(product.clone())
                }
                None => None,
            }
        };

        if updated.is_some() {
            self.faults.write().await.stock_increments += 1;
        }
        Ok(updated)
    }

    async fn count_products(&self) -> Result<u64> {
        Ok(self.collections.read().await.products.len() as u64)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.collections.read().await.orders.get(&id).cloned())
    }

    async fn save_order(&self, order: &Order) -> Result<()> {
        if self.faults.read().await.fail_on_order_save {
            return Err(StoreError::Unavailable(
                "injected order save failure".to_string(),
            ));
        }

        self.collections
            .write()
            .await
            .orders
            .insert(order.id(), order.clone());
        Ok(())
    }

    async fn orders_for_user(&self, user: UserId) -> Result<Vec<Order>> {
        let collections = self.collections.read().await;
        let mut orders: Vec<_> = collections
            .orders
            .values()
            .filter(|o| o.user() == user)
            .cloned()
            .collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at()));
        Ok(orders)
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        let collections = self.collections.read().await;
        let mut orders: Vec<_> = collections.orders.values().cloned().collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at()));
        Ok(orders)
    }

    async fn find_one_and_delete(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.collections.write().await.orders.remove(&id))
    }

    async fn count_orders(&self) -> Result<u64> {
        Ok(self.collections.read().await.orders.len() as u64)
    }
}

#[async_trait]
impl NotificationStore for InMemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        if self.faults.read().await.fail_on_notification_insert {
            return Err(StoreError::Unavailable(
                "injected notification insert failure".to_string(),
            ));
        }

        self.collections
            .write()
            .await
            .notifications
            .push(notification.clone());
        Ok(())
    }

    async fn list_notifications(&self) -> Result<Vec<Notification>> {
        let collections = self.collections.read().await;
        Ok(collections.notifications.iter().rev().cloned().collect())
    }

    async fn mark_notification_read(&self, id: NotificationId) -> Result<Option<Notification>> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .map(|n| {
                n.read = true;
                n.clone()
            }))
    }

    async fn count_unread(&self) -> Result<u64> {
        let collections = self.collections.read().await;
        Ok(collections.notifications.iter().filter(|n| !n.read).count() as u64)
    }
}
