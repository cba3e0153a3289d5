use async_trait::async_trait;
use domain::{Notification, NotificationId, Order, OrderId, Product, ProductId, UserId};

use crate::Result;

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockUpdate {
    /// The stock was changed; carries the product as it is now.
    Applied(Product),
    /// The product holds fewer units than requested; nothing was changed.
    Insufficient { available: u32 },
    /// No product with that ID exists.
    NotFound,
}

/// Inventory collection.
///
/// Stock is only ever changed through [`ProductStore::decrement_stock`] and
/// [`ProductStore::increment_stock`], each of which checks and applies the
/// change in a single step. Callers must never read a product, adjust its
/// stock locally and save it back.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Fetches a product by ID.
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>>;

    /// Inserts a new product, or updates the name and price of an existing one.
    ///
    /// The stock of an existing product is left as it is; `product.stock`
    /// only seeds a product that did not exist yet.
    async fn save_product(&self, product: &Product) -> Result<()>;

    /// Removes `quantity` units from stock if at least that many are available.
    async fn decrement_stock(&self, id: &ProductId, quantity: u32) -> Result<StockUpdate>;

    /// Adds `quantity` units to stock.
    ///
    /// Returns `None` if the product no longer exists, and
    /// [`StoreError::StockOverflow`](crate::StoreError::StockOverflow) without
    /// changing anything if the result would not fit in a `u32`.
    async fn increment_stock(&self, id: &ProductId, quantity: u32) -> Result<Option<Product>>;

    /// Counts the products in the catalogue.
    async fn count_products(&self) -> Result<u64>;
}

/// Order collection.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetches an order by ID.
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Inserts or replaces an order document.
    async fn save_order(&self, order: &Order) -> Result<()>;

    /// Lists a customer's orders, newest first.
    async fn orders_for_user(&self, user: UserId) -> Result<Vec<Order>>;

    /// Lists every order, newest first.
    async fn all_orders(&self) -> Result<Vec<Order>>;

    /// Removes an order and returns it, if it existed.
    async fn find_one_and_delete(&self, id: OrderId) -> Result<Option<Order>>;

    /// Counts all orders.
    async fn count_orders(&self) -> Result<u64>;
}

/// Admin notification collection.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Appends a notification.
    async fn insert_notification(&self, notification: &Notification) -> Result<()>;

    /// Lists notifications, newest first.
    async fn list_notifications(&self) -> Result<Vec<Notification>>;

    /// Sets the read flag, returning the updated notification if it exists.
    async fn mark_notification_read(&self, id: NotificationId) -> Result<Option<Notification>>;

    /// Counts notifications not yet read.
    async fn count_unread(&self) -> Result<u64>;
}

/// A store that holds all three collections.
pub trait Store: ProductStore + OrderStore + NotificationStore {}

// Blanket implementation for anything providing every collection
impl<T: ProductStore + OrderStore + NotificationStore + ?Sized> Store for T {}
