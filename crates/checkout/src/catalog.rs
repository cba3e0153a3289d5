//! Catalogue administration: product upserts and restocking.

use domain::{Product, ProductId};
use store::{Store, StoreError};

use crate::error::{CheckoutError, Result};
use crate::notifier::Notifier;

/// Product reads and admin-side stock changes.
#[derive(Clone)]
pub struct Catalog<S> {
    store: S,
    notifier: Notifier<S>,
}

impl<S: Store + Clone> Catalog<S> {
    pub fn new(store: S, notifier: Notifier<S>) -> Self {
        Self { store, notifier }
    }

    /// Fetches a product by ID.
    pub async fn product(&self, id: &ProductId) -> Result<Product> {
        self.store
            .find_product(id)
            .await?
            .ok_or_else(|| CheckoutError::ProductNotFound(id.clone()))
    }

    /// Inserts a product or updates its name and price.
    ///
    /// Stock is only taken from `product` when the product is new; existing
    /// stock changes through checkout and [`Catalog::restock`]. Returns the
    /// product as stored.
    #[tracing::instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn upsert_product(&self, product: Product) -> Result<Product> {
        if product.price.is_negative() {
            return Err(CheckoutError::InvalidPrice(product.id));
        }
        self.store.save_product(&product).await?;
        let saved = self.product(&product.id).await?;
        tracing::info!(stock = saved.stock, "product saved");
        Ok(saved)
    }

    /// Adds `quantity` units to a product's stock.
    #[tracing::instrument(skip(self))]
    pub async fn restock(&self, id: &ProductId, quantity: u32) -> Result<Product> {
        if quantity == 0 {
            return Err(CheckoutError::InvalidRestockQuantity);
        }

        let product = self
            .store
            .increment_stock(id, quantity)
            .await
            .map_err(|e| match e {
                StoreError::StockOverflow(_) => CheckoutError::InvalidRestockQuantity,
                other => CheckoutError::Store(other),
            })?
            .ok_or_else(|| CheckoutError::ProductNotFound(id.clone()))?;

        tracing::info!(stock = product.stock, "product restocked");
        self.notifier.restocked(&product).await;
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Money, NotificationKind};
    use store::{InMemoryStore, NotificationStore, ProductStore};

    fn catalog(store: &InMemoryStore) -> Catalog<InMemoryStore> {
        Catalog::new(store.clone(), Notifier::new(store.clone(), 16))
    }

    #[tokio::test]
    async fn test_restock_notifies() {
        let store = InMemoryStore::with_products([Product::new(
            "SHELF-1",
            "Pine Shelf",
            Money::from_dollars(120),
            1,
        )])
        .await;

        let product = catalog(&store)
            .restock(&ProductId::new("SHELF-1"), 9)
            .await
            .unwrap();
        assert_eq!(product.stock, 10);

        let inbox = store.list_notifications().await.unwrap();
        assert_eq!(inbox[0].kind, NotificationKind::LowStock);
        assert_eq!(inbox[0].message, "Pine Shelf has been restocked. New stock: 10");
    }

    #[tokio::test]
    async fn test_restock_rejects_zero_and_unknown() {
        let store = InMemoryStore::new();
        let catalog = catalog(&store);

        assert!(matches!(
            catalog.restock(&ProductId::new("SHELF-1"), 0).await,
            Err(CheckoutError::InvalidRestockQuantity)
        ));
        assert!(matches!(
            catalog.restock(&ProductId::new("SHELF-1"), 3).await,
            Err(CheckoutError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_restock_past_stock_limit_is_invalid() {
        let store = InMemoryStore::with_products([Product::new(
            "SHELF-1",
            "Pine Shelf",
            Money::from_dollars(120),
            u32::MAX - 1,
        )])
        .await;
        let catalog = catalog(&store);

        assert!(matches!(
            catalog.restock(&ProductId::new("SHELF-1"), 2).await,
            Err(CheckoutError::InvalidRestockQuantity)
        ));
        assert_eq!(
            catalog.product(&ProductId::new("SHELF-1")).await.unwrap().stock,
            u32::MAX - 1
        );
        assert!(store.list_notifications().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_keeps_stock_sold_since() {
        let store = InMemoryStore::with_products([Product::new(
            "SHELF-1",
            "Pine Shelf",
            Money::from_dollars(120),
            1,
        )])
        .await;
        let catalog = catalog(&store);

        // Last unit sells while an admin edits the product with the stock they loaded earlier.
        store
            .decrement_stock(&ProductId::new("SHELF-1"), 1)
            .await
            .unwrap();

        let saved = catalog
            .upsert_product(Product::new(
                "SHELF-1",
                "Pine Shelf, oiled",
                Money::from_dollars(135),
                1,
            ))
            .await
            .unwrap();
        assert_eq!(saved.stock, 0);
        assert_eq!(saved.name, "Pine Shelf, oiled");
        assert_eq!(saved.price, Money::from_dollars(135));
        assert_eq!(
            catalog.product(&ProductId::new("SHELF-1")).await.unwrap().stock,
            0
        );
    }

    #[tokio::test]
    async fn test_upsert_and_read() {
        let store = InMemoryStore::new();
        let catalog = catalog(&store);

        catalog
            .upsert_product(Product::new("SHELF-1", "Pine Shelf", Money::from_dollars(120), 4))
            .await
            .unwrap();
        assert_eq!(
            catalog.product(&ProductId::new("SHELF-1")).await.unwrap().stock,
            4
        );

        let err = catalog
            .upsert_product(Product::new("BAD-1", "Bad", Money::from_cents(-1), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidPrice(_)));
    }
}
