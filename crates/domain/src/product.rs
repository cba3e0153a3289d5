//! Catalogue product with its sellable stock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::order::{Money, ProductId};

/// A product as held by the inventory store.
///
/// `stock` is unsigned, so a decrement that would go below zero is a
/// rejected operation rather than a clamped one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product stamped with the current time.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Money, stock: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            stock,
            created_at: Utc::now(),
        }
    }

    /// Returns true if `quantity` units can be taken from stock.
    pub fn has_stock_for(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }
}
