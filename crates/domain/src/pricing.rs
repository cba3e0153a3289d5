//! Server-side order pricing.

use serde::{Deserialize, Serialize};

use crate::order::Money;

/// Default stock level at or below which a low-stock alert fires.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 5;

/// Default tax rate applied to the items subtotal.
pub const DEFAULT_TAX_RATE_PERCENT: u32 = 10;

/// Default flat shipping fee (20.00).
pub const DEFAULT_SHIPPING_FEE_CENTS: i64 = 2000;

/// Store-wide pricing and inventory rules applied at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    pub tax_rate_percent: u32,
    pub shipping_fee: Money,
    pub low_stock_threshold: u32,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate_percent: DEFAULT_TAX_RATE_PERCENT,
            shipping_fee: Money::from_cents(DEFAULT_SHIPPING_FEE_CENTS),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

impl PricingPolicy {
    /// Computes the order totals for a validated items subtotal.
    ///
    /// `total_price = items_price + tax + shipping_fee - discount`
    pub fn totals(&self, items_price: Money, discount: Money) -> OrderTotals {
        let tax = items_price.percent(self.tax_rate_percent);
        let shipping_fee = self.shipping_fee;
        OrderTotals {
            items_price,
            tax,
            shipping_fee,
            discount,
            total_price: items_price + tax + shipping_fee - discount,
        }
    }

    /// Like [`PricingPolicy::totals`], returning `None` if any amount overflows.
    pub fn checked_totals(&self, items_price: Money, discount: Money) -> Option<OrderTotals> {
        let tax = items_price.checked_percent(self.tax_rate_percent)?;
        let shipping_fee = self.shipping_fee;
        let total_price = items_price
            .checked_add(tax)?
            .checked_add(shipping_fee)?
            .checked_sub(discount)?;
        Some(OrderTotals {
            items_price,
            tax,
            shipping_fee,
            discount,
            total_price,
        })
    }

    /// Returns true if `stock` is at or below the low-stock threshold.
    pub fn is_low_stock(&self, stock: u32) -> bool {
        stock <= self.low_stock_threshold
    }
}

/// Monetary breakdown persisted on every order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub items_price: Money,
    pub tax: Money,
    pub shipping_fee: Money,
    pub discount: Money,
    pub total_price: Money,
}

impl OrderTotals {
    /// Returns true if `total_price` agrees with its components.
    pub fn is_consistent(&self) -> bool {
        self.items_price
            .checked_add(self.tax)
            .and_then(|m| m.checked_add(self.shipping_fee))
            .and_then(|m| m.checked_sub(self.discount))
            == Some(self.total_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.tax_rate_percent, 10);
        assert_eq!(policy.shipping_fee, Money::from_dollars(20));
        assert_eq!(policy.low_stock_threshold, 5);
    }

    #[test]
    fn test_totals_formula() {
        let policy = PricingPolicy::default();
        let totals = policy.totals(Money::from_dollars(200), Money::from_dollars(5));

        assert_eq!(totals.tax, Money::from_dollars(20));
        assert_eq!(totals.shipping_fee, Money::from_dollars(20));
        assert_eq!(totals.total_price, Money::from_dollars(235));
        assert!(totals.is_consistent());
    }

    #[test]
    fn test_totals_without_discount() {
        let policy = PricingPolicy::default();
        let totals = policy.totals(Money::from_cents(1999), Money::zero());
        assert_eq!(totals.tax, Money::from_cents(200));
        assert_eq!(totals.total_price, Money::from_cents(1999 + 200 + 2000));
    }

    #[test]
    fn test_checked_totals() {
        let policy = PricingPolicy::default();
        assert_eq!(
            policy.checked_totals(Money::from_dollars(200), Money::from_dollars(5)),
            Some(policy.totals(Money::from_dollars(200), Money::from_dollars(5)))
        );
        assert_eq!(
            policy.checked_totals(Money::from_cents(i64::MAX - 100), Money::zero()),
            None
        );
    }

    #[test]
    fn test_low_stock_is_inclusive() {
        let policy = PricingPolicy::default();
        assert!(policy.is_low_stock(5));
        assert!(policy.is_low_stock(0));
        assert!(!policy.is_low_stock(6));
    }

    #[test]
    fn test_tampered_totals_are_inconsistent() {
        let mut totals = PricingPolicy::default().totals(Money::from_dollars(10), Money::zero());
        totals.total_price = Money::from_dollars(1);
        assert!(!totals.is_consistent());
    }
}
