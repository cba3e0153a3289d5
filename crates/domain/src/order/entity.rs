//! Order document.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize, Serializer};

use crate::pricing::OrderTotals;

use super::{Address, OrderError, OrderItem, OrderStatus, PaymentMethod, PaymentResult};

/// A placed order.
///
/// Created once by checkout and afterwards only moved along its
/// [`OrderStatus`] state machine. Payment is tracked solely by `paid_at`.
/// The serialized form also carries `isPaid`, `isShipped` and
/// `isDelivered`, derived from that state and ignored when reading back.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,
    user: UserId,
    items: Vec<OrderItem>,
    shipping_address: Address,
    #[serde(default)]
    billing_address: Option<Address>,
    payment_method: PaymentMethod,
    #[serde(default)]
    payment_result: Option<PaymentResult>,
    totals: OrderTotals,
    #[serde(default)]
    paid_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

/// Wire view of an [`Order`].
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderDocument<'a> {
    id: OrderId,
    user: UserId,
    items: &'a [OrderItem],
    shipping_address: &'a Address,
    billing_address: Option<&'a Address>,
    payment_method: PaymentMethod,
    payment_result: Option<&'a PaymentResult>,
    totals: &'a OrderTotals,
    paid_at: Option<DateTime<Utc>>,
    is_paid: bool,
    is_shipped: bool,
    is_delivered: bool,
    #[serde(flatten)]
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

impl Serialize for Order {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        OrderDocument {
            id: self.id,
            user: self.user,
            items: &self.items,
            shipping_address: &self.shipping_address,
            billing_address: self.billing_address.as_ref(),
            payment_method: self.payment_method,
            payment_result: self.payment_result.as_ref(),
            totals: &self.totals,
            paid_at: self.paid_at,
            is_paid: self.is_paid(),
            is_shipped: self.status.is_shipped(),
            is_delivered: self.status.is_delivered(),
            status: self.status,
            created_at: self.created_at,
        }
        .serialize(serializer)
    }
}

impl Order {
    /// Builds a new pending, unpaid order.
    pub fn place(
        user: UserId,
        items: Vec<OrderItem>,
        shipping_address: Address,
        billing_address: Option<Address>,
        payment_method: PaymentMethod,
        totals: OrderTotals,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }
        if let Some(item) = items.iter().find(|item| item.quantity == 0) {
            return Err(OrderError::InvalidQuantity {
                quantity: item.quantity,
            });
        }

        Ok(Self {
            id: OrderId::new(),
            user,
            items,
            shipping_address,
            billing_address,
            payment_method,
            payment_result: None,
            totals,
            paid_at: None,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        })
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the customer who placed the order.
    pub fn user(&self) -> UserId {
        self.user
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn shipping_address(&self) -> &Address {
        &self.shipping_address
    }

    pub fn billing_address(&self) -> Option<&Address> {
        self.billing_address.as_ref()
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn payment_result(&self) -> Option<&PaymentResult> {
        self.payment_result.as_ref()
    }

    pub fn totals(&self) -> &OrderTotals {
        &self.totals
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    pub fn is_paid(&self) -> bool {
        self.paid_at.is_some()
    }

    /// Returns the total number of units across all lines.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

// Transition methods
impl Order {
    /// Records a successful payment.
    pub fn mark_paid(&mut self, result: PaymentResult, at: DateTime<Utc>) -> Result<(), OrderError> {
        if self.is_paid() {
            return Err(OrderError::AlreadyPaid);
        }
        self.payment_result = Some(result);
        self.paid_at = Some(at);
        Ok(())
    }

    /// Moves a pending order to shipped.
    pub fn ship(&mut self, at: DateTime<Utc>) -> Result<(), OrderError> {
        if !self.status.can_ship() {
            return Err(OrderError::InvalidStatusTransition {
                current: self.status,
                action: "ship",
            });
        }
        self.status = OrderStatus::Shipped { shipped_at: at };
        Ok(())
    }

    /// Moves a shipped order to delivered.
    pub fn deliver(&mut self, at: DateTime<Utc>) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::Shipped { shipped_at } => {
                self.status = OrderStatus::Delivered {
                    shipped_at,
                    delivered_at: at,
                };
                Ok(())
            }
            current => Err(OrderError::InvalidStatusTransition {
                current,
                action: "deliver",
            }),
        }
    }

    /// Cancels a pending order.
    ///
    /// The caller is responsible for returning the items to stock.
    pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<(), OrderError> {
        if self.status.is_shipped() {
            return Err(OrderError::AlreadyShipped { action: "cancel" });
        }
        if !self.status.can_cancel() {
            return Err(OrderError::InvalidStatusTransition {
                current: self.status,
                action: "cancel",
            });
        }
        self.status = OrderStatus::Cancelled { cancelled_at: at };
        Ok(())
    }

    /// Replaces the shipping and/or billing address before shipment.
    pub fn update_addresses(
        &mut self,
        shipping: Option<Address>,
        billing: Option<Address>,
    ) -> Result<(), OrderError> {
        if self.status.is_shipped() {
            return Err(OrderError::AlreadyShipped {
                action: "update address for",
            });
        }
        if let Some(shipping) = shipping {
            self.shipping_address = shipping;
        }
        if billing.is_some() {
            self.billing_address = billing;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Money;
    use crate::pricing::PricingPolicy;

    fn address() -> Address {
        Address {
            address: "1 Timber Lane".into(),
            city: "Portland".into(),
            postal_code: "97201".into(),
            state: "OR".into(),
            country: "US".into(),
        }
    }

    fn sample_order() -> Order {
        let items = vec![
            OrderItem::new("CHAIR-1", "Oak Chair", 2, Money::from_dollars(50)),
            OrderItem::new("TABLE-1", "Teak Table", 1, Money::from_dollars(300)),
        ];
        let subtotal = items.iter().map(OrderItem::line_total).sum();
        let totals = PricingPolicy::default().totals(subtotal, Money::zero());
        Order::place(
            UserId::new(),
            items,
            address(),
            None,
            PaymentMethod::CashOnDelivery,
            totals,
        )
        .unwrap()
    }

    #[test]
    fn test_place_creates_pending_unpaid_order() {
        let order = sample_order();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert!(!order.is_paid());
        assert_eq!(order.total_quantity(), 3);
        assert_eq!(order.totals().items_price, Money::from_dollars(400));
        assert!(order.totals().is_consistent());
    }

    #[test]
    fn test_place_rejects_empty_and_zero_quantity() {
        let totals = OrderTotals::default();
        let empty = Order::place(
            UserId::new(),
            vec![],
            address(),
            None,
            PaymentMethod::CashOnDelivery,
            totals,
        );
        assert!(matches!(empty, Err(OrderError::NoItems)));

        let zero = Order::place(
            UserId::new(),
            vec![OrderItem::new("CHAIR-1", "Oak Chair", 0, Money::from_dollars(50))],
            address(),
            None,
            PaymentMethod::CashOnDelivery,
            totals,
        );
        assert!(matches!(zero, Err(OrderError::InvalidQuantity { quantity: 0 })));
    }

    #[test]
    fn test_mark_paid_once() {
        let mut order = sample_order();
        let result = PaymentResult {
            id: "PAY-0001".into(),
            status: "COMPLETED".into(),
            update_time: Utc::now(),
        };
        order.mark_paid(result.clone(), Utc::now()).unwrap();
        assert!(order.is_paid());
        assert!(matches!(
            order.mark_paid(result, Utc::now()),
            Err(OrderError::AlreadyPaid)
        ));
    }

    #[test]
    fn test_ship_then_deliver() {
        let mut order = sample_order();
        let shipped_at = Utc::now();
        order.ship(shipped_at).unwrap();
        assert!(order.status().is_shipped());
        assert_eq!(order.status().shipped_at(), Some(shipped_at));

        order.deliver(Utc::now()).unwrap();
        assert!(order.status().is_delivered());
        assert_eq!(order.status().shipped_at(), Some(shipped_at));
    }

    #[test]
    fn test_cannot_deliver_pending_order() {
        let mut order = sample_order();
        let err = order.deliver(Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidStatusTransition {
                action: "deliver",
                ..
            }
        ));
    }

    #[test]
    fn test_cannot_cancel_shipped_order() {
        let mut order = sample_order();
        order.ship(Utc::now()).unwrap();
        let err = order.cancel(Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "Cannot cancel shipped orders");
    }

    #[test]
    fn test_cancel_twice_is_rejected() {
        let mut order = sample_order();
        order.cancel(Utc::now()).unwrap();
        assert!(matches!(
            order.cancel(Utc::now()),
            Err(OrderError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn test_update_addresses_before_shipment_only() {
        let mut order = sample_order();
        let mut new_address = address();
        new_address.city = "Seattle".into();

        order
            .update_addresses(None, Some(new_address.clone()))
            .unwrap();
        assert_eq!(order.shipping_address().city, "Portland");
        assert_eq!(order.billing_address().map(|a| a.city.as_str()), Some("Seattle"));

        order.ship(Utc::now()).unwrap();
        let err = order.update_addresses(Some(new_address), None).unwrap_err();
        assert_eq!(err.to_string(), "Cannot update address for shipped orders");
    }

    #[test]
    fn test_document_round_trip_keeps_status() {
        let mut order = sample_order();
        order.ship(Utc::now()).unwrap();
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["status"], "Shipped");
        let back: Order = serde_json::from_value(json).unwrap();
        assert_eq!(back, order);
    }
}
