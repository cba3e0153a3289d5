//! Admin notifications and live broadcast events.

use chrono::{DateTime, Utc};
use common::{NotificationId, OrderId};
use serde::{Deserialize, Serialize};

use crate::order::ProductId;

/// Category of a persisted admin notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    Order,
    LowStock,
    Return,
    Refund,
}

impl NotificationKind {
    /// Returns the wire/storage name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Order => "order",
            NotificationKind::LowStock => "low-stock",
            NotificationKind::Return => "return",
            NotificationKind::Refund => "refund",
        }
    }

    /// Parses a kind from its wire/storage name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "order" => Some(NotificationKind::Order),
            "low-stock" => Some(NotificationKind::LowStock),
            "return" => Some(NotificationKind::Return),
            "refund" => Some(NotificationKind::Refund),
            _ => None,
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted notification for the admin inbox.
///
/// Write-once apart from the `read` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Creates a new unread notification.
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: NotificationId::new(),
            message: message.into(),
            kind,
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// Event pushed to connected admin dashboards.
///
/// Delivery is at-most-once: subscribers that are not connected when an
/// event is published never see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum LiveEvent {
    #[serde(rename_all = "camelCase")]
    LowStockAlert {
        product_id: ProductId,
        product_name: String,
        remaining_stock: u32,
    },
    #[serde(rename_all = "camelCase")]
    NewOrder { order_id: OrderId, user_name: String },
}

impl LiveEvent {
    /// Returns the event name as seen by subscribers.
    pub fn name(&self) -> &'static str {
        match self {
            LiveEvent::LowStockAlert { .. } => "lowStockAlert",
            LiveEvent::NewOrder { .. } => "newOrder",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in [
            NotificationKind::Order,
            NotificationKind::LowStock,
            NotificationKind::Return,
            NotificationKind::Refund,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert_eq!(NotificationKind::parse("shipping"), None);
    }

    #[test]
    fn test_new_notification_is_unread() {
        let n = Notification::new(NotificationKind::Order, "Order shipped");
        assert!(!n.read);
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "order");
    }

    #[test]
    fn test_live_event_shape() {
        let event = LiveEvent::LowStockAlert {
            product_id: ProductId::new("CHAIR-1"),
            product_name: "Oak Chair".into(),
            remaining_stock: 4,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "lowStockAlert");
        assert_eq!(json["data"]["productId"], "CHAIR-1");
        assert_eq!(json["data"]["remainingStock"], 4);
        assert_eq!(event.name(), "lowStockAlert");
    }
}
