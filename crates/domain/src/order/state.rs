//! Order status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The progress of an order after checkout.
///
/// This is the single source of truth for fulfilment progress; the
/// shipped/delivered flags and timestamps are derived from it.
///
/// State transitions:
/// ```text
/// Pending ──► Shipped ──► Delivered
///    │
///    └──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all_fields = "camelCase")]
pub enum OrderStatus {
    /// Placed and awaiting dispatch.
    #[default]
    Pending,

    /// Handed to the carrier.
    Shipped { shipped_at: DateTime<Utc> },

    /// Received by the customer (terminal state).
    Delivered {
        shipped_at: DateTime<Utc>,
        delivered_at: DateTime<Utc>,
    },

    /// Cancelled before shipment (terminal state).
    Cancelled { cancelled_at: DateTime<Utc> },
}

impl OrderStatus {
    /// Returns true if the order can be shipped in this state.
    pub fn can_ship(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the order can be marked delivered in this state.
    pub fn can_deliver(&self) -> bool {
        matches!(self, OrderStatus::Shipped { .. })
    }

    /// Returns true if the order can be cancelled in this state.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true once the order has left the warehouse.
    pub fn is_shipped(&self) -> bool {
        matches!(
            self,
            OrderStatus::Shipped { .. } | OrderStatus::Delivered { .. }
        )
    }

    /// Returns true once the order has been delivered.
    pub fn is_delivered(&self) -> bool {
        matches!(self, OrderStatus::Delivered { .. })
    }

    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        match self {
            OrderStatus::Shipped { shipped_at } | OrderStatus::Delivered { shipped_at, .. } => {
                Some(*shipped_at)
            }
            _ => None,
        }
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        match self {
            OrderStatus::Delivered { delivered_at, .. } => Some(*delivered_at),
            _ => None,
        }
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered { .. } | OrderStatus::Cancelled { .. }
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Shipped { .. } => "Shipped",
            OrderStatus::Delivered { .. } => "Delivered",
            OrderStatus::Cancelled { .. } => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
