//! Checkout attempt state machine.

use serde::{Deserialize, Serialize};

/// The state of a single checkout attempt.
///
/// State transitions:
/// ```text
/// Received ──► Validating ──┬──► Reserved ──┬──► Persisted ──┬──► Paid
///                           │               │                └──► PendingCod
///                           └──► Rejected   └──► RolledBack
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckoutState {
    /// Request accepted, nothing checked yet.
    #[default]
    Received,

    /// Prices, stock and totals are being checked.
    Validating,

    /// Stock has been decremented for every line.
    Reserved,

    /// The order document has been written.
    Persisted,

    /// Online payment captured (terminal state).
    Paid,

    /// Cash on delivery, awaiting payment at the door (terminal state).
    PendingCod,

    /// Refused before any stock was held (terminal state).
    Rejected,

    /// Refused after reservation; stock has been released (terminal state).
    RolledBack,
}

impl CheckoutState {
    /// Returns true if the attempt may move from this state to `next`.
    pub fn can_transition_to(&self, next: CheckoutState) -> bool {
        use CheckoutState::*;
        matches!(
            (self, next),
            (Received, Validating)
                | (Validating, Reserved)
                | (Validating, Rejected)
                | (Reserved, Persisted)
                | (Reserved, RolledBack)
                | (Persisted, Paid)
                | (Persisted, PendingCod)
        )
    }

    /// Returns true while stock is held on behalf of this attempt.
    pub fn holds_stock(&self) -> bool {
        matches!(self, CheckoutState::Reserved)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CheckoutState::Paid
                | CheckoutState::PendingCod
                | CheckoutState::Rejected
                | CheckoutState::RolledBack
        )
    }

    /// Returns true if the attempt ended with an order.
    pub fn is_success(&self) -> bool {
        matches!(self, CheckoutState::Paid | CheckoutState::PendingCod)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Received => "Received",
            CheckoutState::Validating => "Validating",
            CheckoutState::Reserved => "Reserved",
            CheckoutState::Persisted => "Persisted",
            CheckoutState::Paid => "Paid",
            CheckoutState::PendingCod => "PendingCod",
            CheckoutState::Rejected => "Rejected",
            CheckoutState::RolledBack => "RolledBack",
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
