//! Trace of a single checkout attempt.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CheckoutError;
use crate::state::CheckoutState;

/// Records how one checkout attempt progressed.
///
/// The orchestrator owns the attempt for the duration of a request and
/// refuses transitions the state machine does not allow.
#[derive(Debug, Clone)]
pub struct CheckoutAttempt {
    id: Uuid,
    state: CheckoutState,
    history: Vec<CheckoutState>,
    failure_reason: Option<String>,
    release_count: u32,
    started_at: DateTime<Utc>,
}

impl Default for CheckoutAttempt {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutAttempt {
    /// Starts a new attempt in the `Received` state.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: CheckoutState::Received,
            history: vec![CheckoutState::Received],
            failure_reason: None,
            release_count: 0,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// Every state visited, in order, starting with `Received`.
    pub fn history(&self) -> &[CheckoutState] {
        &self.history
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Number of times stock held by this attempt was released.
    pub fn release_count(&self) -> u32 {
        self.release_count
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Moves the attempt to `next`.
    pub fn advance(&mut self, next: CheckoutState) -> Result<(), CheckoutError> {
        if !self.state.can_transition_to(next) {
            return Err(CheckoutError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(attempt_id = %self.id, from = %self.state, to = %next, "checkout state change");
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// Ends the attempt in `terminal`, recording why.
    pub(crate) fn fail(
        &mut self,
        terminal: CheckoutState,
        reason: &CheckoutError,
    ) -> Result<(), CheckoutError> {
        self.advance(terminal)?;
        self.failure_reason = Some(reason.to_string());
        Ok(())
    }

    pub(crate) fn record_release(&mut self) {
        self.release_count += 1;
    }
}
