//! Confirmation gate for irreversible actions
//!
//! A two-state machine (idle / pending) guarding effects that need explicit
//! human sign-off before they run. The gate is pure state: the session
//! executes whatever action `confirm` hands back, keeping the gate decoupled
//! from which tool armed it.

use log::warn;
use std::sync::Mutex;

/// A deferred side effect awaiting user confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    /// Send the email currently in the compose draft
    SendEmail,
}

/// The confirmation gate
///
/// At most one action is pending at a time; arming while already pending
/// overwrites the prior action (no queueing). `confirm` and `cancel` while
/// idle are no-ops.
pub struct ConfirmationGate {
    pending: Mutex<Option<PendingAction>>,
}

impl ConfirmationGate {
    /// Create an idle gate
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(None),
        }
    }

    /// Arm the gate with an action requiring confirmation
    pub fn arm(&self, action: PendingAction) {
        let mut pending = self.pending.lock().unwrap();
        if let Some(prior) = pending.replace(action) {
            warn!("Replacing pending action {:?} with {:?}", prior, action);
        }
    }

    /// The currently pending action, if any
    pub fn pending(&self) -> Option<PendingAction> {
        *self.pending.lock().unwrap()
    }

    /// Take the pending action for execution, returning the gate to idle.
    /// Returns `None` (no-op) while idle.
    pub fn confirm(&self) -> Option<PendingAction> {
        self.pending.lock().unwrap().take()
    }

    /// Discard the pending action, returning the gate to idle. Returns the
    /// discarded action, or `None` (no-op) while idle.
    pub fn cancel(&self) -> Option<PendingAction> {
        self.pending.lock().unwrap().take()
    }
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self::new()
    }
}
