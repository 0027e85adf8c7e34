//! Observable session-state service.
//!
//! DESIGN
//! ======
//! A single `watch` channel holds the latest `SessionState`. The Auth Provider
//! is the only writer; gates subscribe and react to changes instead of reading
//! a global. Receivers always see the newest snapshot, so intermediate states
//! written in quick succession may be skipped.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use super::{Identity, SessionState};

/// Shared handle to the current session snapshot. Cheap to clone.
#[derive(Clone, Debug)]
pub struct SessionService {
    tx: Arc<watch::Sender<SessionState>>,
}

impl SessionService {
    /// Create a service in the initial, unresolved state.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(SessionState::default())
    }

    #[must_use]
    pub fn with_state(state: SessionState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self { tx: Arc::new(tx) }
    }

    /// Clone of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    /// Subscribe to snapshot changes. The receiver starts at the current value.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Mark the session as being (re)checked. Returns `false` if a check was
    /// already in progress, in which case subscribers are not woken.
    pub fn begin_resolve(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if state.is_loading {
                return false;
            }
            state.is_loading = true;
            true
        })
    }

    /// Publish the outcome of a check and clear the loading flag.
    pub fn complete(&self, user: Option<Identity>) {
        debug!(authenticated = user.is_some(), "session resolved");
        self.publish(SessionState { user, is_loading: false });
    }

    /// Replace the snapshot and wake every subscriber.
    pub fn publish(&self, state: SessionState) {
        self.tx.send_replace(state);
    }

    pub fn sign_out(&self) {
        self.complete(None);
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SessionService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
