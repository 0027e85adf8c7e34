//! Per-mount gate state machine.
//!
//! DESIGN
//! ======
//! `GateAttempt` never performs side effects itself. Every input returns the
//! effects to apply, which keeps the at-most-once rules testable without a
//! runtime. The bounded wait is tracked by epoch: re-arming bumps the epoch,
//! so a timer from an earlier arm that still fires is ignored.

use std::time::Duration;

use super::notice::{Notice, notice_for};
use super::redirect::Redirect;
use super::{DenyReason, GateOutcome, GateStatus, GateView};
use crate::config::GateConfig;
use crate::session::SessionState;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateEffect {
    /// Replace any outstanding wait with one firing after `after`.
    ArmTimer { epoch: u64, after: Duration },
    CancelTimer,
    Notify(Notice),
    Redirect(Redirect),
    Render(GateView),
}

#[derive(Debug)]
pub struct GateAttempt {
    config: GateConfig,
    path: String,
    status: GateStatus,
    has_redirected: bool,
    timer_epoch: u64,
    timer_armed: bool,
}

impl GateAttempt {
    #[must_use]
    pub fn new(path: impl Into<String>, config: GateConfig) -> Self {
        Self {
            config,
            path: path.into(),
            status: GateStatus::Pending,
            has_redirected: false,
            timer_epoch: 0,
            timer_armed: false,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn status(&self) -> &GateStatus {
        &self.status
    }

    #[must_use]
    pub fn has_redirected(&self) -> bool {
        self.has_redirected
    }

    #[must_use]
    pub fn timer_armed(&self) -> bool {
        self.timer_armed
    }

    /// Terminal outcome, if the attempt has settled.
    #[must_use]
    pub fn outcome(&self) -> Option<GateOutcome> {
        match &self.status {
            GateStatus::Pending => None,
            GateStatus::Authorized(user) => Some(GateOutcome::Authorized(user.clone())),
            GateStatus::Denied(reason) => Some(GateOutcome::Denied(*reason)),
        }
    }

    /// First evaluation when the gate is mounted.
    ///
    /// A session that is already resolved settles immediately; otherwise the
    /// loading view is shown and the bounded wait is armed.
    pub fn mount(&mut self, state: &SessionState) -> Vec<GateEffect> {
        if state.resolved() {
            return self.settle(state);
        }
        let mut effects = vec![GateEffect::Render(GateView::Loading)];
        effects.push(self.arm());
        effects
    }

    /// React to a new session snapshot.
    ///
    /// While still loading the running wait is left alone, so a provider that
    /// keeps flapping cannot postpone the deadline.
    pub fn observe(&mut self, state: &SessionState) -> Vec<GateEffect> {
        if self.status.is_terminal() || !state.resolved() {
            return Vec::new();
        }
        self.settle(state)
    }

    /// The bounded wait armed under `epoch` has elapsed.
    pub fn timer_fired(&mut self, epoch: u64) -> Vec<GateEffect> {
        if self.status.is_terminal() || !self.timer_armed || epoch != self.timer_epoch {
            return Vec::new();
        }
        self.timer_armed = false;
        self.deny(DenyReason::TimedOut)
    }

    /// The guarded location changed under a mounted gate.
    ///
    /// A pending attempt follows the new path and restarts its wait. Settled
    /// attempts keep their outcome.
    pub fn change_path(&mut self, path: impl Into<String>, state: &SessionState) -> Vec<GateEffect> {
        if self.status.is_terminal() {
            return Vec::new();
        }
        self.path = path.into();
        if state.resolved() {
            return self.settle(state);
        }
        let mut effects = Vec::with_capacity(2);
        if self.timer_armed {
            effects.push(GateEffect::CancelTimer);
        }
        effects.push(self.arm());
        effects
    }

    fn arm(&mut self) -> GateEffect {
        self.timer_epoch += 1;
        self.timer_armed = true;
        GateEffect::ArmTimer { epoch: self.timer_epoch, after: self.config.check_timeout }
    }

    fn settle(&mut self, state: &SessionState) -> Vec<GateEffect> {
        match state.trusted_user() {
            Some(user) => {
                let mut effects = self.disarm();
                self.status = GateStatus::Authorized(user.clone());
                effects.push(GateEffect::Render(GateView::Content));
                effects
            }
            None => self.deny(DenyReason::NoSession),
        }
    }

    fn deny(&mut self, reason: DenyReason) -> Vec<GateEffect> {
        if self.has_redirected {
            return Vec::new();
        }
        let mut effects = self.disarm();
        self.status = GateStatus::Denied(reason);
        self.has_redirected = true;
        if let Some(notice) = notice_for(&self.config, &self.path, reason) {
            effects.push(GateEffect::Notify(notice));
        }
        effects.push(GateEffect::Redirect(Redirect::to_login(&self.config, &self.path)));
        effects.push(GateEffect::Render(GateView::Nothing));
        effects
    }

    fn disarm(&mut self) -> Vec<GateEffect> {
        if self.timer_armed {
            self.timer_armed = false;
            vec![GateEffect::CancelTimer]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "attempt_test.rs"]
mod tests;
