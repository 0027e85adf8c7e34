//! Session gate for protected views.
//!
//! SYSTEM CONTEXT
//! ==============
//! One gate is mounted per protected view. It reads `SessionState` from the
//! session service and decides whether the view shows a loading indicator,
//! its protected content, or nothing while the caller is sent to login.
//!
//! DESIGN
//! ======
//! `attempt` is a pure per-mount state machine that returns effects;
//! `driver` runs it on a tokio task, racing session changes against the
//! bounded wait. Whichever source settles the attempt first wins and the
//! other is ignored. `AUTHORIZED` and `DENIED` are terminal for the mount.

pub mod attempt;
pub mod driver;
pub mod notice;
pub mod redirect;

use serde::Serialize;

use crate::session::Identity;

pub use attempt::{GateAttempt, GateEffect};
pub use driver::{GateHandle, GateSink, mount};
pub use notice::{Notice, NoticeLevel};
pub use redirect::{Redirect, RedirectState};

/// Why a gate denied access. Both reasons lead to the same redirect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The provider resolved and reported no session.
    NoSession,
    /// The bounded wait elapsed before the provider resolved.
    TimedOut,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateStatus {
    Pending,
    Authorized(Identity),
    Denied(DenyReason),
}

impl GateStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// What the host should render for the guarded view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateView {
    Loading,
    /// Render nothing; a redirect is under way.
    Nothing,
    Content,
}

/// Final result of one mounted gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateOutcome {
    Authorized(Identity),
    Denied(DenyReason),
    /// Unmounted before reaching a terminal state.
    Unmounted,
}
