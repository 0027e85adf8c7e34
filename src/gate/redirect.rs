//! Redirect targets for the login flow.
//!
//! SYSTEM CONTEXT
//! ==============
//! Denied gates send callers to the login view carrying the guarded path; the
//! login flow uses that path to return them once they are signed in.

use serde::{Deserialize, Serialize};

use super::notice::is_auth_path;
use crate::config::GateConfig;
use crate::session::{Identity, SessionState};

pub const TEACHER_DASHBOARD_PATH: &str = "/teacher-dashboard";
pub const STUDENT_DASHBOARD_PATH: &str = "/student-dashboard";

/// Navigation state passed along with a redirect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectState {
    pub from: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub to: String,
    pub state: RedirectState,
    /// Replace the current history entry instead of pushing a new one.
    pub replace: bool,
}

impl Redirect {
    /// Redirect from `guarded_path` to the configured login view.
    #[must_use]
    pub fn to_login(config: &GateConfig, guarded_path: &str) -> Self {
        Self {
            to: config.login_path.clone(),
            state: RedirectState { from: guarded_path.to_owned() },
            replace: true,
        }
    }
}

/// Role home page.
#[must_use]
pub fn dashboard_for(identity: &Identity) -> &'static str {
    if identity.is_teacher() { TEACHER_DASHBOARD_PATH } else { STUDENT_DASHBOARD_PATH }
}

/// Where to go after a successful sign-in.
///
/// Returns to `from` when it names a real in-app page, otherwise to the role
/// dashboard. Auth pages are never used as a return target.
#[must_use]
pub fn post_login_destination(config: &GateConfig, from: Option<&str>, identity: &Identity) -> String {
    match from.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !is_auth_path(config, path) => {
            path.to_owned()
        }
        _ => dashboard_for(identity).to_owned(),
    }
}

/// Auth pages bounce already-authenticated sessions to their dashboard.
#[must_use]
pub fn guest_redirect(config: &GateConfig, path: &str, state: &SessionState) -> Option<&'static str> {
    if !is_auth_path(config, path) {
        return None;
    }
    state.trusted_user().map(dashboard_for)
}

#[cfg(test)]
#[path = "redirect_test.rs"]
mod tests;
