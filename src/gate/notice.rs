//! Advisory notices shown when a gate denies access.

use serde::Serialize;

use super::DenyReason;
use crate::config::GateConfig;

const NO_SESSION_TITLE: &str = "Требуется авторизация";
const NO_SESSION_TEXT: &str = "Для доступа к этой странице необходимо войти в систему";
const TIMED_OUT_TITLE: &str = "Ошибка аутентификации";
const TIMED_OUT_TEXT: &str = "Не удалось проверить аутентификацию. Пожалуйста, войдите снова";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A single toast-style message for the host UI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub text: String,
}

impl Notice {
    #[must_use]
    pub fn for_reason(reason: DenyReason) -> Self {
        match reason {
            DenyReason::NoSession => Self {
                level: NoticeLevel::Info,
                title: NO_SESSION_TITLE.to_owned(),
                text: NO_SESSION_TEXT.to_owned(),
            },
            DenyReason::TimedOut => Self {
                level: NoticeLevel::Error,
                title: TIMED_OUT_TITLE.to_owned(),
                text: TIMED_OUT_TEXT.to_owned(),
            },
        }
    }
}

/// Paths belonging to the auth flow itself. Denials there stay silent.
///
/// The configured login and registration routes always count, query and
/// fragment ignored. Any path mentioning `login` or `register` counts too.
#[must_use]
pub fn is_auth_path(config: &GateConfig, path: &str) -> bool {
    let route = path.split(['?', '#']).next().unwrap_or(path);
    route == config.login_path
        || route == config.register_path
        || path.contains("login")
        || path.contains("register")
}

/// Notice to show for a denial on `path`, if any.
#[must_use]
pub fn notice_for(config: &GateConfig, path: &str, reason: DenyReason) -> Option<Notice> {
    if is_auth_path(config, path) { None } else { Some(Notice::for_reason(reason)) }
}

#[cfg(test)]
#[path = "notice_test.rs"]
mod tests;
