//! Session snapshot types shared by the provider and the gate.
//!
//! SYSTEM CONTEXT
//! ==============
//! The Auth Provider writes `SessionState`; route gates and identity-aware
//! consumers only ever read it through `SessionService` subscriptions.

pub mod service;

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

pub use service::SessionService;

/// Platform role attached to an identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    /// Unknown roles from the backend are treated as students.
    #[default]
    #[serde(other)]
    Student,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            other => Err(format!("unknown role '{other}' (expected 'student' or 'teacher')")),
        }
    }
}

/// Identity record for an established session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Backend user id. Numeric ids are accepted and stored as strings.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl Identity {
    #[must_use]
    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(id) if !id.is_empty() => Ok(id),
        serde_json::Value::Number(number) => Ok(number.to_string()),
        other => Err(D::Error::custom(format!("invalid user id: {other}"))),
    }
}

/// Current session as reported by the Auth Provider.
///
/// `user` and `is_loading` are independent: a user left over from an earlier
/// resolution must not be trusted while a new check is still running.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<Identity>,
    pub is_loading: bool,
}

impl Default for SessionState {
    /// Nothing is known before the provider's first check completes.
    fn default() -> Self {
        Self { user: None, is_loading: true }
    }
}

impl SessionState {
    #[must_use]
    pub fn signed_in(user: Identity) -> Self {
        Self { user: Some(user), is_loading: false }
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self { user: None, is_loading: false }
    }

    /// True once the provider has finished checking, whatever the outcome.
    #[must_use]
    pub fn resolved(&self) -> bool {
        !self.is_loading
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.resolved() && self.user.is_some()
    }

    /// The identity, but only once the session is resolved.
    #[must_use]
    pub fn trusted_user(&self) -> Option<&Identity> {
        if self.resolved() { self.user.as_ref() } else { None }
    }
}
