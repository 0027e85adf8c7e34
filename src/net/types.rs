//! Wire types for the auth backend.
//!
//! DESIGN
//! ======
//! The backend answers in two shapes: `{ success, token, user }` from the
//! real controllers and `{ success, data: { user, data: <token> } }` from the
//! demo routes. `ApiEnvelope` accepts both and `AuthPayload` normalizes them.

use serde::{Deserialize, Serialize};

use crate::session::{Identity, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Response body common to every auth endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<Identity>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Token and identity extracted from an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPayload {
    pub token: Option<String>,
    pub user: Option<Identity>,
    pub message: Option<String>,
}

impl ApiEnvelope {
    /// Flatten top-level and `data`-nested fields. Top-level values win.
    #[must_use]
    pub fn into_payload(self) -> AuthPayload {
        let nested = self.data.as_ref().and_then(serde_json::Value::as_object);

        let token = self.token.filter(|t| !t.is_empty()).or_else(|| {
            nested.and_then(|data| {
                ["token", "data"]
                    .iter()
                    .find_map(|key| data.get(*key).and_then(serde_json::Value::as_str))
                    .filter(|t| !t.is_empty())
                    .map(str::to_owned)
            })
        });

        let user = self.user.or_else(|| {
            nested
                .and_then(|data| data.get("user"))
                .and_then(|value| serde_json::from_value::<Identity>(value.clone()).ok())
        });

        let message = self.message.or_else(|| {
            nested
                .and_then(|data| data.get("message"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        });

        AuthPayload { token, user, message }
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
