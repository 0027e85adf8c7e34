//! Errors raised by Auth Provider operations.
//!
//! The gate itself never fails: a denied session is an outcome, not an error.

use crate::net::ApiError;
use crate::token_store::TokenStoreError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] TokenStoreError),
    /// No stored token to check.
    #[error("Токен не найден")]
    MissingToken,
    /// The backend answered 2xx but without the expected identity or token.
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Validation(&'static str),
}

impl AuthError {
    /// The stored credentials are no longer valid and should be dropped.
    #[must_use]
    pub fn invalidates_token(&self) -> bool {
        match self {
            Self::Api(e) => e.is_unauthorized(),
            Self::Rejected(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
