//! Auth backend client and its wire types.

pub mod api;
pub mod types;

pub use api::{ApiClient, ApiError};
pub use types::{ApiEnvelope, AuthPayload, LoginRequest, RegisterRequest};
