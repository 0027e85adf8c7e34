//! Client-side session gate for the test-preparation platform.
//!
//! ARCHITECTURE
//! ============
//! `provider::AuthProvider` talks to the auth backend (`net`) and keeps the
//! token in `token_store`. It publishes `session::SessionState` through a
//! `SessionService`. Each protected view mounts a `gate` that subscribes to
//! that service and decides between loading, content, and a login redirect.

pub mod config;
pub mod error;
pub mod gate;
pub mod net;
pub mod provider;
pub mod session;
pub mod token_store;

pub use config::{AppConfig, ClientConfig, GateConfig};
pub use error::AuthError;
pub use gate::{DenyReason, GateHandle, GateOutcome, GateSink, GateView};
pub use provider::{AuthBackend, AuthProvider};
pub use session::{Identity, Role, SessionService, SessionState};
