//! Auth Provider: owns credentials and publishes session state.
//!
//! SYSTEM CONTEXT
//! ==============
//! The provider is the single writer of `SessionService`. Gates never call
//! the backend; they only observe what the provider publishes.
//!
//! ERROR HANDLING
//! ==============
//! A failed session check always resolves the session as signed out before
//! the error is returned, so no subscriber is left waiting on `is_loading`.
//! Logout clears local state even when the backend call fails.
//!
//! Token file IO runs on the blocking pool so a slow disk never stalls the
//! runtime thread that also drives mounted gates.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{AppConfig, GateConfig};
use crate::error::AuthError;
use crate::gate::{self, GateHandle, GateSink};
use crate::net::{ApiClient, ApiError, AuthPayload, LoginRequest, RegisterRequest};
use crate::session::{Identity, Role, SessionService, SessionState};
use crate::token_store::{StoredSession, TokenStore, TokenStoreError};

const MISSING_FIELDS_MESSAGE: &str = "Пожалуйста, заполните все поля";
const NO_USER_MESSAGE: &str = "Сервер не вернул данные пользователя";
const NO_TOKEN_MESSAGE: &str = "Сервер не вернул токен";

/// Credential verification backend.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, req: &LoginRequest) -> Result<AuthPayload, ApiError>;
    async fn register(&self, req: &RegisterRequest) -> Result<AuthPayload, ApiError>;
    async fn current_user(&self, token: &str) -> Result<AuthPayload, ApiError>;
    async fn logout(&self, token: &str) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct AuthProvider {
    session: SessionService,
    backend: Arc<dyn AuthBackend>,
    store: Arc<TokenStore>,
    gate: GateConfig,
}

impl AuthProvider {
    #[must_use]
    pub fn new(backend: Arc<dyn AuthBackend>, store: TokenStore, gate: GateConfig) -> Self {
        Self { session: SessionService::new(), backend, store: Arc::new(store), gate }
    }

    /// Provider backed by the REST client described in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, AuthError> {
        let client = ApiClient::new(&config.client)?;
        let store = match &config.client.token_file {
            Some(path) => TokenStore::file(path),
            None => TokenStore::in_memory(),
        };
        Ok(Self::new(Arc::new(client), store, config.gate.clone()))
    }

    #[must_use]
    pub fn session(&self) -> &SessionService {
        &self.session
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.session.snapshot()
    }

    #[must_use]
    pub fn gate_config(&self) -> &GateConfig {
        &self.gate
    }

    /// (Re)resolve the session from the stored token.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no token, the backend rejects it, or the
    /// store fails. The session is resolved as signed out in every error case.
    pub async fn get_current_user(&self) -> Result<Identity, AuthError> {
        self.session.begin_resolve();
        match self.check_stored_token().await {
            Ok(user) => {
                info!(user = %user.id, role = ?user.role, "session restored");
                self.session.complete(Some(user.clone()));
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "failed to get current user");
                if e.invalidates_token() {
                    if let Err(clear_err) = self.with_store(TokenStore::clear).await {
                        warn!(error = %clear_err, "failed to drop rejected token");
                    }
                }
                self.session.sign_out();
                Err(e)
            }
        }
    }

    async fn check_stored_token(&self) -> Result<Identity, AuthError> {
        let token = self.with_store(TokenStore::token).await?.ok_or(AuthError::MissingToken)?;
        let payload = self.backend.current_user(&token).await?;
        let user = payload.user.ok_or(AuthError::Rejected(NO_USER_MESSAGE.to_owned()))?;
        self.save_session(token, &user).await?;
        Ok(user)
    }

    async fn save_session(&self, token: String, user: &Identity) -> Result<(), AuthError> {
        let stored = StoredSession { token, user: Some(user.clone()) };
        self.with_store(move |store| store.save(&stored)).await
    }

    /// Run `op` against the token store, off the runtime thread when it
    /// touches a file.
    async fn with_store<T, F>(&self, op: F) -> Result<T, AuthError>
    where
        T: Send + 'static,
        F: FnOnce(&TokenStore) -> Result<T, TokenStoreError> + Send + 'static,
    {
        if self.store.path().is_none() {
            return Ok(op(&*self.store)?);
        }
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || op(&*store))
            .await
            .map_err(|e| TokenStoreError::Task(e.to_string()))?;
        Ok(result?)
    }

    /// Run the initial session check in the background.
    pub fn spawn_bootstrap(&self) -> JoinHandle<()> {
        let provider = self.clone();
        tokio::spawn(async move {
            // Failures already resolve the session as signed out.
            let _ = provider.get_current_user().await;
        })
    }

    /// # Errors
    ///
    /// Returns a validation error for empty fields, or the backend/store error.
    /// The session is left unchanged on failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(MISSING_FIELDS_MESSAGE));
        }
        let req = LoginRequest { email: email.to_owned(), password: password.to_owned() };
        let payload = self.backend.login(&req).await.inspect_err(|e| warn!(error = %e, "login failed"))?;
        self.establish(payload).await
    }

    /// # Errors
    ///
    /// Returns a validation error for empty fields, or the backend/store error.
    /// The session is left unchanged on failure.
    pub async fn register(&self, name: &str, email: &str, password: &str, role: Role) -> Result<Identity, AuthError> {
        let (name, email) = (name.trim(), email.trim());
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(MISSING_FIELDS_MESSAGE));
        }
        let req = RegisterRequest { name: name.to_owned(), email: email.to_owned(), password: password.to_owned(), role };
        let payload = self
            .backend
            .register(&req)
            .await
            .inspect_err(|e| warn!(error = %e, "registration failed"))?;
        self.establish(payload).await
    }

    async fn establish(&self, payload: AuthPayload) -> Result<Identity, AuthError> {
        let user = payload.user.ok_or(AuthError::Rejected(NO_USER_MESSAGE.to_owned()))?;
        let token = payload.token.ok_or(AuthError::Rejected(NO_TOKEN_MESSAGE.to_owned()))?;
        self.save_session(token, &user).await?;
        info!(user = %user.id, role = ?user.role, "signed in");
        self.session.complete(Some(user.clone()));
        Ok(user)
    }

    /// Sign out locally, telling the backend when a token is present.
    ///
    /// # Errors
    ///
    /// Returns an error only if the stored token cannot be removed. The
    /// session is signed out regardless.
    pub async fn logout(&self) -> Result<(), AuthError> {
        match self.with_store(TokenStore::token).await {
            Ok(Some(token)) => {
                if let Err(e) = self.backend.logout(&token).await {
                    warn!(error = %e, "logout request failed; clearing local session anyway");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not read stored token during logout"),
        }
        self.session.sign_out();
        info!("signed out");
        self.with_store(TokenStore::clear).await
    }

    /// Mount a gate for `path` against this provider's session.
    pub fn guard(&self, path: impl Into<String>, sink: Arc<dyn GateSink>) -> GateHandle {
        gate::mount(self.session.subscribe(), path, self.gate.clone(), sink)
    }
}

#[cfg(test)]
#[path = "provider_test.rs"]
mod tests;
