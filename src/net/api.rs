//! REST client for the auth backend.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx responses become `ApiError::Status` carrying the server's JSON
//! `message`, or a generic `Ошибка запроса: <status>` when the body has none.
//! Plain-text error bodies are not surfaced.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use tracing::{debug, warn};

use super::types::{ApiEnvelope, AuthPayload, LoginRequest, RegisterRequest};
use crate::config::ClientConfig;
use crate::provider::AuthBackend;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("response parse failed: {0}")]
    Decode(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The backend rejected the credentials or token.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

pub(crate) fn request_failed_message(status: u16) -> String {
    format!("Ошибка запроса: {status}")
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: crate::config::normalize_base_url(&config.api_base_url) })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<ApiEnvelope, ApiError> {
        let resp = request.send().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| ApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiEnvelope>(&body)
                .ok()
                .and_then(|env| env.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| request_failed_message(status.as_u16()));
            warn!(status = status.as_u16(), %message, "auth request rejected");
            return Err(ApiError::Status { status: status.as_u16(), message });
        }

        serde_json::from_str::<ApiEnvelope>(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `POST /auth/login`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or bad JSON.
    pub async fn login(&self, req: &LoginRequest) -> Result<AuthPayload, ApiError> {
        debug!(email = %req.email, "login request");
        let envelope = self.send(self.http.post(self.endpoint("/auth/login")).json(req)).await?;
        Ok(envelope.into_payload())
    }

    /// `POST /auth/register`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or bad JSON.
    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthPayload, ApiError> {
        debug!(email = %req.email, role = ?req.role, "register request");
        let envelope = self.send(self.http.post(self.endpoint("/auth/register")).json(req)).await?;
        Ok(envelope.into_payload())
    }

    /// `GET /auth/me` with the bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or bad JSON.
    pub async fn current_user(&self, token: &str) -> Result<AuthPayload, ApiError> {
        let request = self
            .http
            .get(self.endpoint("/auth/me"))
            .header(AUTHORIZATION, format!("Bearer {token}"));
        Ok(self.send(request).await?.into_payload())
    }

    /// `POST /auth/logout` with the bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-2xx status.
    pub async fn logout(&self, token: &str) -> Result<(), ApiError> {
        let request = self
            .http
            .post(self.endpoint("/auth/logout"))
            .header(AUTHORIZATION, format!("Bearer {token}"));
        self.send(request).await.map(|_| ())
    }
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn login(&self, req: &LoginRequest) -> Result<AuthPayload, ApiError> {
        ApiClient::login(self, req).await
    }

    async fn register(&self, req: &RegisterRequest) -> Result<AuthPayload, ApiError> {
        ApiClient::register(self, req).await
    }

    async fn current_user(&self, token: &str) -> Result<AuthPayload, ApiError> {
        ApiClient::current_user(self, token).await
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        ApiClient::logout(self, token).await
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;
