use std::sync::Mutex;
use std::time::Duration;

use super::*;
use crate::gate::{DenyReason, GateOutcome, GateView, Notice, Redirect};

// =============================================================
// Helpers
// =============================================================

/// Backend with a fixed set of accounts and a configurable `/auth/me` delay.
struct MockBackend {
    me_delay: Duration,
    valid_token: &'static str,
    logout_fails: bool,
    logouts: Mutex<Vec<String>>,
}

impl MockBackend {
    fn new() -> Self {
        Self { me_delay: Duration::ZERO, valid_token: "jwt-good", logout_fails: false, logouts: Mutex::new(Vec::new()) }
    }

    fn with_me_delay(mut self, delay: Duration) -> Self {
        self.me_delay = delay;
        self
    }
}

fn identity(role: Role) -> Identity {
    Identity {
        id: "u-1".to_owned(),
        name: "Test User".to_owned(),
        email: "user@example.com".to_owned(),
        role,
        first_name: None,
        last_name: None,
    }
}

fn unauthorized() -> ApiError {
    ApiError::Status { status: 401, message: "Not authorized, token failed".to_owned() }
}

#[async_trait]
impl AuthBackend for MockBackend {
    async fn login(&self, req: &LoginRequest) -> Result<AuthPayload, ApiError> {
        if req.password != "secret" {
            return Err(ApiError::Status { status: 401, message: "Invalid credentials".to_owned() });
        }
        let role = if req.email.contains("teacher") { Role::Teacher } else { Role::Student };
        Ok(AuthPayload { token: Some(self.valid_token.to_owned()), user: Some(identity(role)), message: None })
    }

    async fn register(&self, req: &RegisterRequest) -> Result<AuthPayload, ApiError> {
        if req.email == "no-token@example.com" {
            return Ok(AuthPayload { token: None, user: Some(identity(req.role)), message: None });
        }
        Ok(AuthPayload { token: Some(self.valid_token.to_owned()), user: Some(identity(req.role)), message: None })
    }

    async fn current_user(&self, token: &str) -> Result<AuthPayload, ApiError> {
        tokio::time::sleep(self.me_delay).await;
        if token == self.valid_token {
            Ok(AuthPayload { token: None, user: Some(identity(Role::Student)), message: None })
        } else {
            Err(unauthorized())
        }
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        self.logouts.lock().expect("mock mutex should lock").push(token.to_owned());
        if self.logout_fails {
            return Err(ApiError::Transport("connection refused".to_owned()));
        }
        Ok(())
    }
}

fn provider_with(backend: MockBackend, token: Option<&str>) -> (AuthProvider, Arc<MockBackend>) {
    let backend = Arc::new(backend);
    let store = TokenStore::in_memory();
    if let Some(token) = token {
        store.save(&StoredSession { token: token.to_owned(), user: None }).unwrap();
    }
    let provider = AuthProvider::new(backend.clone(), store, GateConfig::default());
    (provider, backend)
}

#[derive(Default)]
struct RecordingSink {
    redirects: Mutex<Vec<Redirect>>,
    notices: Mutex<Vec<Notice>>,
}

impl GateSink for RecordingSink {
    fn redirect(&self, redirect: &Redirect) {
        self.redirects.lock().expect("sink mutex should lock").push(redirect.clone());
    }

    fn notify(&self, notice: &Notice) {
        self.notices.lock().expect("sink mutex should lock").push(notice.clone());
    }
}

// =============================================================
// get_current_user
// =============================================================

#[tokio::test]
async fn provider_starts_unresolved() {
    let (provider, _) = provider_with(MockBackend::new(), None);
    assert!(provider.snapshot().is_loading);
}

#[tokio::test]
async fn missing_token_resolves_signed_out() {
    let (provider, _) = provider_with(MockBackend::new(), None);
    let err = provider.get_current_user().await.unwrap_err();
    assert!(matches!(err, AuthError::MissingToken));
    assert_eq!(err.to_string(), "Токен не найден");
    assert_eq!(provider.snapshot(), SessionState::signed_out());
}

#[tokio::test]
async fn valid_token_restores_session() {
    let (provider, _) = provider_with(MockBackend::new(), Some("jwt-good"));
    let user = provider.get_current_user().await.unwrap();
    assert_eq!(user.id, "u-1");
    assert!(provider.snapshot().is_authenticated());
}

#[tokio::test]
async fn rejected_token_is_dropped_and_session_signed_out() {
    let (provider, _) = provider_with(MockBackend::new(), Some("jwt-expired"));
    let err = provider.get_current_user().await.unwrap_err();
    assert!(err.invalidates_token());
    assert!(!provider.snapshot().is_loading);
    assert!(provider.snapshot().user.is_none());
    assert!(provider.store.token().unwrap().is_none());
}

// =============================================================
// login / register / logout
// =============================================================

#[tokio::test]
async fn login_establishes_session_and_stores_token() {
    let (provider, _) = provider_with(MockBackend::new(), None);
    let user = provider.login("teacher@example.com", "secret").await.unwrap();
    assert!(user.is_teacher());
    assert!(provider.snapshot().is_authenticated());
    assert_eq!(provider.store.token().unwrap().as_deref(), Some("jwt-good"));
}

#[tokio::test]
async fn login_failure_leaves_session_untouched() {
    let (provider, _) = provider_with(MockBackend::new(), None);
    let err = provider.login("student@example.com", "wrong").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials");
    assert!(provider.snapshot().is_loading);
}

#[tokio::test]
async fn login_requires_all_fields() {
    let (provider, _) = provider_with(MockBackend::new(), None);
    let err = provider.login("  ", "secret").await.unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));
    assert_eq!(err.to_string(), "Пожалуйста, заполните все поля");
}

#[tokio::test]
async fn register_with_role() {
    let (provider, _) = provider_with(MockBackend::new(), None);
    let user = provider.register("Айгуль", "aigul@example.com", "secret", Role::Teacher).await.unwrap();
    assert!(user.is_teacher());
    assert!(provider.snapshot().is_authenticated());
}

#[tokio::test]
async fn register_without_token_is_rejected() {
    let (provider, _) = provider_with(MockBackend::new(), None);
    let err = provider.register("N", "no-token@example.com", "secret", Role::Student).await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected(_)));
    assert!(!provider.snapshot().is_authenticated());
}

#[tokio::test]
async fn logout_clears_session_and_token() {
    let (provider, backend) = provider_with(MockBackend::new(), None);
    provider.login("student@example.com", "secret").await.unwrap();

    provider.logout().await.unwrap();
    assert_eq!(provider.snapshot(), SessionState::signed_out());
    assert!(provider.store.token().unwrap().is_none());
    assert_eq!(backend.logouts.lock().unwrap().as_slice(), ["jwt-good"]);
}

#[tokio::test]
async fn logout_backend_failure_still_signs_out() {
    let backend = MockBackend { logout_fails: true, ..MockBackend::new() };
    let (provider, _) = provider_with(backend, Some("jwt-good"));
    provider.get_current_user().await.unwrap();

    assert!(provider.logout().await.is_ok());
    assert_eq!(provider.snapshot(), SessionState::signed_out());
}

// =============================================================
// Bootstrap racing the gate
// =============================================================

#[tokio::test(start_paused = true)]
async fn bootstrap_then_guard_authorizes_valid_session() {
    let (provider, _) = provider_with(MockBackend::new().with_me_delay(Duration::from_secs(1)), Some("jwt-good"));
    let sink = Arc::new(RecordingSink::default());

    let handle = provider.guard("/profile", sink.clone());
    provider.spawn_bootstrap();

    assert!(matches!(handle.outcome().await, GateOutcome::Authorized(_)));
    assert!(sink.redirects.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn bootstrap_with_expired_token_denies() {
    let (provider, _) = provider_with(MockBackend::new().with_me_delay(Duration::from_secs(1)), Some("jwt-old"));
    let sink = Arc::new(RecordingSink::default());

    let handle = provider.guard("/dashboard", sink.clone());
    provider.spawn_bootstrap();

    assert_eq!(handle.outcome().await, GateOutcome::Denied(DenyReason::NoSession));
    let redirects = sink.redirects.lock().unwrap();
    assert_eq!(redirects.len(), 1);
    assert_eq!(redirects[0].state.from, "/dashboard");
}

#[tokio::test(start_paused = true)]
async fn slow_backend_times_out_and_late_answer_is_ignored() {
    let (provider, _) = provider_with(MockBackend::new().with_me_delay(Duration::from_secs(8)), Some("jwt-good"));
    let sink = Arc::new(RecordingSink::default());

    let handle = provider.guard("/student-dashboard", sink.clone());
    let view = handle.watch_view();
    let bootstrap = provider.spawn_bootstrap();

    assert_eq!(handle.outcome().await, GateOutcome::Denied(DenyReason::TimedOut));
    bootstrap.await.unwrap();

    assert!(provider.snapshot().is_authenticated());
    assert_eq!(sink.redirects.lock().unwrap().len(), 1);
    assert_eq!(sink.notices.lock().unwrap().len(), 1);
    assert_eq!(*view.borrow(), GateView::Nothing);
}

// =============================================================
// File-backed token store
// =============================================================

#[tokio::test]
async fn file_backed_session_survives_a_new_provider() {
    let path = std::env::temp_dir().join(format!("session-gate-provider-{}", uuid::Uuid::new_v4())).join("session.json");
    let backend = Arc::new(MockBackend::new());

    let first = AuthProvider::new(backend.clone(), TokenStore::file(&path), GateConfig::default());
    first.login("student@example.com", "secret").await.unwrap();
    assert!(path.exists());

    let second = AuthProvider::new(backend.clone(), TokenStore::file(&path), GateConfig::default());
    let user = second.get_current_user().await.unwrap();
    assert_eq!(user.id, "u-1");

    second.logout().await.unwrap();
    assert!(!path.exists());
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
