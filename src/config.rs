//! Runtime configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_AUTH_API_URL: &str = "http://127.0.0.1:5000/api";
pub const DEFAULT_AUTH_CHECK_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_AUTH_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_REGISTER_PATH: &str = "/register";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must not be empty")]
    Empty { var: &'static str },
    #[error("{var} must start with '/': {value}")]
    RelativePath { var: &'static str, value: String },
}

/// Settings for every mounted gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// Where denied callers are sent.
    pub login_path: String,
    pub register_path: String,
    /// Bounded wait for the session check.
    pub check_timeout: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
            register_path: DEFAULT_REGISTER_PATH.to_owned(),
            check_timeout: Duration::from_millis(DEFAULT_AUTH_CHECK_TIMEOUT_MS),
        }
    }
}

/// Settings for the REST client and token storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    /// Persist the token here; in-memory only when `None`.
    pub token_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_AUTH_API_URL.to_owned(),
            request_timeout: Duration::from_secs(DEFAULT_AUTH_REQUEST_TIMEOUT_SECS),
            token_file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub gate: GateConfig,
    pub client: ClientConfig,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `AUTH_API_URL`: default `http://127.0.0.1:5000/api`
    /// - `AUTH_CHECK_TIMEOUT_MS`: default 5000
    /// - `AUTH_REQUEST_TIMEOUT_SECS`: default 10
    /// - `LOGIN_PATH`: default `/login`
    /// - `REGISTER_PATH`: default `/register`
    /// - `SESSION_TOKEN_FILE`: unset keeps the token in memory
    ///
    /// # Errors
    ///
    /// Returns an error if a route path is empty or not absolute.
    pub fn from_env() -> Result<Self, ConfigError> {
        let gate = GateConfig {
            login_path: route_path("LOGIN_PATH", std::env::var("LOGIN_PATH").ok(), DEFAULT_LOGIN_PATH)?,
            register_path: route_path("REGISTER_PATH", std::env::var("REGISTER_PATH").ok(), DEFAULT_REGISTER_PATH)?,
            check_timeout: Duration::from_millis(env_parse("AUTH_CHECK_TIMEOUT_MS", DEFAULT_AUTH_CHECK_TIMEOUT_MS)),
        };
        let client = ClientConfig {
            api_base_url: normalize_base_url(
                &std::env::var("AUTH_API_URL").unwrap_or_else(|_| DEFAULT_AUTH_API_URL.to_owned()),
            ),
            request_timeout: Duration::from_secs(env_parse(
                "AUTH_REQUEST_TIMEOUT_SECS",
                DEFAULT_AUTH_REQUEST_TIMEOUT_SECS,
            )),
            token_file: std::env::var("SESSION_TOKEN_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        };
        Ok(Self { gate, client })
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

pub(crate) fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn route_path(var: &'static str, raw: Option<String>, default: &str) -> Result<String, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default.to_owned());
    };
    let value = raw.trim();
    if value.is_empty() {
        return Err(ConfigError::Empty { var });
    }
    if !value.starts_with('/') {
        return Err(ConfigError::RelativePath { var, value: value.to_owned() });
    }
    Ok(value.to_owned())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
