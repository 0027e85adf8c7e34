//! Persistent storage for the session token and cached identity.
//!
//! DESIGN
//! ======
//! The last saved session is cached in memory. With a file path configured it
//! is also written as JSON so a later process can bootstrap from it. A
//! missing file means "no session", not an error.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::session::Identity;

#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("token file io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("token file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("token file task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    #[serde(default)]
    pub user: Option<Identity>,
}

#[derive(Debug, Default)]
pub struct TokenStore {
    path: Option<PathBuf>,
    cached: Mutex<Option<StoredSession>>,
}

impl TokenStore {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self { path: Some(path.into()), cached: Mutex::new(None) }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load the stored session, reading the file on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<StoredSession>, TokenStoreError> {
        let mut cached = self.cached.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if cached.is_some() {
            return Ok(cached.clone());
        }
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredSession = serde_json::from_str(&raw)?;
        if stored.token.is_empty() {
            return Ok(None);
        }
        *cached = Some(stored.clone());
        Ok(Some(stored))
    }

    /// # Errors
    ///
    /// Returns an error if the token file cannot be written.
    pub fn save(&self, session: &StoredSession) -> Result<(), TokenStoreError> {
        let mut cached = self.cached.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, serde_json::to_vec_pretty(session)?)?;
            debug!(path = %path.display(), "session token saved");
        }
        *cached = Some(session.clone());
        Ok(())
    }

    /// Forget the stored session. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing token file cannot be removed.
    pub fn clear(&self) -> Result<(), TokenStoreError> {
        let mut cached = self.cached.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *cached = None;
        if let Some(path) = &self.path {
            match std::fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "session token removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Same as [`TokenStore::load`].
    pub fn token(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self.load()?.map(|s| s.token))
    }
}

#[cfg(test)]
#[path = "token_store_test.rs"]
mod tests;
