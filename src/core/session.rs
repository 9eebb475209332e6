use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::AppConfig;

/// Environment variable that overrides any stored token.
pub const TOKEN_ENV: &str = "CALLDASH_TOKEN";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to access session file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse session file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Credentials granted by `/auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginGrant {
    pub token: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Shared handle to the current bearer token.
///
/// The transport reads the token for every request and clears it when the
/// backend answers 401; the presentation layer watches `is_authenticated`
/// to send the user back to `login`.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<SessionState>>,
}

impl Session {
    pub fn new(state: SessionState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self::new(SessionState {
            token: Some(token.into()),
            username: None,
        })
    }

    pub fn token(&self) -> Option<String> {
        self.inner.read().token.clone()
    }

    pub fn username(&self) -> Option<String> {
        self.inner.read().username.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner
            .read()
            .token
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }

    pub fn establish(&self, grant: &LoginGrant) {
        let mut state = self.inner.write();
        state.token = Some(grant.token.clone());
        state.username = Some(grant.username.clone());
    }

    pub fn clear(&self) {
        let mut state = self.inner.write();
        if state.token.is_some() {
            tracing::info!("clearing session");
        }
        *state = SessionState::default();
    }

    pub fn state(&self) -> SessionState {
        self.inner.read().clone()
    }
}

/// On-disk persistence for the session token between runs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn default_path() -> PathBuf {
        AppConfig::config_dir().join("session.json")
    }

    pub fn new() -> Self {
        Self::at(Self::default_path())
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file means logged out, not an error.
    pub fn load(&self) -> Result<SessionState, SessionError> {
        if !self.path.exists() {
            return Ok(SessionState::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, state: &SessionState) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, content)?;
        restrict_permissions(&self.path)?;
        Ok(())
    }

    pub fn remove(&self) -> Result<bool, SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Build the live session: `CALLDASH_TOKEN` first, then the stored file.
    pub fn resolve(&self) -> Result<Session, SessionError> {
        let mut state = self.load()?;
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                tracing::debug!("using token from {}", TOKEN_ENV);
                state.token = Some(token);
            }
        }
        Ok(Session::new(state))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant() -> LoginGrant {
        LoginGrant {
            token: "1:admin:1710000000:abc".into(),
            username: "admin".into(),
            full_name: Some("Administrator".into()),
        }
    }

    #[test]
    fn empty_session_is_not_authenticated() {
        assert!(!Session::default().is_authenticated());
        assert!(!Session::with_token("").is_authenticated());
    }

    #[test]
    fn establish_then_clear() {
        let session = Session::default();
        session.establish(&grant());
        assert!(session.is_authenticated());
        assert_eq!(session.username().as_deref(), Some("admin"));

        session.clear();
        assert!(!session.is_authenticated());
        assert!(session.username().is_none());
    }

    #[test]
    fn clones_share_state() {
        let session = Session::with_token("t");
        let transport_view = session.clone();
        transport_view.clear();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("nested").join("session.json"));
        let session = Session::default();
        session.establish(&grant());

        store.save(&session.state()).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.token.as_deref(), Some("1:admin:1710000000:abc"));
        assert_eq!(loaded.username.as_deref(), Some("admin"));
    }

    #[test]
    fn missing_file_loads_as_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("session.json"));
        assert_eq!(store.load().unwrap(), SessionState::default());
        assert!(!store.remove().unwrap());
    }

    #[test]
    fn remove_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("session.json"));
        store.save(&SessionState::default()).unwrap();
        assert!(store.remove().unwrap());
        assert!(!store.path().exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            SessionStore::at(path).load(),
            Err(SessionError::Parse(_))
        ));
    }
}
