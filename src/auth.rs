//! Authentication gate for remote sync.
//!
//! Sign-in itself happens elsewhere; this module only answers "is there a
//! session, and for which account", and remembers a session between runs.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WellkeepError;

/// An authenticated backend session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Backend account id; rows are scoped to it.
    pub account_id: String,
    /// Bearer token for the backend.
    pub access_token: String,
    #[serde(default)]
    pub signed_in_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a session stamped with the current time.
    #[must_use]
    pub fn new(account_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            access_token: access_token.into(),
            signed_in_at: Some(Utc::now()),
        }
    }
}

/// Source of authentication state.
#[cfg_attr(test, mockall::automock)]
pub trait AuthProvider: Send + Sync {
    /// Whether a remote session exists.
    fn is_authenticated(&self) -> bool;

    /// Account id of the current session.
    fn current_account_id(&self) -> Option<String>;

    /// Bearer token of the current session.
    fn access_token(&self) -> Option<String>;
}

/// Auth provider holding an in-memory session.
#[derive(Debug, Default)]
pub struct StaticAuth {
    session: RwLock<Option<Session>>,
}

impl StaticAuth {
    /// Provider with no session.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Provider with a session.
    #[must_use]
    pub fn signed_in(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }

    /// Replace the session.
    pub fn sign_in(&self, session: Session) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    /// Drop the session.
    pub fn sign_out(&self) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn with_session<R>(&self, f: impl FnOnce(&Session) -> R) -> Option<R> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(f)
    }
}

impl From<Option<Session>> for StaticAuth {
    fn from(session: Option<Session>) -> Self {
        Self {
            session: RwLock::new(session),
        }
    }
}

impl AuthProvider for StaticAuth {
    fn is_authenticated(&self) -> bool {
        self.with_session(|_| ()).is_some()
    }

    fn current_account_id(&self) -> Option<String> {
        self.with_session(|s| s.account_id.clone())
    }

    fn access_token(&self) -> Option<String> {
        self.with_session(|s| s.access_token.clone())
    }
}

/// Session persisted as YAML between runs.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    /// Session file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<Session>, WellkeepError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)?;
        serde_yaml::from_str(&contents).map(Some).map_err(|e| {
            WellkeepError::Config(format!(
                "Failed to parse session file {}: {e}",
                self.path.display()
            ))
        })
    }

    /// Store a session, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, session: &Session) -> Result<(), WellkeepError> {
        let contents = serde_yaml::to_string(session)
            .map_err(|e| WellkeepError::Config(format!("Failed to serialize session: {e}")))?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }

    /// Remove the stored session. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<bool, WellkeepError> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_static_auth_sign_in_and_out() {
        let auth = StaticAuth::anonymous();
        assert!(!auth.is_authenticated());
        assert_eq!(auth.current_account_id(), None);

        auth.sign_in(Session::new("acct-1", "token"));
        assert!(auth.is_authenticated());
        assert_eq!(auth.current_account_id().as_deref(), Some("acct-1"));
        assert_eq!(auth.access_token().as_deref(), Some("token"));

        auth.sign_out();
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn test_session_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let file = SessionFile::new(temp_dir.path().join("session.yaml"));

        assert_eq!(file.load().unwrap(), None);

        let session = Session::new("acct-2", "secret");
        file.save(&session).unwrap();
        assert_eq!(file.load().unwrap(), Some(session));

        assert!(file.clear().unwrap());
        assert!(!file.clear().unwrap());
        assert_eq!(file.load().unwrap(), None);
    }

    #[test]
    fn test_session_file_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.yaml");
        std::fs::write(&path, "- not a session").unwrap();

        let err = SessionFile::new(path).load().unwrap_err();
        assert!(matches!(err, WellkeepError::Config(_)));
    }
}
