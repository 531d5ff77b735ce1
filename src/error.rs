//! Error types for wellkeep.

use thiserror::Error;

use crate::models::ValidationError;

/// Wellkeep error type.
///
/// The reconciler itself never lets these escape to its callers: storage
/// failures degrade to in-memory behaviour and remote failures land in the
/// sync status. They do surface from the lower layers and the CLI.
#[derive(Error, Debug)]
pub enum WellkeepError {
    /// Local durable storage read/write failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite error
    #[error("Database error: {0}")]
    Database(String),

    /// Remote request failure (transport, HTTP status, malformed body)
    #[error("Remote error: {0}")]
    Remote(String),

    /// Bootstrap fetch from the remote store failed
    #[error("Remote load failed: {0}")]
    RemoteLoad(String),

    /// Background push to the remote store failed
    #[error("Remote sync failed: {0}")]
    RemoteSync(String),

    /// A persisted or incoming record failed schema validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No remote session
    #[error("Not signed in")]
    NotAuthenticated,

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON error
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WellkeepError {
    /// Whether this error came from the remote collaborator.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Remote(_) | Self::RemoteLoad(_) | Self::RemoteSync(_) | Self::NotAuthenticated
        )
    }

    /// Reclassify a transport failure as a failed bootstrap load.
    #[must_use]
    pub fn into_load_error(self) -> Self {
        match self {
            Self::Remote(msg) | Self::RemoteSync(msg) => Self::RemoteLoad(msg),
            other => other,
        }
    }

    /// Reclassify a transport failure as a failed background sync.
    #[must_use]
    pub fn into_sync_error(self) -> Self {
        match self {
            Self::Remote(msg) | Self::RemoteLoad(msg) => Self::RemoteSync(msg),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_is_transparent() {
        let err: WellkeepError = ValidationError::new("time", "expected HH:MM").into();
        assert_eq!(err.to_string(), "invalid time: expected HH:MM");
        assert!(!err.is_remote());
    }

    #[test]
    fn test_remote_classification() {
        assert!(WellkeepError::RemoteSync("timeout".to_string()).is_remote());
        assert!(WellkeepError::NotAuthenticated.is_remote());
        assert!(!WellkeepError::Storage("quota".to_string()).is_remote());
    }

    #[test]
    fn test_reclassify_remote_errors() {
        let load = WellkeepError::Remote("timeout".to_string()).into_load_error();
        assert!(matches!(load, WellkeepError::RemoteLoad(ref m) if m == "timeout"));

        let sync = WellkeepError::Remote("timeout".to_string()).into_sync_error();
        assert_eq!(sync.to_string(), "Remote sync failed: timeout");

        assert!(matches!(
            WellkeepError::NotAuthenticated.into_sync_error(),
            WellkeepError::NotAuthenticated
        ));
    }
}
