//! Observable sync status.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of the most recent remote synchronization attempt.
///
/// Process-local and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    /// A sync is in flight.
    pub syncing: bool,
    /// Completion time of the last successful sync.
    pub last_sync: Option<DateTime<Utc>>,
    /// Message from the last failed load or sync, cleared by the next success.
    pub error: Option<String>,
}

impl SyncStatus {
    /// Whether the last attempt failed.
    #[must_use]
    pub const fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status() {
        let status = SyncStatus::default();
        assert!(!status.syncing);
        assert!(status.last_sync.is_none());
        assert!(!status.has_error());
    }

    #[test]
    fn test_serializes_nulls() {
        let json = serde_json::to_value(SyncStatus::default()).unwrap();
        assert_eq!(json["syncing"], false);
        assert!(json["last_sync"].is_null());
        assert!(json["error"].is_null());
    }
}
