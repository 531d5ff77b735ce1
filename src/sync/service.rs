//! Sync service.
//!
//! Owns the remote client, the auth gate, and the shared [`SyncStatus`].
//! One instance is created per process and handed to every slot that syncs;
//! observers register with [`SyncService::subscribe`] and are notified on
//! every status change.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, warn};

use super::status::SyncStatus;
use crate::auth::AuthProvider;
use crate::error::WellkeepError;
use crate::remote::RemoteStore;

/// Handle returned by [`SyncService::subscribe`].
pub type ListenerId = u64;

type Listener = Arc<dyn Fn(&SyncStatus) + Send + Sync>;

#[derive(Default)]
struct StatusState {
    status: SyncStatus,
    in_flight: usize,
}

impl StatusState {
    fn finish_one(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.status.syncing = self.in_flight > 0;
    }
}

/// Releases a sync slot if the sync future is dropped before completing.
struct InFlight<'a> {
    service: &'a SyncService,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.service.update(StatusState::finish_one);
        }
    }
}

/// Coordinates remote syncs and broadcasts their status.
pub struct SyncService {
    auth: Arc<dyn AuthProvider>,
    remote: Arc<dyn RemoteStore>,
    enabled: bool,
    state: Mutex<StatusState>,
    listeners: Mutex<BTreeMap<ListenerId, Listener>>,
    next_listener: AtomicU64,
}

impl SyncService {
    /// Create a service with sync enabled.
    #[must_use]
    pub fn new(auth: Arc<dyn AuthProvider>, remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            auth,
            remote,
            enabled: true,
            state: Mutex::new(StatusState::default()),
            listeners: Mutex::new(BTreeMap::new()),
            next_listener: AtomicU64::new(1),
        }
    }

    /// Turn background pushes on or off (`sync.enabled`).
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether remote calls should be made: enabled and signed in.
    #[must_use]
    pub fn can_sync(&self) -> bool {
        self.enabled && self.auth.is_authenticated()
    }

    /// Account id of the current session.
    #[must_use]
    pub fn account_id(&self) -> Option<String> {
        self.auth.current_account_id()
    }

    /// The remote client.
    #[must_use]
    pub fn remote(&self) -> &dyn RemoteStore {
        self.remote.as_ref()
    }

    /// Snapshot of the current status.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.state().status.clone()
    }

    /// Register a status observer.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SyncStatus) + Send + Sync + 'static,
    {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners().insert(id, Arc::new(listener));
        id
    }

    /// Remove a status observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners().remove(&id).is_some()
    }

    /// Run one remote operation, tracking it in the status.
    ///
    /// Overlapping runs are allowed; `syncing` stays set until the last one
    /// finishes and the last one to finish decides `error`.
    ///
    /// # Errors
    ///
    /// Returns whatever `operation` returns, after recording it.
    pub async fn run_sync<F>(&self, label: &str, operation: F) -> Result<(), WellkeepError>
    where
        F: Future<Output = Result<(), WellkeepError>>,
    {
        self.update(|state| {
            state.in_flight += 1;
            state.status.syncing = true;
        });
        let mut in_flight = InFlight {
            service: self,
            settled: false,
        };

        let result = operation.await;

        in_flight.settled = true;
        self.update(|state| {
            state.finish_one();
            match &result {
                Ok(()) => {
                    state.status.last_sync = Some(Utc::now());
                    state.status.error = None;
                },
                Err(e) => state.status.error = Some(format!("{label}: {e}")),
            }
        });

        match &result {
            Ok(()) => debug!(label, "sync succeeded"),
            Err(e) => warn!(label, error = %e, "sync failed"),
        }
        result
    }

    /// Record a failed bootstrap load without touching `last_sync`.
    pub fn report_load_error(&self, label: &str, error: &WellkeepError) {
        warn!(label, error = %error, "remote load failed");
        let message = format!("{label}: {error}");
        self.update(|state| state.status.error = Some(message));
    }

    /// Clear the error before a manual retry.
    pub fn clear_error(&self) {
        self.update(|state| state.status.error = None);
    }

    fn update(&self, change: impl FnOnce(&mut StatusState)) {
        let snapshot = {
            let mut state = self.state();
            change(&mut state);
            state.status.clone()
        };

        // Listeners run outside both locks so they may call back in
        let listeners: Vec<Listener> = self.listeners().values().cloned().collect();
        for listener in listeners {
            listener(&snapshot);
        }
    }

    fn state(&self) -> MutexGuard<'_, StatusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> MutexGuard<'_, BTreeMap<ListenerId, Listener>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MockAuthProvider;
    use crate::remote::MemoryRemote;

    fn service_with(authenticated: bool) -> SyncService {
        let mut auth = MockAuthProvider::new();
        auth.expect_is_authenticated().return_const(authenticated);
        auth.expect_current_account_id()
            .returning(move || authenticated.then(|| "acct".to_string()));
        SyncService::new(Arc::new(auth), Arc::new(MemoryRemote::new()))
    }

    #[test]
    fn test_can_sync_requires_session() {
        assert!(service_with(true).can_sync());
        assert!(!service_with(false).can_sync());
    }

    #[test]
    fn test_disabled_service_never_syncs() {
        let service = service_with(true).with_enabled(false);
        assert!(!service.can_sync());
    }

    #[tokio::test]
    async fn test_run_sync_success_records_last_sync() {
        let service = service_with(true);

        service.run_sync("tasks", async { Ok(()) }).await.unwrap();

        let status = service.status();
        assert!(!status.syncing);
        assert!(status.last_sync.is_some());
        assert!(status.error.is_none());
    }

    #[tokio::test]
    async fn test_run_sync_failure_records_error() {
        let service = service_with(true);

        let result = service
            .run_sync("tasks", async {
                Err(WellkeepError::Remote("offline".to_string()))
            })
            .await;

        assert!(result.is_err());
        let status = service.status();
        assert!(status.last_sync.is_none());
        assert_eq!(status.error.as_deref(), Some("tasks: Remote error: offline"));
    }

    #[tokio::test]
    async fn test_success_clears_previous_error() {
        let service = service_with(true);
        service.report_load_error("sleep", &WellkeepError::Remote("offline".to_string()));
        assert!(service.status().has_error());

        service.run_sync("sleep", async { Ok(()) }).await.unwrap();
        assert!(!service.status().has_error());
    }

    #[tokio::test]
    async fn test_listeners_see_syncing_transitions() {
        let service = service_with(true);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = service.subscribe(move |status| sink.lock().unwrap().push(status.syncing));

        service.run_sync("tasks", async { Ok(()) }).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![true, false]);

        assert!(service.unsubscribe(id));
        assert!(!service.unsubscribe(id));
        service.clear_error();
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_dropped_run_releases_syncing() {
        let service = service_with(true);
        {
            let pending = service.run_sync("tasks", std::future::pending());
            tokio::pin!(pending);
            let polled = tokio::time::timeout(
                std::time::Duration::from_millis(5),
                &mut pending,
            )
            .await;
            assert!(polled.is_err());
            assert!(service.status().syncing);
        }

        let status = service.status();
        assert!(!status.syncing);
        assert!(status.last_sync.is_none());
    }

    #[tokio::test]
    async fn test_overlapping_runs_keep_syncing_set() {
        let service = Arc::new(service_with(true));
        let (release, wait) = tokio::sync::oneshot::channel::<()>();

        let slow = {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .run_sync("slow", async move {
                        let _ = wait.await;
                        Ok(())
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        while !service.status().syncing {
            tokio::task::yield_now().await;
        }

        service.run_sync("fast", async { Ok(()) }).await.unwrap();
        assert!(service.status().syncing);

        release.send(()).unwrap();
        slow.await.unwrap().unwrap();
        assert!(!service.status().syncing);
    }
}
