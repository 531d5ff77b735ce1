//! Local-first persisted slot.
//!
//! A [`PersistedSlot`] owns one named piece of state. Every edit lands in the
//! local store first; when a session exists and the one-time remote bootstrap
//! has finished, the edit is then pushed in the background.
//!
//! A remote value fetched at bootstrap only replaces the in-memory value if
//! no local edit happened while the fetch was in flight (last edit wins).

use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::WellkeepError;
use crate::models::{decode, Validate, ValidationError};
use crate::storage::LocalStore;
use crate::sync::{SlotBinding, SyncService};

/// Values a slot can hold.
pub trait SlotValue: Clone + Serialize + DeserializeOwned + Validate + Send + Sync + 'static {}

impl<T> SlotValue for T where T: Clone + Serialize + DeserializeOwned + Validate + Send + Sync + 'static
{}

/// Result of [`PersistedSlot::bootstrap_from_remote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Bootstrap already ran for this slot.
    AlreadyDone,
    /// No remote binding, sync disabled, or not signed in.
    Skipped,
    /// The remote had nothing for this account.
    Empty,
    /// The remote value replaced the local one.
    Applied,
    /// A local edit happened during the fetch and was kept.
    Superseded,
    /// The fetch failed; the local value was kept.
    Failed,
    /// The slot was shut down during the fetch.
    Cancelled,
}

struct SlotState<T> {
    value: T,
    edits: u64,
    bootstrap_started: bool,
    bootstrapped: bool,
}

struct RemoteBinding<T> {
    service: Arc<SyncService>,
    binding: Arc<dyn SlotBinding<T>>,
}

struct SlotInner<T> {
    key: String,
    store: Arc<dyn LocalStore>,
    state: Mutex<SlotState<T>>,
    remote: Option<RemoteBinding<T>>,
    tasks: Mutex<JoinSet<()>>,
    periodic: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
}

/// A named piece of state kept locally and synced when possible.
pub struct PersistedSlot<T> {
    inner: Arc<SlotInner<T>>,
}

impl<T> Clone for PersistedSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: SlotValue> PersistedSlot<T> {
    /// Open a local-only slot.
    ///
    /// Returns the stored value if present and valid, otherwise `default`.
    /// A stored value that fails validation is removed. Never fails.
    pub fn initialize(key: impl Into<String>, default: T, store: Arc<dyn LocalStore>) -> Self {
        Self::build(key.into(), default, store, None)
    }

    /// Open a slot that syncs through `service` using `binding`.
    pub fn initialize_with_remote(
        key: impl Into<String>,
        default: T,
        store: Arc<dyn LocalStore>,
        service: Arc<SyncService>,
        binding: Arc<dyn SlotBinding<T>>,
    ) -> Self {
        Self::build(
            key.into(),
            default,
            store,
            Some(RemoteBinding { service, binding }),
        )
    }

    fn build(
        key: String,
        default: T,
        store: Arc<dyn LocalStore>,
        remote: Option<RemoteBinding<T>>,
    ) -> Self {
        let value = load_local(&key, default, store.as_ref());
        Self {
            inner: Arc::new(SlotInner {
                key,
                store,
                state: Mutex::new(SlotState {
                    value,
                    edits: 0,
                    bootstrap_started: false,
                    bootstrapped: false,
                }),
                remote,
                tasks: Mutex::new(JoinSet::new()),
                periodic: Mutex::new(None),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Storage key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.state().value.clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.state().value)
    }

    /// Whether the remote bootstrap has finished.
    #[must_use]
    pub fn is_bootstrapped(&self) -> bool {
        self.inner.state().bootstrapped
    }

    /// Number of local edits since the slot was opened.
    #[must_use]
    pub fn edit_count(&self) -> u64 {
        self.inner.state().edits
    }

    /// Replace the value with one remote state, once per slot.
    ///
    /// Subsequent calls return [`BootstrapOutcome::AlreadyDone`] without
    /// touching the remote. Bootstrap counts as complete whatever the
    /// outcome; failures are recorded in the sync status, never returned.
    pub async fn bootstrap_from_remote(&self) -> BootstrapOutcome {
        let started_at = {
            let mut state = self.inner.state();
            if state.bootstrap_started {
                return BootstrapOutcome::AlreadyDone;
            }
            state.bootstrap_started = true;
            state.edits
        };

        let outcome = self.fetch_remote(started_at).await;
        self.inner.state().bootstrapped = true;
        debug!(key = %self.inner.key, ?outcome, "bootstrap finished");

        if outcome == BootstrapOutcome::Superseded {
            // Edits made during the fetch were never pushed
            self.spawn_sync();
        }
        outcome
    }

    async fn fetch_remote(&self, started_at: u64) -> BootstrapOutcome {
        let Some(remote) = &self.inner.remote else {
            return BootstrapOutcome::Skipped;
        };
        if !remote.service.can_sync() {
            return BootstrapOutcome::Skipped;
        }
        let Some(account) = remote.service.account_id() else {
            return BootstrapOutcome::Skipped;
        };

        let load = remote.binding.load(remote.service.remote(), &account);
        let loaded = tokio::select! {
            biased;
            () = self.inner.cancel.cancelled() => return BootstrapOutcome::Cancelled,
            loaded = load => loaded,
        };

        match loaded {
            Ok(Some(value)) => {
                let mut state = self.inner.state();
                if state.edits != started_at {
                    info!(key = %self.inner.key, "local edit during bootstrap wins over remote value");
                    return BootstrapOutcome::Superseded;
                }
                self.inner.write_local(&value);
                remote.binding.applied(&account, &value);
                state.value = value;
                BootstrapOutcome::Applied
            },
            Ok(None) => BootstrapOutcome::Empty,
            Err(e) => {
                let label = remote.binding.label();
                remote.service.report_load_error(label, &e.into_load_error());
                BootstrapOutcome::Failed
            },
        }
    }

    /// Record a new value.
    ///
    /// Writes it to local storage, then schedules a background push if the
    /// bootstrap is complete and a session exists. Local storage failures
    /// are logged and the in-memory value is kept. The value is trusted;
    /// use [`set`](Self::set) for unchecked input.
    pub fn on_change(&self, value: T) {
        self.apply::<Infallible>(|_| Ok(value))
            .unwrap_or_else(|never| match never {});
    }

    /// Validate and record a new value.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` and leaves the slot untouched if the value
    /// is invalid.
    pub fn set(&self, value: T) -> Result<(), ValidationError> {
        self.modify(|_| Ok(value))
    }

    /// Derive a new value from the current one, validate it, and record it.
    ///
    /// The read and the write happen under one lock, so concurrent
    /// modifications never lose each other's changes.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or the new value's validation error.
    pub fn modify<F>(&self, f: F) -> Result<(), ValidationError>
    where
        F: FnOnce(&T) -> Result<T, ValidationError>,
    {
        self.apply(|current| {
            let next = f(current)?;
            next.validate()?;
            Ok(next)
        })
    }

    fn apply<E>(&self, f: impl FnOnce(&T) -> Result<T, E>) -> Result<(), E> {
        let should_sync = {
            let mut state = self.inner.state();
            let next = f(&state.value)?;
            self.inner.write_local(&next);
            state.value = next;
            state.edits += 1;
            state.bootstrapped
        };

        if should_sync {
            self.spawn_sync();
        }
        Ok(())
    }

    fn spawn_sync(&self) {
        let Some(remote) = &self.inner.remote else {
            return;
        };
        if self.inner.cancel.is_cancelled() || !remote.service.can_sync() {
            return;
        }
        let Ok(handle) = Handle::try_current() else {
            debug!(key = %self.inner.key, "no runtime, edit stays local");
            return;
        };

        let inner = Arc::clone(&self.inner);
        let mut tasks = self.inner.tasks();
        while tasks.try_join_next().is_some() {}
        tasks.spawn_on(
            async move {
                tokio::select! {
                    biased;
                    () = inner.cancel.cancelled() => {},
                    _ = inner.push() => {},
                }
            },
            &handle,
        );
    }

    /// Wait for every background push scheduled so far.
    pub async fn flush(&self) {
        let mut pending = std::mem::take(&mut *self.inner.tasks());
        while pending.join_next().await.is_some() {}
    }

    /// Push the current value now (manual retry).
    ///
    /// Clears the sync error first.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a session, `Config` if sync is
    /// disabled, or the push failure.
    pub async fn sync_now(&self) -> Result<(), WellkeepError> {
        let Some(remote) = &self.inner.remote else {
            return Err(WellkeepError::Config(format!(
                "{} is not synced",
                self.inner.key
            )));
        };
        if remote.service.account_id().is_none() {
            return Err(WellkeepError::NotAuthenticated);
        }
        if !remote.service.can_sync() {
            return Err(WellkeepError::Config("sync is disabled".to_string()));
        }

        remote.service.clear_error();
        self.inner.push().await
    }

    /// Re-push the value every `period`, independent of edits.
    ///
    /// Replaces any previous timer. Returns `false` outside a tokio runtime.
    pub fn start_periodic_sync(&self, period: Duration) -> bool {
        let Ok(handle) = Handle::try_current() else {
            warn!(key = %self.inner.key, "no runtime, periodic sync not started");
            return false;
        };

        let weak: Weak<SlotInner<T>> = Arc::downgrade(&self.inner);
        let cancel = self.inner.cancel.clone();
        let key = self.inner.key.clone();

        let timer = handle.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = interval.tick() => {},
                }

                let Some(inner) = weak.upgrade() else { break };
                let due = inner.state().bootstrapped
                    && inner.remote.as_ref().is_some_and(|r| r.service.can_sync());
                if due {
                    debug!(key = %key, "periodic sync");
                    let _ = inner.push().await;
                }
            }
        });

        if let Some(previous) = self.inner.periodic().replace(timer) {
            previous.abort();
        }
        true
    }

    /// Stop the periodic timer and abort pending pushes.
    ///
    /// No state is touched by background work afterwards.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(timer) = self.inner.periodic().take() {
            timer.abort();
        }
        self.inner.tasks().abort_all();
    }
}

impl<T: SlotValue> SlotInner<T> {
    fn state(&self) -> MutexGuard<'_, SlotState<T>> {
        lock(&self.state)
    }

    fn tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        lock(&self.tasks)
    }

    fn periodic(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        lock(&self.periodic)
    }

    fn write_local(&self, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(WellkeepError::from)
            .and_then(|raw| self.store.write(&self.key, &raw));
        if let Err(e) = result {
            warn!(key = %self.key, error = %e, "local write failed, value kept in memory");
        }
    }

    async fn push(&self) -> Result<(), WellkeepError> {
        let Some(remote) = &self.remote else {
            return Ok(());
        };
        let account = remote
            .service
            .account_id()
            .ok_or(WellkeepError::NotAuthenticated)?;
        let value = self.state().value.clone();

        remote
            .service
            .run_sync(remote.binding.label(), async {
                remote
                    .binding
                    .save(remote.service.remote(), &account, &value)
                    .await
                    .map_err(WellkeepError::into_sync_error)
            })
            .await
    }
}

impl<T> Drop for SlotInner<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(timer) = lock(&self.periodic).take() {
            timer.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn load_local<T: SlotValue>(key: &str, default: T, store: &dyn LocalStore) -> T {
    let raw = match store.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return default,
        Err(e) => {
            warn!(key, error = %e, "local read failed, using default");
            return default;
        },
    };

    match decode::<T>(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "discarding invalid local value");
            if let Err(e) = store.remove(key) {
                warn!(key, error = %e, "could not remove invalid local value");
            }
            default
        },
    }
}
