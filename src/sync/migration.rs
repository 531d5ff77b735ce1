//! One-time push of pre-existing local data to a newly signed-in account.
//!
//! The per-account flag is written even when a push fails, so a broken
//! backend never causes a retry on every login. Partial migrations are not
//! repaired.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::bindings::{RecordBinding, SlotBinding, TasksBinding};
use super::service::SyncService;
use crate::error::WellkeepError;
use crate::models::{
    decode, keys, CaffeineSettings, FastingState, SleepMode, SleepState, Task, TodoData, Validate,
    ValidationError,
};
use crate::remote::TASKS;
use crate::storage::LocalStore;

/// Result of [`MigrationGuard::migrate_if_needed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The account was migrated before; nothing was pushed.
    AlreadyDone,
    /// Another call for the same account is running.
    InProgress,
    /// Legacy data was pushed and the flag set.
    Migrated {
        /// Entities pushed successfully
        pushed: usize,
        /// Entities whose push failed
        failed: usize,
    },
}

enum Phase {
    Running,
    Done,
}

/// Flag-gated migration of legacy local slots.
pub struct MigrationGuard {
    store: Arc<dyn LocalStore>,
    service: Arc<SyncService>,
    accounts: Mutex<HashMap<String, Phase>>,
}

impl MigrationGuard {
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>, service: Arc<SyncService>) -> Self {
        Self {
            store,
            service,
            accounts: Mutex::new(HashMap::new()),
        }
    }

    /// Whether the account's flag is set in local storage.
    #[must_use]
    pub fn is_done(&self, account_id: &str) -> bool {
        match self.store.read(&keys::migration_flag(account_id)) {
            Ok(Some(raw)) => decode::<bool>(&raw).unwrap_or(false),
            Ok(None) => false,
            Err(e) => {
                warn!(account_id, error = %e, "migration flag unreadable");
                false
            },
        }
    }

    /// Push legacy local data for `account_id` unless that already happened.
    ///
    /// Calling this any number of times for one account pushes at most once.
    pub async fn migrate_if_needed(&self, account_id: &str) -> MigrationOutcome {
        {
            let mut accounts = self.accounts();
            match accounts.get(account_id) {
                Some(Phase::Done) => return MigrationOutcome::AlreadyDone,
                Some(Phase::Running) => return MigrationOutcome::InProgress,
                None => {},
            }
            if self.is_done(account_id) {
                accounts.insert(account_id.to_string(), Phase::Done);
                return MigrationOutcome::AlreadyDone;
            }
            accounts.insert(account_id.to_string(), Phase::Running);
        }

        let mut running = RunningGuard {
            accounts: &self.accounts,
            account_id,
            finished: false,
        };

        let (pushed, failed) = self.push_legacy(account_id).await;

        if let Err(e) = self
            .store
            .write(&keys::migration_flag(account_id), "true")
        {
            warn!(account_id, error = %e, "could not persist migration flag");
        }
        running.finish();

        info!(account_id, pushed, failed, "legacy data migrated");
        MigrationOutcome::Migrated { pushed, failed }
    }

    async fn push_legacy(&self, account_id: &str) -> (usize, usize) {
        let mut pushed = 0;
        let mut failed = 0;
        let mut tally = |result: Option<Result<(), WellkeepError>>| match result {
            Some(Ok(())) => pushed += 1,
            Some(Err(_)) => failed += 1,
            None => {},
        };

        tally(self.push_tasks(account_id).await);
        tally(
            self.push_record(account_id, RecordBinding::sleep(), self.legacy_sleep())
                .await,
        );
        tally(
            self.push_record(account_id, RecordBinding::caffeine(), self.legacy_caffeine())
                .await,
        );
        tally(
            self.push_record(
                account_id,
                RecordBinding::fasting(),
                self.read_legacy::<FastingState>(keys::FASTING_STATE),
            )
            .await,
        );

        (pushed, failed)
    }

    async fn push_tasks(&self, account_id: &str) -> Option<Result<(), WellkeepError>> {
        let data = self.legacy_todo()?;
        if data.tasks.is_empty() {
            return None;
        }

        // Upsert only: remote tasks from other devices are left alone
        let rows = TasksBinding::rows(account_id, &data);
        let remote = self.service.remote();
        Some(
            self.service
                .run_sync(TASKS, async {
                    remote
                        .upsert(TASKS, &rows)
                        .await
                        .map_err(WellkeepError::into_sync_error)
                })
                .await,
        )
    }

    async fn push_record<T>(
        &self,
        account_id: &str,
        binding: RecordBinding<T>,
        value: Option<T>,
    ) -> Option<Result<(), WellkeepError>>
    where
        T: Serialize + DeserializeOwned + Validate + Send + Sync + 'static,
    {
        let value = value?;
        let remote = self.service.remote();
        Some(
            self.service
                .run_sync(binding.label(), async {
                    binding
                        .save(remote, account_id, &value)
                        .await
                        .map_err(WellkeepError::into_sync_error)
                })
                .await,
        )
    }

    fn legacy_todo(&self) -> Option<TodoData> {
        let raw = self.read_raw(keys::TODO_DATA)?;
        match decode::<TodoData>(&raw) {
            Ok(data) => Some(data),
            // Older installs stored a bare task array
            Err(_) => match bare_task_list(&raw) {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!(key = keys::TODO_DATA, error = %e, "skipping invalid legacy slot");
                    None
                },
            },
        }
    }

    fn legacy_sleep(&self) -> Option<SleepState> {
        if let Some(state) = self.read_legacy::<SleepState>(keys::SLEEP_STATE) {
            return Some(state);
        }

        let mode = self.read_legacy::<String>(keys::SLEEP_MODE);
        let time = self.read_legacy::<String>(keys::SLEEP_TIME);
        if mode.is_none() && time.is_none() {
            return None;
        }

        let mut state = SleepState {
            mode: mode
                .as_deref()
                .and_then(SleepMode::parse)
                .unwrap_or_default(),
            time: time.unwrap_or_default(),
            ..SleepState::default()
        };
        state.recalculate();
        state.validate().ok().map(|()| state)
    }

    fn legacy_caffeine(&self) -> Option<CaffeineSettings> {
        self.read_legacy::<CaffeineSettings>(keys::CAFFEINE_SETTINGS)
            .or_else(|| {
                let wake_time = self.read_legacy::<String>(keys::CAFFEINE_WAKE_TIME)?;
                let settings = CaffeineSettings {
                    wake_time,
                    ..CaffeineSettings::default()
                };
                settings.validate().ok().map(|()| settings)
            })
    }

    fn read_legacy<T: DeserializeOwned + Validate>(&self, key: &str) -> Option<T> {
        let raw = self.read_raw(key)?;
        decode(&raw)
            .map_err(|e| warn!(key, error = %e, "skipping invalid legacy slot"))
            .ok()
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.store.read(key) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(key, error = %e, "legacy slot unreadable");
                None
            },
        }
    }

    fn accounts(&self) -> MutexGuard<'_, HashMap<String, Phase>> {
        lock(&self.accounts)
    }
}

fn bare_task_list(raw: &str) -> Result<TodoData, ValidationError> {
    let tasks: Vec<Task> =
        serde_json::from_str(raw).map_err(|e| ValidationError::new("json", e.to_string()))?;
    let data = TodoData {
        tasks,
        ..TodoData::default()
    };
    data.validate()?;
    Ok(data)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears a `Running` entry if the migration future is dropped midway.
struct RunningGuard<'a> {
    accounts: &'a Mutex<HashMap<String, Phase>>,
    account_id: &'a str,
    finished: bool,
}

impl RunningGuard<'_> {
    fn finish(&mut self) {
        lock(self.accounts).insert(self.account_id.to_string(), Phase::Done);
        self.finished = true;
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            lock(self.accounts).remove(self.account_id);
        }
    }
}
