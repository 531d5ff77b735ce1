//! Everything a command needs: paths, config, stores, session, sync.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::auth::{AuthProvider, SessionFile, StaticAuth};
use crate::config::{Config, Paths};
use crate::error::WellkeepError;
use crate::models::{keys, CaffeineSettings, FastingState, SleepState, TodoData};
use crate::persistence::{PersistedSlot, SlotValue};
use crate::remote::RestRemote;
use crate::storage::{Database, LocalStore, SqliteStore};
use crate::sync::{
    CaffeineBinding, FastingBinding, MigrationGuard, SleepBinding, SlotBinding, SyncService,
    TasksBinding,
};

/// Shared state for one CLI invocation.
pub struct AppContext {
    pub paths: Paths,
    pub config: Config,
    pub store: Arc<dyn LocalStore>,
    pub auth: Arc<StaticAuth>,
    pub session_file: SessionFile,
    service: Option<Arc<SyncService>>,
    migration: Option<MigrationGuard>,
    migration_checked: AtomicBool,
}

impl AppContext {
    /// Open the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config or session file is unreadable, the
    /// database cannot be opened, or the backend settings are incomplete.
    pub fn open(home: Option<PathBuf>) -> Result<Self, WellkeepError> {
        let paths = Paths::resolve(home)?;
        let config = Config::load_from_path(&paths.config_file)?;
        let store: Arc<dyn LocalStore> = Arc::new(SqliteStore::new(Database::open(&paths)?));

        let session_file = SessionFile::new(paths.session_file.clone());
        let auth = Arc::new(StaticAuth::from(session_file.load()?));

        let service = if config.remote.url.is_some() {
            let remote = RestRemote::new(&config.remote, auth.clone())?;
            let service = SyncService::new(auth.clone(), Arc::new(remote))
                .with_enabled(config.sync.enabled);
            Some(Arc::new(service))
        } else {
            debug!("no remote.url configured, running local-only");
            None
        };

        Ok(Self::assemble(paths, config, store, auth, session_file, service))
    }

    /// Build a context from parts.
    #[must_use]
    pub fn assemble(
        paths: Paths,
        config: Config,
        store: Arc<dyn LocalStore>,
        auth: Arc<StaticAuth>,
        session_file: SessionFile,
        service: Option<Arc<SyncService>>,
    ) -> Self {
        let migration = service
            .as_ref()
            .map(|service| MigrationGuard::new(Arc::clone(&store), Arc::clone(service)));
        Self {
            paths,
            config,
            store,
            auth,
            session_file,
            service,
            migration,
            migration_checked: AtomicBool::new(false),
        }
    }

    /// The sync service, when a backend is configured.
    #[must_use]
    pub fn service(&self) -> Option<&Arc<SyncService>> {
        self.service.as_ref()
    }

    /// The migration guard, when a backend is configured.
    #[must_use]
    pub const fn migration(&self) -> Option<&MigrationGuard> {
        self.migration.as_ref()
    }

    /// Whether edits will be pushed.
    #[must_use]
    pub fn can_sync(&self) -> bool {
        self.service.as_ref().is_some_and(|s| s.can_sync())
    }

    /// Run the one-time legacy push for the signed-in account, once per run.
    pub async fn migrate_once(&self) {
        if self.migration_checked.swap(true, Ordering::SeqCst) || !self.can_sync() {
            return;
        }
        let (Some(guard), Some(account)) = (&self.migration, self.auth.current_account_id()) else {
            return;
        };
        let outcome = guard.migrate_if_needed(&account).await;
        info!(?outcome, "migration check");
    }

    /// A local-only slot holding raw JSON.
    #[must_use]
    pub fn raw_slot(&self, key: &str) -> PersistedSlot<Value> {
        PersistedSlot::initialize(key, Value::Null, Arc::clone(&self.store))
    }

    /// A local-only plain string slot (`sleep-time`, `sleep-mode`,
    /// `caffeine-wake-time`), or `None` for other keys.
    #[must_use]
    pub fn text_slot(&self, key: &str) -> Option<PersistedSlot<String>> {
        let default = keys::text_default(key)?;
        Some(PersistedSlot::initialize(
            key,
            default.to_string(),
            Arc::clone(&self.store),
        ))
    }

    /// Open a slot and pull the account's value once.
    pub async fn synced_slot<T: SlotValue>(
        &self,
        key: &str,
        default: T,
        binding: Arc<dyn SlotBinding<T>>,
    ) -> PersistedSlot<T> {
        let Some(service) = &self.service else {
            return PersistedSlot::initialize(key, default, Arc::clone(&self.store));
        };

        self.migrate_once().await;
        let slot = PersistedSlot::initialize_with_remote(
            key,
            default,
            Arc::clone(&self.store),
            Arc::clone(service),
            binding,
        );
        let outcome = slot.bootstrap_from_remote().await;
        debug!(key, ?outcome, "bootstrap");
        slot
    }

    pub async fn sleep(&self) -> PersistedSlot<SleepState> {
        self.synced_slot(keys::SLEEP_STATE, SleepState::default(), Arc::new(SleepBinding::sleep()))
            .await
    }

    pub async fn caffeine(&self) -> PersistedSlot<CaffeineSettings> {
        self.synced_slot(
            keys::CAFFEINE_SETTINGS,
            CaffeineSettings::default(),
            Arc::new(CaffeineBinding::caffeine()),
        )
        .await
    }

    pub async fn fasting(&self) -> PersistedSlot<FastingState> {
        self.synced_slot(
            keys::FASTING_STATE,
            FastingState::default(),
            Arc::new(FastingBinding::fasting()),
        )
        .await
    }

    pub async fn todo(&self) -> PersistedSlot<TodoData> {
        self.synced_slot(keys::TODO_DATA, TodoData::default(), Arc::new(TasksBinding::new()))
            .await
    }

    /// Last sync error of this run, if any.
    #[must_use]
    pub fn sync_error(&self) -> Option<String> {
        self.service.as_ref().and_then(|s| s.status().error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Session;
    use crate::remote::{MemoryRemote, SLEEP_PREFERENCES, TASKS};
    use crate::storage::MemoryStore;
    use serde_json::json;
    use tempfile::TempDir;

    fn context(remote: Option<Arc<MemoryRemote>>, signed_in: bool) -> (TempDir, AppContext) {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::with_root(temp_dir.path().to_path_buf());
        let auth = Arc::new(if signed_in {
            StaticAuth::signed_in(Session::new("u1", "token"))
        } else {
            StaticAuth::anonymous()
        });
        let service = remote.map(|r| Arc::new(SyncService::new(auth.clone(), r)));
        let ctx = AppContext::assemble(
            paths.clone(),
            Config::default(),
            Arc::new(MemoryStore::new()),
            auth,
            SessionFile::new(paths.session_file),
            service,
        );
        (temp_dir, ctx)
    }

    #[test]
    fn test_open_without_backend_is_local_only() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = AppContext::open(Some(temp_dir.path().to_path_buf())).unwrap();

        assert!(ctx.service().is_none());
        assert!(!ctx.can_sync());
        assert!(ctx.paths.database.exists());
    }

    #[test]
    fn test_open_with_incomplete_backend_fails() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("config.yaml"),
            "remote:\n  url: https://backend.test\n",
        )
        .unwrap();

        let err = AppContext::open(Some(temp_dir.path().to_path_buf())).err().unwrap();
        assert!(matches!(err, WellkeepError::Config(_)));
    }

    #[test]
    fn test_text_slots_default_to_strings() {
        let (_dir, ctx) = context(None, false);

        assert_eq!(ctx.text_slot(keys::SLEEP_TIME).unwrap().get(), "");
        assert_eq!(ctx.text_slot(keys::SLEEP_MODE).unwrap().get(), "wake");
        assert!(ctx.text_slot(keys::TODO_DATA).is_none());
        assert_eq!(ctx.raw_slot(keys::NOTIFICATION_SCHEDULE).get(), Value::Null);
    }

    #[tokio::test]
    async fn test_synced_slot_migrates_then_bootstraps() {
        let remote = Arc::new(MemoryRemote::new());
        remote.seed(
            SLEEP_PREFERENCES,
            vec![json!({"user_id": "u1", "mode": "bed", "time": "23:00"})],
        );
        let (_dir, ctx) = context(Some(remote.clone()), true);
        let legacy = json!([{"id": "a", "text": "legacy"}]);
        ctx.store.write(keys::TODO_DATA, &legacy.to_string()).unwrap();

        let sleep = ctx.sleep().await;
        let _todo = ctx.todo().await;

        assert_eq!(sleep.get().time, "23:00");
        assert_eq!(remote.rows(TASKS).len(), 1);
        assert!(ctx.migration().unwrap().is_done("u1"));
    }

    #[tokio::test]
    async fn test_anonymous_context_never_calls_remote() {
        let remote = Arc::new(MemoryRemote::new());
        let (_dir, ctx) = context(Some(remote.clone()), false);

        let todo = ctx.todo().await;
        todo.on_change(TodoData::default());
        todo.flush().await;

        assert!(remote.calls().is_empty());
    }
}
