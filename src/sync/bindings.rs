//! Mapping between local slot values and remote rows.

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::WellkeepError;
use crate::models::{
    decode_value, CaffeineSettings, FastingState, PriorityMethod, SleepState, Task, TodoData,
    Validate, ValidationError,
};
use crate::remote::{
    Filter, RemoteStore, ACCOUNT_COLUMN, CAFFEINE_SETTINGS, FASTING_DATA, SLEEP_PREFERENCES, TASKS,
};

/// How one slot's value is loaded from and saved to the remote store.
#[async_trait]
pub trait SlotBinding<T>: Send + Sync {
    /// Short name used in sync status messages and logs.
    fn label(&self) -> &'static str;

    /// Fetch the account's value. `Ok(None)` when the remote has nothing.
    async fn load(&self, remote: &dyn RemoteStore, account: &str)
        -> Result<Option<T>, WellkeepError>;

    /// Push the value for the account.
    async fn save(
        &self,
        remote: &dyn RemoteStore,
        account: &str,
        value: &T,
    ) -> Result<(), WellkeepError>;

    /// A value loaded by [`load`](Self::load) replaced the local one.
    fn applied(&self, _account: &str, _value: &T) {}
}

/// To-do list stored one row per task.
///
/// Remote rows are only deleted for tasks this binding knows were synced
/// (applied from the remote or pushed by it) and have since been removed
/// locally. Tasks it has never seen are left alone.
#[derive(Debug, Default)]
pub struct TasksBinding {
    synced: Mutex<HashMap<String, HashSet<String>>>,
}

impl TasksBinding {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record_synced(&self, account: &str, data: &TodoData) {
        let ids = data.tasks.iter().map(|t| t.id.clone()).collect();
        self.synced
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(account.to_string(), ids);
    }

    /// Ids synced earlier that `data` no longer holds.
    fn removed_ids(&self, account: &str, data: &TodoData) -> Vec<String> {
        let synced = self.synced.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(known) = synced.get(account) else {
            return Vec::new();
        };
        let mut removed: Vec<String> = known
            .iter()
            .filter(|id| !data.tasks.iter().any(|t| &t.id == *id))
            .cloned()
            .collect();
        removed.sort_unstable();
        removed
    }

    /// Remote rows for a to-do list.
    #[must_use]
    pub fn rows(account: &str, data: &TodoData) -> Vec<Value> {
        data.tasks
            .iter()
            .map(|task| {
                json!({
                    "id": task.id,
                    ACCOUNT_COLUMN: account,
                    "text": task.text,
                    "completed": task.completed,
                    "priority": task.priority,
                    "method": data.method,
                    "created_at": task.created_at,
                })
            })
            .collect()
    }

    fn from_rows(rows: Vec<Value>) -> Result<TodoData, ValidationError> {
        let method = rows
            .first()
            .and_then(|row| row.get("method"))
            .and_then(Value::as_str)
            .and_then(PriorityMethod::parse)
            .unwrap_or_default();

        let mut tasks = rows
            .into_iter()
            .map(|row| {
                serde_json::from_value::<Task>(row)
                    .map_err(|e| ValidationError::new("tasks", e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        tasks.sort_by_key(|task| task.created_at);

        let data = TodoData { method, tasks };
        data.validate()?;
        Ok(data)
    }
}

#[async_trait]
impl SlotBinding<TodoData> for TasksBinding {
    fn label(&self) -> &'static str {
        TASKS
    }

    async fn load(
        &self,
        remote: &dyn RemoteStore,
        account: &str,
    ) -> Result<Option<TodoData>, WellkeepError> {
        let rows = remote
            .select(TASKS, &Filter::eq(ACCOUNT_COLUMN, account))
            .await?
            .unwrap_or_default();

        // No rows means a fresh account, not an empty list to apply
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self::from_rows(rows)?))
    }

    async fn save(
        &self,
        remote: &dyn RemoteStore,
        account: &str,
        value: &TodoData,
    ) -> Result<(), WellkeepError> {
        let rows = Self::rows(account, value);
        if !rows.is_empty() {
            remote.upsert(TASKS, &rows).await?;
        }

        let removed = self.removed_ids(account, value);
        if !removed.is_empty() {
            let stale = Filter::eq(ACCOUNT_COLUMN, account).and_in("id", removed);
            remote.delete(TASKS, &stale).await?;
        }

        self.record_synced(account, value);
        Ok(())
    }

    fn applied(&self, account: &str, value: &TodoData) {
        self.record_synced(account, value);
    }
}

/// A value stored as a single row per account.
pub struct RecordBinding<T> {
    table: &'static str,
    _value: PhantomData<fn() -> T>,
}

impl<T> RecordBinding<T> {
    /// Binding for `table`, keyed by account.
    #[must_use]
    pub const fn new(table: &'static str) -> Self {
        Self {
            table,
            _value: PhantomData,
        }
    }

    /// The remote table.
    #[must_use]
    pub const fn table(&self) -> &'static str {
        self.table
    }
}

impl<T: Serialize> RecordBinding<T> {
    /// The remote row for a value.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the value does not serialize to an object.
    pub fn row(&self, account: &str, value: &T) -> Result<Value, ValidationError> {
        match serde_json::to_value(value) {
            Ok(Value::Object(mut row)) => {
                row.insert(ACCOUNT_COLUMN.to_string(), json!(account));
                row.insert("updated_at".to_string(), json!(Utc::now()));
                Ok(Value::Object(row))
            },
            Ok(_) => Err(ValidationError::new(self.table, "expected an object")),
            Err(e) => Err(ValidationError::new(self.table, e.to_string())),
        }
    }
}

impl RecordBinding<SleepState> {
    /// Sleep calculator preferences.
    #[must_use]
    pub const fn sleep() -> Self {
        Self::new(SLEEP_PREFERENCES)
    }
}

impl RecordBinding<CaffeineSettings> {
    /// Caffeine planner settings.
    #[must_use]
    pub const fn caffeine() -> Self {
        Self::new(CAFFEINE_SETTINGS)
    }
}

impl RecordBinding<FastingState> {
    /// Fasting tracker state.
    #[must_use]
    pub const fn fasting() -> Self {
        Self::new(FASTING_DATA)
    }
}

/// Sleep preferences binding.
pub type SleepBinding = RecordBinding<SleepState>;
/// Caffeine settings binding.
pub type CaffeineBinding = RecordBinding<CaffeineSettings>;
/// Fasting data binding.
pub type FastingBinding = RecordBinding<FastingState>;

#[async_trait]
impl<T> SlotBinding<T> for RecordBinding<T>
where
    T: Serialize + DeserializeOwned + Validate + Send + Sync + 'static,
{
    fn label(&self) -> &'static str {
        self.table
    }

    async fn load(&self, remote: &dyn RemoteStore, account: &str) -> Result<Option<T>, WellkeepError> {
        let row = remote
            .select(self.table, &Filter::eq(ACCOUNT_COLUMN, account))
            .await?
            .and_then(|rows| rows.into_iter().next());

        match row {
            Some(row) => Ok(Some(decode_value(row)?)),
            None => Ok(None),
        }
    }

    async fn save(
        &self,
        remote: &dyn RemoteStore,
        account: &str,
        value: &T,
    ) -> Result<(), WellkeepError> {
        let row = self.row(account, value)?;
        remote.upsert(self.table, &[row]).await
    }
}
