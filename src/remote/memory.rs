//! In-process remote store.
//!
//! Behaves like the backend closely enough for tests and offline
//! development: per-table primary keys, merge-on-upsert, filtered reads.
//! Every call is logged, failures can be switched on, and an artificial
//! latency makes races observable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{primary_key, Filter, RemoteStore};
use crate::error::WellkeepError;

/// One logged call against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    /// `upsert` with the number of records sent
    Upsert { table: String, records: usize },
    /// `select`
    Select { table: String },
    /// `delete`
    Delete { table: String },
}

/// In-process implementation of [`RemoteStore`].
#[derive(Default)]
pub struct MemoryRemote {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    calls: Mutex<Vec<RemoteCall>>,
    failing: AtomicBool,
    latency: Mutex<Option<Duration>>,
}

impl MemoryRemote {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every subsequent call.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *lock(&self.latency) = latency;
    }

    /// Calls made so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        lock(&self.calls).clone()
    }

    /// Number of `upsert` calls made so far.
    #[must_use]
    pub fn upsert_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| matches!(c, RemoteCall::Upsert { .. }))
            .count()
    }

    /// Number of `select` calls made so far.
    #[must_use]
    pub fn select_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| matches!(c, RemoteCall::Select { .. }))
            .count()
    }

    /// Snapshot of a table's rows.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Value> {
        lock(&self.tables).get(table).cloned().unwrap_or_default()
    }

    /// Seed rows directly, bypassing the call log.
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        lock(&self.tables)
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    async fn enter(&self, call: RemoteCall) -> Result<(), WellkeepError> {
        lock(&self.calls).push(call);

        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(WellkeepError::Remote(
                "backend unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn merge(target: &mut Value, incoming: &Value) {
    match (target.as_object_mut(), incoming.as_object()) {
        (Some(existing), Some(update)) => {
            for (column, value) in update {
                existing.insert(column.clone(), value.clone());
            }
        },
        _ => *target = incoming.clone(),
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn upsert(&self, table: &str, records: &[Value]) -> Result<(), WellkeepError> {
        self.enter(RemoteCall::Upsert {
            table: table.to_string(),
            records: records.len(),
        })
        .await?;

        let key = primary_key(table);
        let mut tables = lock(&self.tables);
        let rows = tables.entry(table.to_string()).or_default();

        for record in records {
            let Some(id) = record.get(key).filter(|v| !v.is_null()) else {
                return Err(WellkeepError::Remote(format!(
                    "{table}: record is missing {key}"
                )));
            };
            match rows.iter_mut().find(|row| row.get(key) == Some(id)) {
                Some(existing) => merge(existing, record),
                None => rows.push(record.clone()),
            }
        }
        Ok(())
    }

    async fn select(
        &self,
        table: &str,
        filter: &Filter,
    ) -> Result<Option<Vec<Value>>, WellkeepError> {
        self.enter(RemoteCall::Select {
            table: table.to_string(),
        })
        .await?;

        Ok(lock(&self.tables).get(table).map(|rows| {
            rows.iter()
                .filter(|row| filter.matches(row))
                .cloned()
                .collect()
        }))
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<(), WellkeepError> {
        self.enter(RemoteCall::Delete {
            table: table.to_string(),
        })
        .await?;

        if let Some(rows) = lock(&self.tables).get_mut(table) {
            rows.retain(|row| !filter.matches(row));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{SLEEP_PREFERENCES, TASKS};
    use serde_json::json;

    #[tokio::test]
    async fn test_upsert_merges_by_primary_key() {
        let remote = MemoryRemote::new();

        remote
            .upsert(SLEEP_PREFERENCES, &[json!({"user_id": "u1", "mode": "wake", "time": "06:00"})])
            .await
            .unwrap();
        remote
            .upsert(SLEEP_PREFERENCES, &[json!({"user_id": "u1", "time": "06:30"})])
            .await
            .unwrap();

        let rows = remote.rows(SLEEP_PREFERENCES);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["mode"], "wake");
        assert_eq!(rows[0]["time"], "06:30");
    }

    #[tokio::test]
    async fn test_upsert_requires_primary_key() {
        let remote = MemoryRemote::new();
        let err = remote
            .upsert(TASKS, &[json!({"user_id": "u1", "text": "no id"})])
            .await
            .unwrap_err();
        assert!(err.is_remote());
    }

    #[tokio::test]
    async fn test_select_missing_table_is_none() {
        let remote = MemoryRemote::new();
        let rows = remote.select(TASKS, &Filter::eq("user_id", "u1")).await.unwrap();
        assert!(rows.is_none());
        assert_eq!(remote.select_count(), 1);
    }

    #[tokio::test]
    async fn test_select_and_delete_filtered() {
        let remote = MemoryRemote::new();
        remote.seed(
            TASKS,
            vec![
                json!({"id": "a", "user_id": "u1"}),
                json!({"id": "b", "user_id": "u1"}),
                json!({"id": "c", "user_id": "u2"}),
            ],
        );

        let filter = Filter::eq("user_id", "u1").and_not_in("id", vec!["a".to_string()]);
        remote.delete(TASKS, &filter).await.unwrap();

        let mine = remote
            .select(TASKS, &Filter::eq("user_id", "u1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0]["id"], "a");
        assert_eq!(remote.rows(TASKS).len(), 2);
    }

    #[tokio::test]
    async fn test_failing_calls_are_still_logged() {
        let remote = MemoryRemote::new();
        remote.set_failing(true);

        assert!(remote.upsert(TASKS, &[]).await.is_err());
        assert_eq!(
            remote.calls(),
            vec![RemoteCall::Upsert {
                table: TASKS.to_string(),
                records: 0
            }]
        );
    }
}
