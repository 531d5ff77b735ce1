//! Remote store collaborator.
//!
//! The backend is consumed as an opaque async CRUD interface per entity
//! table, keyed by account id. Table and column names are the backend's
//! contract; this crate only reads and writes rows shaped as JSON objects.

mod filter;
mod memory;
mod rest;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::WellkeepError;

pub use filter::{Condition, Filter};
pub use memory::{MemoryRemote, RemoteCall};
pub use rest::RestRemote;

/// To-do items, one row per task.
pub const TASKS: &str = "tasks";
/// Sleep calculator state, one row per account.
pub const SLEEP_PREFERENCES: &str = "sleep_preferences";
/// Caffeine planner settings, one row per account.
pub const CAFFEINE_SETTINGS: &str = "caffeine_settings";
/// Fasting tracker state, one row per account.
pub const FASTING_DATA: &str = "fasting_data";

/// Column every row carries to scope it to an account.
pub const ACCOUNT_COLUMN: &str = "user_id";

/// Conflict column used for upserts into `table`.
#[must_use]
pub fn primary_key(table: &str) -> &'static str {
    match table {
        TASKS => "id",
        _ => ACCOUNT_COLUMN,
    }
}

/// Async CRUD access to the backend.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Insert rows, replacing any with the same primary key.
    async fn upsert(&self, table: &str, records: &[Value]) -> Result<(), WellkeepError>;

    /// Fetch matching rows. `Ok(None)` when the backend has nothing for the table.
    async fn select(&self, table: &str, filter: &Filter)
        -> Result<Option<Vec<Value>>, WellkeepError>;

    /// Delete matching rows.
    async fn delete(&self, table: &str, filter: &Filter) -> Result<(), WellkeepError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_keys() {
        assert_eq!(primary_key(TASKS), "id");
        assert_eq!(primary_key(SLEEP_PREFERENCES), "user_id");
        assert_eq!(primary_key(FASTING_DATA), "user_id");
    }
}
