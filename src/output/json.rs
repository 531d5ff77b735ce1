//! JSON output formatting for wellkeep.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::error::WellkeepError;
use crate::models::{FastingState, TodoData};

/// Format a to-do list as JSON
///
/// # Errors
///
/// Returns `WellkeepError::Parse` if JSON serialization fails.
pub fn format_todos_json(data: &TodoData, all: bool) -> Result<String, WellkeepError> {
    let items: Vec<_> = if all {
        data.tasks.iter().collect()
    } else {
        data.open_by_priority()
    };
    let output = json!({
        "method": data.method,
        "count": items.len(),
        "items": items
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format fasting state as JSON, with progress derived at `now`
///
/// # Errors
///
/// Returns `WellkeepError::Parse` if JSON serialization fails.
pub fn format_fasting_json(state: &FastingState, now: DateTime<Utc>) -> Result<String, WellkeepError> {
    let output = json!({
        "protocol": state.protocol,
        "goal_hours": state.goal_hours,
        "active": state.is_active(),
        "started_at": state.started_at,
        "goal_at": state.goal_at(),
        "elapsed_minutes": state.elapsed(now).map(|d| d.num_minutes()),
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Generic JSON formatter for any serializable type
///
/// # Errors
///
/// Returns `WellkeepError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, WellkeepError> {
    Ok(serde_json::to_string_pretty(value)?)
}
