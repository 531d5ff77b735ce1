//! Output formatting for wellkeep.
//!
//! Every command renders either human-readable colored text or JSON.

mod json;
mod pretty;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::cli::args::OutputFormat;
use crate::error::WellkeepError;
use crate::models::{CaffeineSettings, FastingState, SleepState, TodoData};
use crate::sync::SyncStatus;

pub use json::*;
pub use pretty::*;

/// What `sync status` and `sync run` report.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// Configured backend URL.
    pub backend: Option<String>,
    /// Signed-in account.
    pub account: Option<String>,
    /// `sync.enabled`.
    pub enabled: bool,
    /// Migration flag of the signed-in account.
    pub migrated: Option<bool>,
    pub status: SyncStatus,
}

/// Format a raw slot value
///
/// # Errors
///
/// Returns `WellkeepError::Parse` if JSON serialization fails.
pub fn format_value(key: &str, value: &Value, format: OutputFormat) -> Result<String, WellkeepError> {
    match format {
        OutputFormat::Pretty => Ok(format_value_pretty(key, value)),
        OutputFormat::Json => to_json(value),
    }
}

/// Format sleep calculator state
///
/// # Errors
///
/// Returns `WellkeepError::Parse` if JSON serialization fails.
pub fn format_sleep(state: &SleepState, format: OutputFormat) -> Result<String, WellkeepError> {
    match format {
        OutputFormat::Pretty => Ok(format_sleep_pretty(state)),
        OutputFormat::Json => to_json(state),
    }
}

/// Format caffeine planner settings
///
/// # Errors
///
/// Returns `WellkeepError::Parse` if JSON serialization fails.
pub fn format_caffeine(
    settings: &CaffeineSettings,
    format: OutputFormat,
) -> Result<String, WellkeepError> {
    match format {
        OutputFormat::Pretty => Ok(format_caffeine_pretty(settings)),
        OutputFormat::Json => to_json(settings),
    }
}

/// Format a to-do list
///
/// # Errors
///
/// Returns `WellkeepError::Parse` if JSON serialization fails.
pub fn format_todos(data: &TodoData, all: bool, format: OutputFormat) -> Result<String, WellkeepError> {
    match format {
        OutputFormat::Pretty => Ok(format_todos_pretty(data, all)),
        OutputFormat::Json => format_todos_json(data, all),
    }
}

/// Format fasting state
///
/// # Errors
///
/// Returns `WellkeepError::Parse` if JSON serialization fails.
pub fn format_fasting(
    state: &FastingState,
    now: DateTime<Utc>,
    format: OutputFormat,
) -> Result<String, WellkeepError> {
    match format {
        OutputFormat::Pretty => Ok(format_fasting_pretty(state, now)),
        OutputFormat::Json => format_fasting_json(state, now),
    }
}

/// Format sync state
///
/// # Errors
///
/// Returns `WellkeepError::Parse` if JSON serialization fails.
pub fn format_sync(report: &SyncReport, format: OutputFormat) -> Result<String, WellkeepError> {
    match format {
        OutputFormat::Pretty => Ok(format_sync_pretty(report)),
        OutputFormat::Json => to_json(report),
    }
}
