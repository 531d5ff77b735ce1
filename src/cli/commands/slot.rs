//! Raw slot access: `get`, `set`, `field`.

use colored::Colorize;
use serde_json::Value;

use crate::cli::args::OutputFormat;
use crate::cli::context::AppContext;
use crate::error::WellkeepError;
use crate::models::{
    decode_value, keys, CaffeineSettings, FastingState, SleepState, TodoData, ValidationError,
};
use crate::output::{format_value, to_json};
use crate::persistence::PersistedSlot;

/// A slot of any of the known value types.
enum AnySlot {
    Sleep(PersistedSlot<SleepState>),
    Caffeine(PersistedSlot<CaffeineSettings>),
    Fasting(PersistedSlot<FastingState>),
    Todo(PersistedSlot<TodoData>),
    Text(PersistedSlot<String>),
    Raw(PersistedSlot<Value>),
}

macro_rules! each_slot {
    ($slot:expr, $s:ident => $body:expr) => {
        match $slot {
            AnySlot::Sleep($s) => $body,
            AnySlot::Caffeine($s) => $body,
            AnySlot::Fasting($s) => $body,
            AnySlot::Todo($s) => $body,
            AnySlot::Text($s) => $body,
            AnySlot::Raw($s) => $body,
        }
    };
}

impl AnySlot {
    async fn open(ctx: &AppContext, key: &str) -> Result<Self, WellkeepError> {
        if !keys::is_known(key) {
            return Err(WellkeepError::NotFound(format!(
                "slot {key:?} (known: {})",
                keys::ALL.join(", ")
            )));
        }

        Ok(match key {
            keys::SLEEP_STATE => Self::Sleep(ctx.sleep().await),
            keys::CAFFEINE_SETTINGS => Self::Caffeine(ctx.caffeine().await),
            keys::FASTING_STATE => Self::Fasting(ctx.fasting().await),
            keys::TODO_DATA => Self::Todo(ctx.todo().await),
            _ => ctx
                .text_slot(key)
                .map_or_else(|| Self::Raw(ctx.raw_slot(key)), Self::Text),
        })
    }

    fn value(&self) -> Result<Value, WellkeepError> {
        each_slot!(self, s => Ok(serde_json::to_value(s.get())?))
    }

    fn set(&self, value: Value) -> Result<(), ValidationError> {
        each_slot!(self, s => s.set(decode_value(value)?))
    }

    fn update_field(&self, field: &str, value: Value) -> Result<(), ValidationError> {
        each_slot!(self, s => s.update_field(field, value))
    }

    async fn flush(&self) {
        each_slot!(self, s => s.flush().await);
    }
}

/// Parse a command-line value: JSON if it parses, otherwise a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn saved(key: &str, value: &Value, format: OutputFormat) -> Result<String, WellkeepError> {
    match format {
        OutputFormat::Json => to_json(value),
        OutputFormat::Pretty => Ok(format!("{} Saved {}", "✓".green(), key.bold())),
    }
}

/// Execute `get`
///
/// # Errors
///
/// Returns an error for an unknown key or if output formatting fails.
pub async fn get(ctx: &AppContext, key: &str, format: OutputFormat) -> Result<String, WellkeepError> {
    let slot = AnySlot::open(ctx, key).await?;
    format_value(key, &slot.value()?, format)
}

/// Execute `set`
///
/// # Errors
///
/// Returns an error for an unknown key or a value that fails validation.
pub async fn set(
    ctx: &AppContext,
    key: &str,
    raw: &str,
    format: OutputFormat,
) -> Result<String, WellkeepError> {
    let slot = AnySlot::open(ctx, key).await?;
    slot.set(parse_value(raw))?;
    slot.flush().await;
    saved(key, &slot.value()?, format)
}

/// Execute `field`
///
/// # Errors
///
/// Returns an error for an unknown key or field, or an invalid value.
pub async fn field(
    ctx: &AppContext,
    key: &str,
    field: &str,
    raw: &str,
    format: OutputFormat,
) -> Result<String, WellkeepError> {
    let slot = AnySlot::open(ctx, key).await?;
    slot.update_field(field, parse_value(raw))?;
    slot.flush().await;
    saved(key, &slot.value()?, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("07:30"), Value::String("07:30".to_string()));
        assert_eq!(parse_value("\"07:30\""), Value::String("07:30".to_string()));
        assert_eq!(parse_value("18"), Value::from(18));
        assert_eq!(parse_value("{\"mode\":\"bed\"}")["mode"], "bed");
    }
}
