//! Sleep calculator command.

use crate::cli::args::{OutputFormat, SleepCommands};
use crate::cli::context::AppContext;
use crate::error::WellkeepError;
use crate::models::{SleepMode, ValidationError};
use crate::output::format_sleep;

/// Execute sleep subcommands.
///
/// # Errors
///
/// Returns an error if a mode or time is invalid or output formatting fails.
pub async fn sleep(
    ctx: &AppContext,
    cmd: Option<SleepCommands>,
    format: OutputFormat,
) -> Result<String, WellkeepError> {
    let slot = ctx.sleep().await;

    if let Some(SleepCommands::Set {
        mode,
        time,
        selected,
    }) = cmd
    {
        let mode = mode
            .map(|m| {
                SleepMode::parse(&m)
                    .ok_or_else(|| ValidationError::new("mode", format!("expected wake or bed, got {m:?}")))
            })
            .transpose()?;

        slot.modify(|current| {
            let mut next = current.clone();
            if let Some(mode) = mode {
                next.mode = mode;
            }
            if let Some(time) = time {
                next.time = time;
            }
            next.recalculate();
            if let Some(selected) = selected {
                if !next.calculated_times.contains(&selected) {
                    return Err(ValidationError::new(
                        "selected_time",
                        format!("{selected} is not one of the suggested times"),
                    ));
                }
                next.selected_time = Some(selected);
            }
            Ok(next)
        })?;
        slot.flush().await;
    }

    format_sleep(&slot.get(), format)
}
