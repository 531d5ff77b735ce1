//! Caffeine planner command.

use crate::cli::args::{CaffeineCommands, OutputFormat};
use crate::cli::context::AppContext;
use crate::error::WellkeepError;
use crate::models::Dose;
use crate::output::format_caffeine;

/// Execute caffeine subcommands.
///
/// # Errors
///
/// Returns an error if a time is invalid or output formatting fails.
pub async fn caffeine(
    ctx: &AppContext,
    cmd: Option<CaffeineCommands>,
    format: OutputFormat,
) -> Result<String, WellkeepError> {
    let slot = ctx.caffeine().await;

    match cmd.unwrap_or(CaffeineCommands::Show) {
        CaffeineCommands::Show => {},
        CaffeineCommands::Wake { time } => slot.update_field("wake_time", time)?,
        CaffeineCommands::Dose { time, label } => slot.modify(|current| {
            let mut next = current.clone();
            next.schedule.push(Dose { time, label });
            Ok(next)
        })?,
        CaffeineCommands::Clear => slot.update_field("schedule", Vec::<Dose>::new())?,
    }
    slot.flush().await;

    format_caffeine(&slot.get(), format)
}
