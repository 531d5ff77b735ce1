//! Fasting tracker command.

use chrono::Utc;

use crate::cli::args::{FastingCommands, OutputFormat};
use crate::cli::context::AppContext;
use crate::error::WellkeepError;
use crate::output::format_fasting;

/// Execute fasting subcommands.
///
/// # Errors
///
/// Returns an error for a malformed protocol or if output formatting fails.
pub async fn fasting(
    ctx: &AppContext,
    cmd: Option<FastingCommands>,
    format: OutputFormat,
) -> Result<String, WellkeepError> {
    let slot = ctx.fasting().await;
    let now = Utc::now();

    match cmd.unwrap_or(FastingCommands::Show) {
        FastingCommands::Show => {},
        FastingCommands::Start { protocol } => slot.modify(|current| {
            let mut next = current.clone();
            if let Some(protocol) = protocol {
                next.set_protocol(&protocol)?;
            }
            next.start(now);
            Ok(next)
        })?,
        FastingCommands::Stop => {
            if !slot.with_value(|state| state.is_active()) {
                return Err(WellkeepError::NotFound("running fast".to_string()));
            }
            slot.modify(|current| {
                let mut next = current.clone();
                next.stop(now);
                Ok(next)
            })?;
        },
    }
    slot.flush().await;

    format_fasting(&slot.get(), now, format)
}
