//! `login` and `logout`.

use colored::Colorize;
use serde_json::json;

use crate::auth::Session;
use crate::cli::args::OutputFormat;
use crate::cli::context::AppContext;
use crate::error::WellkeepError;
use crate::output::to_json;
use crate::sync::MigrationOutcome;

/// Execute `login`: store the session, then migrate local data once.
///
/// # Errors
///
/// Returns an error if the session file cannot be written or output
/// formatting fails.
pub async fn login(
    ctx: &AppContext,
    account: &str,
    token: &str,
    format: OutputFormat,
) -> Result<String, WellkeepError> {
    if account.trim().is_empty() {
        return Err(WellkeepError::Config("account must not be empty".to_string()));
    }

    let session = Session::new(account, token);
    ctx.paths.ensure_dirs()?;
    ctx.session_file.save(&session)?;
    ctx.auth.sign_in(session);

    let outcome = match ctx.migration() {
        Some(guard) if ctx.can_sync() => Some(guard.migrate_if_needed(account).await),
        _ => None,
    };

    match format {
        OutputFormat::Json => to_json(&json!({
            "account": account,
            "migrated": matches!(outcome, Some(MigrationOutcome::Migrated { .. })),
        })),
        OutputFormat::Pretty => {
            let mut lines = vec![format!("{} Signed in as {}", "✓".green(), account.bold())];
            match outcome {
                Some(MigrationOutcome::Migrated { pushed, failed }) => lines.push(format!(
                    "  Migrated {pushed} item(s){}",
                    if failed > 0 {
                        format!(", {failed} failed (not retried)")
                    } else {
                        String::new()
                    }
                )),
                Some(_) => {},
                None => lines.push(
                    "  Sync is not configured; data stays local"
                        .dimmed()
                        .to_string(),
                ),
            }
            Ok(lines.join("\n"))
        },
    }
}

/// Execute `logout`.
///
/// Local data and migration flags are kept.
///
/// # Errors
///
/// Returns an error if the session file cannot be removed.
pub fn logout(ctx: &AppContext, format: OutputFormat) -> Result<String, WellkeepError> {
    let removed = ctx.session_file.clear()?;
    ctx.auth.sign_out();

    match format {
        OutputFormat::Json => to_json(&json!({ "signed_out": removed })),
        OutputFormat::Pretty if removed => Ok(format!("{} Signed out", "✓".green())),
        OutputFormat::Pretty => Ok("Not signed in".dimmed().to_string()),
    }
}
