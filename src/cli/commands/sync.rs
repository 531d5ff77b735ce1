//! Sync command implementation.
//!
//! Handles status display, manual sync runs, and the periodic sync loop.

use std::time::Duration;

use colored::Colorize;
use tracing::info;

use crate::auth::AuthProvider;
use crate::cli::args::{OutputFormat, SyncCommands};
use crate::cli::context::AppContext;
use crate::error::WellkeepError;
use crate::output::{format_sync, SyncReport};
use crate::sync::{MigrationOutcome, SyncService, SyncStatus};

/// Execute sync subcommands.
///
/// # Errors
///
/// Returns an error if no backend is configured or no session exists (for
/// `run` and `watch`), or if output formatting fails.
pub async fn sync(
    ctx: &AppContext,
    cmd: SyncCommands,
    format: OutputFormat,
) -> Result<String, WellkeepError> {
    match cmd {
        SyncCommands::Status => format_sync(&report(ctx), format),
        SyncCommands::Run => run_sync(ctx, format).await,
        SyncCommands::Watch { interval } => watch(ctx, interval, format).await,
    }
}

fn report(ctx: &AppContext) -> SyncReport {
    let account = ctx.auth.current_account_id();
    let migrated = match (ctx.migration(), &account) {
        (Some(guard), Some(account)) => Some(guard.is_done(account)),
        _ => None,
    };

    SyncReport {
        backend: ctx.config.remote.url.clone(),
        account,
        enabled: ctx.config.sync.enabled,
        migrated,
        status: ctx.service().map_or_else(SyncStatus::default, |s| s.status()),
    }
}

fn require_sync(ctx: &AppContext) -> Result<&SyncService, WellkeepError> {
    let service = ctx
        .service()
        .ok_or_else(|| WellkeepError::Config("remote.url is not set".to_string()))?;
    if !ctx.auth.is_authenticated() {
        return Err(WellkeepError::NotAuthenticated);
    }
    if !ctx.config.sync.enabled {
        return Err(WellkeepError::Config("sync.enabled is false".to_string()));
    }
    Ok(service)
}

/// Pull every slot once, then push every slot.
async fn run_sync(ctx: &AppContext, format: OutputFormat) -> Result<String, WellkeepError> {
    require_sync(ctx)?;

    let sleep = ctx.sleep().await;
    let caffeine = ctx.caffeine().await;
    let fasting = ctx.fasting().await;
    let todo = ctx.todo().await;

    let results = [
        sleep.sync_now().await,
        caffeine.sync_now().await,
        fasting.sync_now().await,
        todo.sync_now().await,
    ];
    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(failed, "manual sync finished");

    format_sync(&report(ctx), format)
}

/// Keep every slot syncing on a timer until Ctrl-C.
async fn watch(
    ctx: &AppContext,
    interval: Option<u64>,
    format: OutputFormat,
) -> Result<String, WellkeepError> {
    let service = require_sync(ctx)?;
    let period = interval.map_or_else(|| ctx.config.sync.interval(), |s| Duration::from_secs(s.max(1)));

    let listener = service.subscribe(move |status| {
        if format == OutputFormat::Json {
            if let Ok(line) = serde_json::to_string(status) {
                println!("{line}");
            }
        } else if let Some(error) = &status.error {
            println!("{} {}", "✗".red(), error);
        } else if status.syncing {
            println!("{}", "syncing...".dimmed());
        } else {
            println!("{} synced", "✓".green());
        }
    });

    let sleep = ctx.sleep().await;
    let caffeine = ctx.caffeine().await;
    let fasting = ctx.fasting().await;
    let todo = ctx.todo().await;

    sleep.start_periodic_sync(period);
    caffeine.start_periodic_sync(period);
    fasting.start_periodic_sync(period);
    todo.start_periodic_sync(period);

    if format == OutputFormat::Pretty {
        println!(
            "Syncing every {}s. Press Ctrl-C to stop.",
            period.as_secs()
        );
    }

    let interrupted = tokio::signal::ctrl_c().await;

    sleep.shutdown();
    caffeine.shutdown();
    fasting.shutdown();
    todo.shutdown();
    service.unsubscribe(listener);

    interrupted?;
    format_sync(&report(ctx), format)
}

/// Execute `migrate`.
///
/// # Errors
///
/// Returns an error if no backend is configured or no session exists, or if
/// output formatting fails.
pub async fn migrate(ctx: &AppContext, format: OutputFormat) -> Result<String, WellkeepError> {
    require_sync(ctx)?;
    let account = ctx
        .auth
        .current_account_id()
        .ok_or(WellkeepError::NotAuthenticated)?;
    let Some(guard) = ctx.migration() else {
        return Err(WellkeepError::Config("remote.url is not set".to_string()));
    };

    let outcome = guard.migrate_if_needed(&account).await;

    match format {
        OutputFormat::Json => {
            let data = match outcome {
                MigrationOutcome::Migrated { pushed, failed } => serde_json::json!({
                    "account": account,
                    "migrated": true,
                    "pushed": pushed,
                    "failed": failed,
                }),
                MigrationOutcome::AlreadyDone | MigrationOutcome::InProgress => serde_json::json!({
                    "account": account,
                    "migrated": false,
                }),
            };
            crate::output::to_json(&data)
        },
        OutputFormat::Pretty => Ok(match outcome {
            MigrationOutcome::Migrated { pushed, failed: 0 } => {
                format!("{} Migrated {pushed} item(s) to {account}", "✓".green())
            },
            MigrationOutcome::Migrated { pushed, failed } => format!(
                "{} Migrated {pushed} item(s) to {account}, {} failed (not retried)",
                "!".yellow(),
                failed
            ),
            MigrationOutcome::AlreadyDone | MigrationOutcome::InProgress => {
                format!("Local data was already migrated to {account}")
            },
        }),
    }
}
