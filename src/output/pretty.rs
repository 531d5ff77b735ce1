use chrono::{DateTime, Duration, Local, Utc};
use colored::Colorize;
use serde_json::Value;

use super::SyncReport;
use crate::models::{CaffeineSettings, FastingState, SleepMode, SleepState, TodoData};

fn hours_minutes(duration: Duration) -> String {
    let minutes = duration.num_minutes().max(0);
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Format a raw slot value
pub fn format_value_pretty(key: &str, value: &Value) -> String {
    match value {
        Value::Null => format!("{}  {}", key.bold(), "(not set)".dimmed()),
        Value::String(s) if s.is_empty() => format!("{}  {}", key.bold(), "(empty)".dimmed()),
        Value::String(s) => format!("{}  {}", key.bold(), s),
        other => format!(
            "{}\n{}",
            key.bold(),
            serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string())
        ),
    }
}

/// Format sleep calculator state
pub fn format_sleep_pretty(state: &SleepState) -> String {
    let (anchor, suggestions) = match state.mode {
        SleepMode::Wake => ("Wake up at", "Go to bed at"),
        SleepMode::Bed => ("Go to bed at", "Wake up at"),
    };

    if state.time.is_empty() {
        return format!(
            "Sleep ({})\n  {}",
            state.mode,
            "No time set. Try 'wellkeep sleep set --time 06:30'".dimmed()
        );
    }

    let mut output = format!("Sleep ({})\n", state.mode);
    output.push_str(&"─".repeat(40));
    output.push('\n');
    output.push_str(&format!("  {}: {}\n", anchor.dimmed(), state.time.bold()));
    output.push_str(&format!("  {}:\n", suggestions.dimmed()));

    for time in &state.calculated_times {
        let selected = state.selected_time.as_deref() == Some(time.as_str());
        let marker = if selected { "*".green() } else { " ".normal() };
        output.push_str(&format!("   {} {}\n", marker, time));
    }

    output
}

/// Format caffeine planner settings
pub fn format_caffeine_pretty(settings: &CaffeineSettings) -> String {
    let mut output = "Caffeine\n".to_string();
    output.push_str(&"─".repeat(40));
    output.push('\n');

    let wake = if settings.wake_time.is_empty() {
        "not set".dimmed().to_string()
    } else {
        settings.wake_time.clone()
    };
    output.push_str(&format!("  {}: {}\n", "Wake".dimmed(), wake));

    if settings.schedule.is_empty() {
        output.push_str(&format!("  {}\n", "No doses planned".dimmed()));
    }
    for dose in settings.sorted_schedule() {
        output.push_str(&format!("  {} {}\n", dose.time.yellow(), dose.label));
    }

    output
}

/// Format a to-do list
pub fn format_todos_pretty(data: &TodoData, all: bool) -> String {
    let tasks: Vec<_> = if all {
        data.tasks.iter().collect()
    } else {
        data.open_by_priority()
    };

    let title = format!("To-do ({}, {} items)", data.method, tasks.len());
    if tasks.is_empty() {
        return format!("{title}\n  No items");
    }

    let mut output = format!("{title}\n");
    output.push_str(&"─".repeat(60));
    output.push('\n');

    for task in tasks {
        let status_icon = if task.completed {
            "[x]".green()
        } else {
            "[ ]".white()
        };
        let mut line = format!("{} {}", status_icon, task.text.bold());

        if let Some(priority) = &task.priority {
            line.push_str(&format!("  {}", priority.cyan()));
        }
        line.push_str(&format!("  {}", task.id.chars().take(8).collect::<String>().dimmed()));

        output.push_str(&line);
        output.push('\n');
    }

    output
}

/// Format fasting state with progress at `now`
pub fn format_fasting_pretty(state: &FastingState, now: DateTime<Utc>) -> String {
    let mut output = format!("Fasting ({})\n", state.protocol);
    output.push_str(&"─".repeat(40));
    output.push('\n');

    match (state.elapsed(now), state.goal_at()) {
        (Some(elapsed), Some(goal_at)) => {
            let goal = Duration::hours(i64::from(state.goal_hours));
            let reached = elapsed >= goal;
            output.push_str(&format!("  {}: {}\n", "Elapsed".dimmed(), hours_minutes(elapsed).bold()));
            output.push_str(&format!("  {}: {}h\n", "Goal".dimmed(), state.goal_hours));
            if reached {
                output.push_str(&format!("  {}\n", "Goal reached".green()));
            } else {
                output.push_str(&format!(
                    "  {}: {} ({} left)\n",
                    "Ends".dimmed(),
                    local_time(goal_at),
                    hours_minutes(goal - elapsed)
                ));
            }
        },
        _ => {
            output.push_str(&format!("  {}\n", "Not fasting".dimmed()));
            output.push_str(&format!("  {}: {}h\n", "Goal".dimmed(), state.goal_hours));
        },
    }

    output
}

/// Format sync state
pub fn format_sync_pretty(report: &SyncReport) -> String {
    let mut lines = Vec::new();

    lines.push("Sync Status".bold().to_string());
    lines.push("─".repeat(40));

    let backend = report
        .backend
        .as_deref()
        .map_or_else(|| "local only".dimmed().to_string(), str::to_string);
    lines.push(format!("  Backend:    {backend}"));

    let account = report
        .account
        .as_deref()
        .map_or_else(|| "signed out".dimmed().to_string(), str::to_string);
    lines.push(format!("  Account:    {account}"));

    lines.push(format!(
        "  Enabled:    {}",
        if report.enabled { "yes".green() } else { "no".yellow() }
    ));

    if let Some(migrated) = report.migrated {
        lines.push(format!(
            "  Migrated:   {}",
            if migrated { "yes" } else { "pending" }
        ));
    }

    if report.status.syncing {
        lines.push(format!("  State:      {}", "syncing".cyan()));
    }
    if let Some(last) = report.status.last_sync {
        lines.push(format!("  Last sync:  {}", local_time(last)));
    }
    if let Some(error) = &report.status.error {
        lines.push(format!("  Error:      {}", error.red()));
    }

    lines.join("\n")
}
