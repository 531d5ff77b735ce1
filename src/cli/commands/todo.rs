//! To-do list command.

use crate::cli::args::{OutputFormat, TodoCommands};
use crate::cli::context::AppContext;
use crate::error::WellkeepError;
use crate::models::{PriorityMethod, Task, TodoData, ValidationError};
use crate::output::format_todos;

/// Execute todo subcommands.
///
/// # Errors
///
/// Returns an error for an unknown task id or method, an invalid priority,
/// or if output formatting fails.
pub async fn todo(
    ctx: &AppContext,
    cmd: Option<TodoCommands>,
    format: OutputFormat,
) -> Result<String, WellkeepError> {
    let slot = ctx.todo().await;
    let mut show_all = false;

    match cmd.unwrap_or(TodoCommands::List { all: false }) {
        TodoCommands::List { all } => show_all = all,
        TodoCommands::Add { text, priority } => slot.modify(|current| {
            let mut next = current.clone();
            next.add(Task::new(text, priority))?;
            Ok(next)
        })?,
        TodoCommands::Done { id } => {
            let full_id = slot.with_value(|data| resolve_id(data, &id))?;
            slot.modify(|current| {
                let mut next = current.clone();
                next.complete(&full_id);
                Ok(next)
            })?;
        },
        TodoCommands::Method { method } => {
            let method = PriorityMethod::parse(&method).ok_or_else(|| {
                ValidationError::new(
                    "method",
                    format!("expected simple, eisenhower, abcde or moscow, got {method:?}"),
                )
            })?;
            slot.modify(|current| {
                let mut next = current.clone();
                next.set_method(method);
                Ok(next)
            })?;
        },
    }
    slot.flush().await;

    format_todos(&slot.get(), show_all, format)
}

/// Expand a task id prefix to the single matching id.
fn resolve_id(data: &TodoData, prefix: &str) -> Result<String, WellkeepError> {
    let matches: Vec<&Task> = data
        .tasks
        .iter()
        .filter(|t| t.id.starts_with(prefix))
        .collect();

    match matches.as_slice() {
        [task] => Ok(task.id.clone()),
        [] => Err(WellkeepError::NotFound(format!("task {prefix}"))),
        _ => Err(WellkeepError::NotFound(format!(
            "task {prefix} is ambiguous ({} matches)",
            matches.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            ..Task::new("t", None)
        }
    }

    #[test]
    fn test_resolve_id_by_prefix() {
        let data = TodoData {
            tasks: vec![task("abc123"), task("abd456")],
            ..TodoData::default()
        };

        assert_eq!(resolve_id(&data, "abc").unwrap(), "abc123");
        assert!(resolve_id(&data, "ab").is_err());
        assert!(resolve_id(&data, "zz").is_err());
    }
}
