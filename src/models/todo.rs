//! To-do list with pluggable prioritization methods.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validate::{Validate, ValidationError};

/// How tasks are prioritized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityMethod {
    /// High / medium / low
    #[default]
    Simple,
    /// Urgent-important quadrants
    Eisenhower,
    /// A through E
    Abcde,
    /// Must / should / could / won't
    Moscow,
}

impl PriorityMethod {
    /// Priority labels valid under this method, highest first.
    #[must_use]
    pub const fn labels(&self) -> &'static [&'static str] {
        match self {
            Self::Simple => &["high", "medium", "low"],
            Self::Eisenhower => &["do", "schedule", "delegate", "eliminate"],
            Self::Abcde => &["a", "b", "c", "d", "e"],
            Self::Moscow => &["must", "should", "could", "wont"],
        }
    }

    /// Rank of a label (0 = highest), if valid under this method.
    #[must_use]
    pub fn rank(&self, label: &str) -> Option<usize> {
        self.labels().iter().position(|l| *l == label)
    }

    /// Parse a method name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "simple" => Some(Self::Simple),
            "eisenhower" => Some(Self::Eisenhower),
            "abcde" => Some(Self::Abcde),
            "moscow" => Some(Self::Moscow),
            _ => None,
        }
    }
}

impl std::fmt::Display for PriorityMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Simple => "simple",
            Self::Eisenhower => "eisenhower",
            Self::Abcde => "abcde",
            Self::Moscow => "moscow",
        };
        write!(f, "{s}")
    }
}

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default = "Utc::now", alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create an open task with a fresh id.
    #[must_use]
    pub fn new(text: impl Into<String>, priority: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            completed: false,
            priority,
            created_at: Utc::now(),
        }
    }
}

/// Persisted to-do list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TodoData {
    #[serde(default)]
    pub method: PriorityMethod,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl TodoData {
    /// Append a task.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the text is blank or the priority is
    /// not valid under the current method.
    pub fn add(&mut self, task: Task) -> Result<(), ValidationError> {
        validate_task(self.method, &task)?;
        self.tasks.push(task);
        Ok(())
    }

    /// Mark a task completed. Returns `false` if no task has that id.
    pub fn complete(&mut self, id: &str) -> bool {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .map(|t| t.completed = true)
            .is_some()
    }

    /// Switch prioritization method, clearing labels the new method doesn't know.
    pub fn set_method(&mut self, method: PriorityMethod) {
        self.method = method;
        for task in &mut self.tasks {
            if task
                .priority
                .as_deref()
                .is_some_and(|p| method.rank(p).is_none())
            {
                task.priority = None;
            }
        }
    }

    /// Open tasks, highest priority first, unprioritized last.
    #[must_use]
    pub fn open_by_priority(&self) -> Vec<&Task> {
        let mut open: Vec<&Task> = self.tasks.iter().filter(|t| !t.completed).collect();
        open.sort_by_key(|t| {
            t.priority
                .as_deref()
                .and_then(|p| self.method.rank(p))
                .unwrap_or(usize::MAX)
        });
        open
    }
}

fn validate_task(method: PriorityMethod, task: &Task) -> Result<(), ValidationError> {
    if task.id.trim().is_empty() {
        return Err(ValidationError::new("tasks.id", "must not be empty"));
    }
    if task.text.trim().is_empty() {
        return Err(ValidationError::new("tasks.text", "must not be empty"));
    }
    if let Some(priority) = &task.priority {
        if method.rank(priority).is_none() {
            return Err(ValidationError::new(
                "tasks.priority",
                format!(
                    "{priority:?} is not one of {} for {method}",
                    method.labels().join("/")
                ),
            ));
        }
    }
    Ok(())
}

impl Validate for TodoData {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for task in &self.tasks {
            validate_task(self.method, task)?;
            if !seen.insert(task.id.as_str()) {
                return Err(ValidationError::new(
                    "tasks.id",
                    format!("duplicate id {}", task.id),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::validate::decode;

    #[test]
    fn test_add_and_complete() {
        let mut data = TodoData::default();
        let task = Task::new("Stretch", Some("high".to_string()));
        let id = task.id.clone();

        data.add(task).unwrap();
        assert!(data.complete(&id));
        assert!(!data.complete("missing"));
        assert!(data.tasks[0].completed);
    }

    #[test]
    fn test_add_rejects_unknown_priority() {
        let mut data = TodoData::default();
        let err = data
            .add(Task::new("Plan week", Some("must".to_string())))
            .unwrap_err();
        assert_eq!(err.field, "tasks.priority");
        assert!(data.tasks.is_empty());
    }

    #[test]
    fn test_add_rejects_blank_text() {
        let mut data = TodoData::default();
        assert!(data.add(Task::new("   ", None)).is_err());
    }

    #[test]
    fn test_set_method_clears_foreign_labels() {
        let mut data = TodoData::default();
        data.add(Task::new("One", Some("high".to_string()))).unwrap();

        data.set_method(PriorityMethod::Moscow);
        assert_eq!(data.tasks[0].priority, None);
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_open_by_priority() {
        let mut data = TodoData {
            method: PriorityMethod::Eisenhower,
            tasks: Vec::new(),
        };
        data.add(Task::new("Later", None)).unwrap();
        data.add(Task::new("Someone else", Some("delegate".to_string())))
            .unwrap();
        data.add(Task::new("Now", Some("do".to_string()))).unwrap();

        let order: Vec<&str> = data
            .open_by_priority()
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(order, vec!["Now", "Someone else", "Later"]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let raw = r#"{"method":"simple","tasks":[
            {"id":"1","text":"a"},
            {"id":"1","text":"b"}
        ]}"#;
        let err = decode::<TodoData>(raw).unwrap_err();
        assert_eq!(err.field, "tasks.id");
    }

    #[test]
    fn test_decode_minimal_tasks() {
        let raw = r#"{"tasks":[{"id":"1","text":"Drink water"}]}"#;
        let data: TodoData = decode(raw).unwrap();
        assert_eq!(data.method, PriorityMethod::Simple);
        assert!(!data.tasks[0].completed);
    }

    #[test]
    fn test_method_parse_and_display() {
        assert_eq!(PriorityMethod::parse("MoSCoW"), Some(PriorityMethod::Moscow));
        assert_eq!(PriorityMethod::parse("kanban"), None);
        assert_eq!(PriorityMethod::Abcde.to_string(), "abcde");
    }
}
