//! Row filters for remote select/delete.

use serde_json::Value;

/// A single column condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `column = value`
    Eq { column: String, value: String },
    /// `column IN (values)`
    In { column: String, values: Vec<String> },
    /// `column NOT IN (values)`
    NotIn { column: String, values: Vec<String> },
}

/// Conjunction of column conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Filter on `column = value`.
    #[must_use]
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::default().and_eq(column, value)
    }

    /// Add `column = value`.
    #[must_use]
    pub fn and_eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push(Condition::Eq {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Add `column IN (values)`. An empty list matches nothing.
    #[must_use]
    pub fn and_in(mut self, column: impl Into<String>, values: Vec<String>) -> Self {
        self.conditions.push(Condition::In {
            column: column.into(),
            values,
        });
        self
    }

    /// Add `column NOT IN (values)`. An empty list excludes nothing.
    #[must_use]
    pub fn and_not_in(mut self, column: impl Into<String>, values: Vec<String>) -> Self {
        if !values.is_empty() {
            self.conditions.push(Condition::NotIn {
                column: column.into(),
                values,
            });
        }
        self
    }

    /// The conditions, in the order they were added.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Whether the filter has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate against a JSON row.
    #[must_use]
    pub fn matches(&self, row: &Value) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::Eq { column, value } => {
                column_text(row, column).is_some_and(|actual| actual == *value)
            },
            Condition::In { column, values } => {
                column_text(row, column).is_some_and(|actual| values.contains(&actual))
            },
            Condition::NotIn { column, values } => {
                column_text(row, column).map_or(true, |actual| !values.contains(&actual))
            },
        })
    }

    /// Render as PostgREST query parameters.
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        self.conditions
            .iter()
            .map(|condition| match condition {
                Condition::Eq { column, value } => (column.clone(), format!("eq.{value}")),
                Condition::In { column, values } => {
                    (column.clone(), format!("in.({})", quote_list(values)))
                },
                Condition::NotIn { column, values } => {
                    (column.clone(), format!("not.in.({})", quote_list(values)))
                },
            })
            .collect()
    }
}

fn quote_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(",")
}

fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
