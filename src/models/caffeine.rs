//! Caffeine timing settings.

use serde::{Deserialize, Serialize};

use super::validate::{check_clock, Validate, ValidationError};

/// One planned caffeine dose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dose {
    /// `HH:MM`
    pub time: String,
    #[serde(default)]
    pub label: String,
}

/// Persisted caffeine planner settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CaffeineSettings {
    /// `HH:MM`, or empty before the user picks one.
    #[serde(default, alias = "wakeTime")]
    pub wake_time: String,
    #[serde(default)]
    pub schedule: Vec<Dose>,
}

impl CaffeineSettings {
    /// Doses sorted by time of day.
    #[must_use]
    pub fn sorted_schedule(&self) -> Vec<&Dose> {
        let mut doses: Vec<&Dose> = self.schedule.iter().collect();
        doses.sort_by(|a, b| a.time.cmp(&b.time));
        doses
    }
}

impl Validate for CaffeineSettings {
    fn validate(&self) -> Result<(), ValidationError> {
        if !self.wake_time.is_empty() {
            check_clock("wake_time", &self.wake_time)?;
        }
        for dose in &self.schedule {
            check_clock("schedule.time", &dose.time)?;
        }
        Ok(())
    }
}
