//! Intermittent fasting tracker state.

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::validate::{Validate, ValidationError};

static PROTOCOL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    // fasting hours : eating hours, e.g. "16:8"
    Regex::new(r"^(\d{1,2}):(\d{1,2})$").unwrap_or_else(|e| panic!("Invalid protocol regex: {e}"))
});

/// Longest fast the tracker accepts, in hours.
pub const MAX_GOAL_HOURS: u32 = 72;

/// Persisted fasting state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastingState {
    /// Protocol name such as `"16:8"`.
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// Start of the running fast, if any.
    #[serde(default, alias = "startedAt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default = "default_goal_hours", alias = "goalHours")]
    pub goal_hours: u32,
}

fn default_protocol() -> String {
    "16:8".to_string()
}

const fn default_goal_hours() -> u32 {
    16
}

impl Default for FastingState {
    fn default() -> Self {
        Self {
            protocol: default_protocol(),
            started_at: None,
            goal_hours: default_goal_hours(),
        }
    }
}

impl FastingState {
    /// Fasting hours implied by a protocol name.
    #[must_use]
    pub fn protocol_hours(protocol: &str) -> Option<u32> {
        PROTOCOL_PATTERN
            .captures(protocol)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Switch protocol, adopting its fasting hours as the goal.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for a malformed protocol name.
    pub fn set_protocol(&mut self, protocol: &str) -> Result<(), ValidationError> {
        let hours = Self::protocol_hours(protocol).ok_or_else(|| {
            ValidationError::new("protocol", format!("expected FAST:EAT, got {protocol:?}"))
        })?;
        let next = Self {
            protocol: protocol.to_string(),
            goal_hours: hours,
            started_at: self.started_at,
        };
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Whether a fast is running.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    /// Start a fast. Restarting a running fast keeps the original start.
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    /// Stop the running fast, returning how long it lasted.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<Duration> {
        self.started_at.take().map(|start| now - start)
    }

    /// Time fasted so far.
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.started_at.map(|start| now - start)
    }

    /// When the running fast reaches its goal.
    #[must_use]
    pub fn goal_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
            .map(|start| start + Duration::hours(i64::from(self.goal_hours)))
    }
}

impl Validate for FastingState {
    fn validate(&self) -> Result<(), ValidationError> {
        if Self::protocol_hours(&self.protocol).is_none() {
            return Err(ValidationError::new(
                "protocol",
                format!("expected FAST:EAT, got {:?}", self.protocol),
            ));
        }
        if self.goal_hours == 0 || self.goal_hours > MAX_GOAL_HOURS {
            return Err(ValidationError::new(
                "goal_hours",
                format!("must be between 1 and {MAX_GOAL_HOURS}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::validate::decode;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_default_state() {
        let state = FastingState::default();
        assert_eq!(state.protocol, "16:8");
        assert_eq!(state.goal_hours, 16);
        assert!(!state.is_active());
        assert!(state.validate().is_ok());
    }

    #[test]
    fn test_start_and_stop() {
        let mut state = FastingState::default();
        state.start(at(8));
        state.start(at(9));

        assert_eq!(state.started_at, Some(at(8)));
        assert_eq!(state.elapsed(at(12)), Some(Duration::hours(4)));
        assert_eq!(state.goal_at(), Some(at(8) + Duration::hours(16)));

        assert_eq!(state.stop(at(20)), Some(Duration::hours(12)));
        assert!(!state.is_active());
        assert_eq!(state.stop(at(21)), None);
    }

    #[test]
    fn test_set_protocol() {
        let mut state = FastingState::default();
        state.set_protocol("18:6").unwrap();
        assert_eq!(state.goal_hours, 18);

        assert!(state.set_protocol("eighteen").is_err());
        assert_eq!(state.protocol, "18:6");
    }

    #[test]
    fn test_goal_out_of_range() {
        let err = decode::<FastingState>(r#"{"protocol":"16:8","goal_hours":96}"#).unwrap_err();
        assert_eq!(err.field, "goal_hours");
    }

    #[test]
    fn test_decode_defaults_missing_fields() {
        let state: FastingState = decode("{}").unwrap();
        assert_eq!(state, FastingState::default());
    }
}
