//! Sleep calculator state.

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

use super::validate::{check_clock, Validate, ValidationError};

/// Length of one sleep cycle in minutes.
pub const CYCLE_MINUTES: i64 = 90;
/// Typical time to fall asleep in minutes.
pub const FALL_ASLEEP_MINUTES: i64 = 14;

/// Which end of the night the anchor time describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepMode {
    /// Anchor is the wake-up time; suggest bedtimes.
    #[default]
    Wake,
    /// Anchor is the bedtime; suggest wake-up times.
    Bed,
}

impl SleepMode {
    /// Parse a mode name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "wake" => Some(Self::Wake),
            "bed" | "sleep" => Some(Self::Bed),
            _ => None,
        }
    }
}

impl std::fmt::Display for SleepMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wake => write!(f, "wake"),
            Self::Bed => write!(f, "bed"),
        }
    }
}

/// Persisted sleep calculator state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SleepState {
    pub mode: SleepMode,
    /// Anchor time, `HH:MM`, or empty before the user picks one.
    #[serde(default)]
    pub time: String,
    #[serde(default, alias = "calculatedTimes")]
    pub calculated_times: Vec<String>,
    #[serde(default, alias = "selectedTime")]
    pub selected_time: Option<String>,
}

impl SleepState {
    /// Recompute `calculated_times` from `mode` and `time`.
    ///
    /// Clears the selection when it is no longer one of the suggestions.
    pub fn recalculate(&mut self) {
        self.calculated_times = calculate_times(self.mode, &self.time);
        if let Some(selected) = &self.selected_time {
            if !self.calculated_times.contains(selected) {
                self.selected_time = None;
            }
        }
    }
}

/// Suggested times for a given anchor, in the order they are shown.
///
/// Wake mode walks back 6, 5, 4, 3 full cycles from the wake time; bed mode
/// walks forward 3 to 6 cycles from the bedtime. Both include the time it
/// takes to fall asleep. Returns nothing for an empty or malformed anchor.
#[must_use]
pub fn calculate_times(mode: SleepMode, time: &str) -> Vec<String> {
    let Ok(anchor) = NaiveTime::parse_from_str(time, "%H:%M") else {
        return Vec::new();
    };

    let offsets: Vec<i64> = match mode {
        SleepMode::Wake => (3..=6)
            .rev()
            .map(|cycles| -(cycles * CYCLE_MINUTES + FALL_ASLEEP_MINUTES))
            .collect(),
        SleepMode::Bed => (3..=6)
            .map(|cycles| cycles * CYCLE_MINUTES + FALL_ASLEEP_MINUTES)
            .collect(),
    };

    offsets
        .into_iter()
        .map(|minutes| (anchor + Duration::minutes(minutes)).format("%H:%M").to_string())
        .collect()
}

impl Validate for SleepState {
    fn validate(&self) -> Result<(), ValidationError> {
        if !self.time.is_empty() {
            check_clock("time", &self.time)?;
        }
        for time in &self.calculated_times {
            check_clock("calculated_times", time)?;
        }
        if let Some(selected) = &self.selected_time {
            check_clock("selected_time", selected)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::validate::decode;

    #[test]
    fn test_wake_mode_suggests_bedtimes() {
        let times = calculate_times(SleepMode::Wake, "06:00");
        assert_eq!(times, vec!["20:46", "22:16", "23:46", "01:16"]);
    }

    #[test]
    fn test_bed_mode_suggests_wake_times() {
        let times = calculate_times(SleepMode::Bed, "23:00");
        assert_eq!(times, vec!["03:44", "05:14", "06:44", "08:14"]);
    }

    #[test]
    fn test_calculate_with_empty_time() {
        assert!(calculate_times(SleepMode::Wake, "").is_empty());
    }

    #[test]
    fn test_recalculate_drops_stale_selection() {
        let mut state = SleepState {
            mode: SleepMode::Wake,
            time: "06:00".to_string(),
            calculated_times: Vec::new(),
            selected_time: Some("22:16".to_string()),
        };
        state.recalculate();
        assert_eq!(state.selected_time.as_deref(), Some("22:16"));

        state.time = "07:00".to_string();
        state.recalculate();
        assert_eq!(state.selected_time, None);
    }

    #[test]
    fn test_decode_minimal_state() {
        let state: SleepState = decode(r#"{"mode":"wake","time":"06:00"}"#).unwrap();
        assert_eq!(state.mode, SleepMode::Wake);
        assert_eq!(state.time, "06:00");
        assert!(state.calculated_times.is_empty());
    }

    #[test]
    fn test_decode_camel_case_fields() {
        let state: SleepState = decode(
            r#"{"mode":"bed","time":"23:00","calculatedTimes":["06:44"],"selectedTime":"06:44"}"#,
        )
        .unwrap();
        assert_eq!(state.calculated_times, vec!["06:44"]);
        assert_eq!(state.selected_time.as_deref(), Some("06:44"));
    }

    #[test]
    fn test_invalid_time_rejected() {
        let err = decode::<SleepState>(r#"{"mode":"wake","time":"6am"}"#).unwrap_err();
        assert_eq!(err.field, "time");
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let err = decode::<SleepState>(r#"{"mode":"nap","time":"06:00"}"#).unwrap_err();
        assert_eq!(err.field, "json");
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(SleepMode::parse("Wake"), Some(SleepMode::Wake));
        assert_eq!(SleepMode::parse("bed"), Some(SleepMode::Bed));
        assert_eq!(SleepMode::parse("nap"), None);
    }
}
