//! Slot keys for the local store.
//!
//! Keys are fixed string constants, one per feature slot, so two slots can
//! never collide.

/// Sleep calculator mode (`"wake"` or `"bed"`).
pub const SLEEP_MODE: &str = "sleep-mode";
/// Sleep calculator anchor time.
pub const SLEEP_TIME: &str = "sleep-time";
/// Composite sleep calculator state.
pub const SLEEP_STATE: &str = "sleep-state";
/// Caffeine planner wake time.
pub const CAFFEINE_WAKE_TIME: &str = "caffeine-wake-time";
/// Composite caffeine settings.
pub const CAFFEINE_SETTINGS: &str = "caffeine-settings";
/// To-do list and prioritization method.
pub const TODO_DATA: &str = "todo-data";
/// Intermittent fasting tracker state.
pub const FASTING_STATE: &str = "fasting-state";
/// Cached reminder schedule owned by the notification layer.
pub const NOTIFICATION_SCHEDULE: &str = "notification-schedule";

const MIGRATION_FLAG_PREFIX: &str = "migration-done:";

/// Every feature slot key, in display order.
pub const ALL: &[&str] = &[
    SLEEP_MODE,
    SLEEP_TIME,
    SLEEP_STATE,
    CAFFEINE_WAKE_TIME,
    CAFFEINE_SETTINGS,
    TODO_DATA,
    FASTING_STATE,
    NOTIFICATION_SCHEDULE,
];

/// Local flag recording that an account's legacy data was pushed.
#[must_use]
pub fn migration_flag(account_id: &str) -> String {
    format!("{MIGRATION_FLAG_PREFIX}{account_id}")
}

/// Default of the plain string slots; `None` for every other key.
#[must_use]
pub fn text_default(key: &str) -> Option<&'static str> {
    match key {
        SLEEP_MODE => Some("wake"),
        SLEEP_TIME | CAFFEINE_WAKE_TIME => Some(""),
        _ => None,
    }
}

/// Whether `key` is a feature slot key.
#[must_use]
pub fn is_known(key: &str) -> bool {
    ALL.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_flag_is_per_account() {
        assert_eq!(migration_flag("abc"), "migration-done:abc");
        assert_ne!(migration_flag("abc"), migration_flag("abd"));
    }

    #[test]
    fn test_keys_are_unique() {
        let mut keys = ALL.to_vec();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), ALL.len());
    }

    #[test]
    fn test_text_defaults() {
        assert_eq!(text_default(SLEEP_TIME), Some(""));
        assert_eq!(text_default(SLEEP_MODE), Some("wake"));
        assert_eq!(text_default(CAFFEINE_WAKE_TIME), Some(""));
        assert_eq!(text_default(TODO_DATA), None);
    }

    #[test]
    fn test_is_known() {
        assert!(is_known("todo-data"));
        assert!(!is_known("migration-done:abc"));
    }
}
