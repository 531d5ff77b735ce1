//! Partial updates of composite slot values.

use serde::Serialize;
use serde_json::{Map, Value};

use super::slot::{PersistedSlot, SlotValue};
use crate::models::{decode_value, ValidationError};

impl<T: SlotValue> PersistedSlot<T> {
    /// Set one field of the composite value, leaving the others as they are.
    ///
    /// Goes through the same local write and sync path as
    /// [`on_change`](PersistedSlot::on_change).
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the slot does not hold an object, the
    /// field is unknown, or the merged value is invalid. The slot is left
    /// untouched in that case.
    pub fn update_field<V: Serialize>(&self, field: &str, value: V) -> Result<(), ValidationError> {
        let value =
            serde_json::to_value(value).map_err(|e| ValidationError::new(field, e.to_string()))?;
        let mut patch = Map::new();
        patch.insert(field.to_string(), value);
        self.update_fields(patch)
    }

    /// Set several fields at once.
    ///
    /// # Errors
    ///
    /// Same as [`update_field`](Self::update_field).
    pub fn update_fields(&self, patch: Map<String, Value>) -> Result<(), ValidationError> {
        self.modify(|current| merge_fields(current, patch))
    }
}

fn merge_fields<T: SlotValue>(current: &T, patch: Map<String, Value>) -> Result<T, ValidationError> {
    let mut object = match serde_json::to_value(current) {
        Ok(Value::Object(object)) => object,
        Ok(_) => return Err(ValidationError::new("value", "slot does not hold an object")),
        Err(e) => return Err(ValidationError::new("value", e.to_string())),
    };

    for (field, value) in patch {
        if !object.contains_key(&field) {
            return Err(ValidationError::new(field, "unknown field"));
        }
        object.insert(field, value);
    }
    decode_value(Value::Object(object))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::{keys, FastingState, SleepMode, SleepState};
    use crate::storage::{LocalStore, MemoryStore};
    use serde_json::json;

    fn sleep_slot(store: Arc<MemoryStore>) -> PersistedSlot<SleepState> {
        PersistedSlot::initialize(keys::SLEEP_STATE, SleepState::default(), store)
    }

    #[test]
    fn test_update_field_keeps_other_fields() {
        let store = Arc::new(MemoryStore::new());
        let slot = sleep_slot(store.clone());
        slot.on_change(SleepState {
            mode: SleepMode::Bed,
            time: "23:00".to_string(),
            ..SleepState::default()
        });

        slot.update_field("selected_time", "06:44").unwrap();

        let state = slot.get();
        assert_eq!(state.mode, SleepMode::Bed);
        assert_eq!(state.time, "23:00");
        assert_eq!(state.selected_time.as_deref(), Some("06:44"));
        assert_eq!(slot.edit_count(), 2);

        let stored: Value = serde_json::from_str(&store.read(keys::SLEEP_STATE).unwrap().unwrap()).unwrap();
        assert_eq!(stored["selected_time"], "06:44");
    }

    #[test]
    fn test_update_field_unknown_field() {
        let slot = sleep_slot(Arc::new(MemoryStore::new()));

        let err = slot.update_field("bedtime", "22:00").unwrap_err();
        assert_eq!(err.field, "bedtime");
        assert_eq!(slot.edit_count(), 0);
    }

    #[test]
    fn test_update_field_invalid_value() {
        let slot = sleep_slot(Arc::new(MemoryStore::new()));

        assert!(slot.update_field("mode", "nap").is_err());
        assert!(slot.update_field("time", "25:00").is_err());
        assert_eq!(slot.get(), SleepState::default());
    }

    #[test]
    fn test_update_field_on_scalar_slot() {
        let slot = PersistedSlot::initialize(
            keys::SLEEP_TIME,
            String::new(),
            Arc::new(MemoryStore::new()),
        );

        let err = slot.update_field("time", "07:00").unwrap_err();
        assert_eq!(err.reason, "slot does not hold an object");
    }

    #[test]
    fn test_update_fields_applies_together() {
        let slot = PersistedSlot::initialize(
            keys::FASTING_STATE,
            FastingState::default(),
            Arc::new(MemoryStore::new()),
        );

        let patch = json!({"protocol": "18:6", "goal_hours": 18});
        let Value::Object(patch) = patch else { unreachable!() };
        slot.update_fields(patch).unwrap();

        let state = slot.get();
        assert_eq!(state.protocol, "18:6");
        assert_eq!(state.goal_hours, 18);
        assert_eq!(slot.edit_count(), 1);
    }
}
