//! Persisted records.
//!
//! Each feature owns one slot in the local store. The records here are what
//! those slots hold, plus the validation that decides whether a stored or
//! fetched value is trusted.

mod caffeine;
mod fasting;
pub mod keys;
mod sleep;
mod todo;
mod validate;

pub use caffeine::{CaffeineSettings, Dose};
pub use fasting::{FastingState, MAX_GOAL_HOURS};
pub use sleep::{calculate_times, SleepMode, SleepState, CYCLE_MINUTES, FALL_ASLEEP_MINUTES};
pub use todo::{PriorityMethod, Task, TodoData};
pub use validate::{check_clock, decode, decode_value, Validate, ValidationError};
