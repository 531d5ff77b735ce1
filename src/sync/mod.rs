//! Remote synchronization.
//!
//! - `status`: the observable [`SyncStatus`]
//! - `service`: [`SyncService`], shared by every syncing slot
//! - `bindings`: how each slot maps onto remote rows
//! - `migration`: the one-time legacy data push

mod bindings;
mod migration;
mod service;
mod status;

pub use bindings::{
    CaffeineBinding, FastingBinding, RecordBinding, SleepBinding, SlotBinding, TasksBinding,
};
pub use migration::{MigrationGuard, MigrationOutcome};
pub use service::{ListenerId, SyncService};
pub use status::SyncStatus;
