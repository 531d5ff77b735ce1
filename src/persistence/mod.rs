//! Local-first persistence with opportunistic remote sync.

mod multi;
mod slot;

pub use slot::{BootstrapOutcome, PersistedSlot, SlotValue};
