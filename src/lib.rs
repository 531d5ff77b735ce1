//! wellkeep - offline-first planner state with optional account sync
//!
//! Sleep, caffeine, fasting and to-do state is kept in named slots. Every
//! edit is written to local storage first and pushed to the backend in the
//! background when a session exists. A slot pulls the account's remote
//! state once at startup, and legacy local data is pushed to an account
//! exactly once.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod persistence;
pub mod remote;
pub mod storage;
pub mod sync;

pub use cli::args::{Cli, Commands, OutputFormat};
pub use error::WellkeepError;
pub use persistence::{BootstrapOutcome, PersistedSlot};
pub use sync::{SyncService, SyncStatus};
