//! Configuration management for wellkeep.
//!
//! This module handles loading and saving configuration from `~/.wellkeep/`.

mod paths;
mod settings;

pub use paths::Paths;
pub use settings::{Config, LoggingConfig, RemoteConfig, SyncConfig};
