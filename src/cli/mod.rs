//! Command-line interface.

pub mod args;
pub mod commands;
pub mod context;

pub use context::AppContext;
