//! Storage layer for wellkeep.
//!
//! This module provides the local durable store:
//! - `SQLite` database and schema migrations
//! - `LocalStore` trait with `SQLite` and in-memory implementations

mod database;
mod local;
mod migrations;

pub use database::Database;
pub use local::{LocalStore, MemoryStore, SqliteStore};
