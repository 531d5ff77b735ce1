//! Path resolution for wellkeep configuration and data files.
//!
//! All wellkeep data is stored in `~/.wellkeep/`:
//! - `config.yaml` - Main configuration file
//! - `wellkeep.db` - SQLite database backing the local slot store
//! - `session.yaml` - Remote session recorded by `wellkeep login`

use std::path::PathBuf;

use crate::error::WellkeepError;

/// Paths to wellkeep configuration and data files.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root directory: `~/.wellkeep/`
    pub root: PathBuf,
    /// Config file: `~/.wellkeep/config.yaml`
    pub config_file: PathBuf,
    /// Database file: `~/.wellkeep/wellkeep.db`
    pub database: PathBuf,
    /// Session file: `~/.wellkeep/session.yaml`
    pub session_file: PathBuf,
}

impl Paths {
    /// Create paths based on the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, WellkeepError> {
        let home = std::env::var("HOME").map_err(|_| {
            WellkeepError::Config("Could not determine home directory".to_string())
        })?;

        Ok(Self::with_root(PathBuf::from(home).join(".wellkeep")))
    }

    /// Create paths with a custom root directory.
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.yaml"),
            database: root.join("wellkeep.db"),
            session_file: root.join("session.yaml"),
            root,
        }
    }

    /// Resolve paths from an explicit root, falling back to the home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no root is given and the home directory cannot be determined.
    pub fn resolve(root: Option<PathBuf>) -> Result<Self, WellkeepError> {
        root.map_or_else(Self::new, |root| Ok(Self::with_root(root)))
    }

    /// Ensure the data directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_dirs(&self) -> Result<(), WellkeepError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| {
                WellkeepError::Config(format!(
                    "Failed to create directory {}: {e}",
                    self.root.display()
                ))
            })?;
        }

        Ok(())
    }
}
