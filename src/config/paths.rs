//! Path management for Dockyard
//!
//! ## Path Resolution Order
//!
//! 1. `DOCKYARD_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/dockyard` or `~/.config/dockyard`
//! 3. Windows: `%APPDATA%\dockyard`

use std::path::PathBuf;

use crate::error::DockyardError;

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "DOCKYARD_DATA_DIR";

/// Manages all paths used by Dockyard
#[derive(Debug, Clone)]
pub struct DockyardPaths {
    base_dir: PathBuf,
}

impl DockyardPaths {
    /// Resolve paths from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, DockyardError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create paths rooted at a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (~/.config/dockyard/data/)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the log directory (~/.config/dockyard/logs/)
    pub fn log_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to templates.json
    pub fn templates_file(&self) -> PathBuf {
        self.data_dir().join("templates.json")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), DockyardError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| DockyardError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| DockyardError::Io(format!("Failed to create data directory: {}", e)))?;

        std::fs::create_dir_all(self.log_dir())
            .map_err(|e| DockyardError::Io(format!("Failed to create log directory: {}", e)))?;

        Ok(())
    }

    /// Check if Dockyard has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, DockyardError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => {
            let home = std::env::var("HOME").map_err(|_| {
                DockyardError::Config("HOME environment variable not set".into())
            })?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("dockyard"))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, DockyardError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| DockyardError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("dockyard"))
}
