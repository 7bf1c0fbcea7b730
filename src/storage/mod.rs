//! Storage layer for Dockyard
//!
//! Provides JSON file storage with atomic writes, schema migrations and live
//! queries that re-emit after every mutation.

pub mod file_io;
pub mod live;
pub mod migrations;
pub mod templates;

pub use file_io::{read_json_opt, write_json_atomic};
pub use live::{LiveQuery, QueryKind};
pub use migrations::{TemplateDocument, CURRENT_SCHEMA_VERSION};
pub use templates::TemplateRepository;

use std::sync::Arc;

use crate::config::paths::DockyardPaths;
use crate::error::DockyardError;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: DockyardPaths,
    pub templates: Arc<TemplateRepository>,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: DockyardPaths) -> Result<Self, DockyardError> {
        paths.ensure_directories()?;

        Ok(Self {
            templates: Arc::new(TemplateRepository::new(paths.templates_file())),
            paths,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &DockyardPaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&self) -> Result<(), DockyardError> {
        self.templates.load()
    }

    /// Check if storage has been initialized
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }
}
