//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the view models and services.

pub mod export;
pub mod sync;
pub mod template;

pub use export::{handle_export_command, ExportCommands};
pub use sync::{handle_sync_command, SyncCommands};
pub use template::{handle_template_command, TemplateCommands};

use std::sync::Arc;

use tracing::warn;

use crate::config::Settings;
use crate::error::{DockyardError, DockyardResult};
use crate::models::ServiceTemplate;
use crate::services::{RemoteHandle, TemplateService};
use crate::storage::Storage;

/// Everything a command handler needs
pub struct AppContext {
    pub storage: Arc<Storage>,
    pub settings: Settings,
    remote: Option<RemoteHandle>,
}

impl AppContext {
    /// Wire up the remote handle when the settings describe one
    ///
    /// A broken remote configuration is logged and treated as absent here;
    /// commands that need the remote report it through `require_remote`.
    pub fn new(storage: Storage, settings: Settings) -> Self {
        let remote = if settings.remote_configured() {
            match RemoteHandle::from_settings(&settings) {
                Ok(remote) => Some(remote),
                Err(e) => {
                    warn!(error = %e, "Remote store disabled");
                    None
                }
            }
        } else {
            None
        };

        Self::with_remote(storage, settings, remote)
    }

    pub fn with_remote(storage: Storage, settings: Settings, remote: Option<RemoteHandle>) -> Self {
        Self {
            storage: Arc::new(storage),
            settings,
            remote,
        }
    }

    pub fn remote(&self) -> Option<&RemoteHandle> {
        self.remote.as_ref()
    }

    /// The remote handle, or an error explaining how to configure one
    pub fn require_remote(&self) -> DockyardResult<&RemoteHandle> {
        if let Some(remote) = &self.remote {
            return Ok(remote);
        }

        if self.settings.remote_configured() {
            RemoteHandle::from_settings(&self.settings)?;
        }
        Err(DockyardError::Config(
            "Remote store is not configured. Set DOCKYARD_REMOTE_URL and DOCKYARD_REMOTE_KEY, \
             or run 'dockyard config --remote-url <url> --remote-key <key>'"
                .into(),
        ))
    }

    /// Look up a template by name or id
    pub fn find_template(&self, identifier: &str) -> DockyardResult<ServiceTemplate> {
        TemplateService::new(&self.storage).require(identifier)
    }
}
