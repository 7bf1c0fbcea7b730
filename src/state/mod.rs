//! Presentation state for the list, detail and form screens
//!
//! Each view model owns a `watch` channel carrying a snapshot of its screen
//! state. User intents are methods; the snapshot is updated in place and any
//! subscriber sees the new value.

pub mod detail;
pub mod form;
pub mod home;
pub mod sort;

pub use detail::{DetailUiState, DetailViewModel};
pub use form::{FormUiState, FormViewModel};
pub use home::{HomeUiState, HomeViewModel};
pub use sort::{derive_view, sort_templates, SortOption};

use tracing::warn;

use crate::error::DockyardResult;
use crate::models::{ServiceTemplate, TemplateId};
use crate::services::{RemoteHandle, SyncService, TemplateService};
use crate::storage::Storage;

/// Delete locally, then try to delete the remote copy
///
/// Remote failures are logged; the local delete stands either way.
pub(crate) async fn remove_template(
    storage: &Storage,
    remote: Option<&RemoteHandle>,
    id: TemplateId,
) -> DockyardResult<ServiceTemplate> {
    let removed = TemplateService::new(storage).delete(id)?;

    if let Some(remote) = remote {
        if let Err(e) = SyncService::new(storage, remote).delete_remote(&removed).await {
            warn!(name = %removed.name, error = %e, "Remote copy not deleted");
        }
    }

    Ok(removed)
}
