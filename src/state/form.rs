//! Create/edit form
//!
//! Fields are held as typed text. `save` validates them, writes the record
//! locally and then pushes it to the remote store when one is configured.
//! A failed push never fails the save.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::error::{DockyardError, DockyardResult};
use crate::models::{RestartPolicy, ServiceTemplate, TemplateId};
use crate::services::{RemoteHandle, SyncService, TemplateDraft, TemplateService};
use crate::storage::Storage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormUiState {
    pub name: String,
    pub image: String,
    pub ports: String,
    pub volumes: String,
    /// `KEY=value` lines
    pub env_vars: String,
    pub restart_policy: String,
    pub category: String,
    pub is_loading: bool,
    /// Message from the last failed save
    pub error: Option<String>,
}

impl Default for FormUiState {
    fn default() -> Self {
        Self {
            name: String::new(),
            image: String::new(),
            ports: String::new(),
            volumes: String::new(),
            env_vars: String::new(),
            restart_policy: RestartPolicy::default().to_string(),
            category: String::new(),
            is_loading: false,
            error: None,
        }
    }
}

impl FormUiState {
    fn from_draft(draft: TemplateDraft) -> Self {
        Self {
            name: draft.name,
            image: draft.image,
            ports: draft.ports,
            volumes: draft.volumes,
            env_vars: draft.env,
            restart_policy: draft.restart_policy,
            category: draft.category,
            ..Self::default()
        }
    }

    fn to_draft(&self) -> TemplateDraft {
        TemplateDraft {
            name: self.name.clone(),
            image: self.image.clone(),
            ports: self.ports.clone(),
            volumes: self.volumes.clone(),
            env: self.env_vars.clone(),
            restart_policy: self.restart_policy.clone(),
            category: self.category.clone(),
        }
    }
}

pub struct FormViewModel {
    storage: Arc<Storage>,
    remote: Option<RemoteHandle>,
    editing: Option<TemplateId>,
    state: watch::Sender<FormUiState>,
}

impl FormViewModel {
    /// Blank form for a new template
    pub fn create(storage: Arc<Storage>, remote: Option<RemoteHandle>) -> Self {
        let (state, _) = watch::channel(FormUiState::default());
        Self {
            storage,
            remote,
            editing: None,
            state,
        }
    }

    /// Form prefilled from an existing template
    pub fn edit(storage: Arc<Storage>, remote: Option<RemoteHandle>, id: TemplateId) -> DockyardResult<Self> {
        let template = storage
            .templates
            .get(id)?
            .ok_or_else(|| DockyardError::template_not_found(id.to_string()))?;

        let (state, _) = watch::channel(FormUiState::from_draft(TemplateDraft::from_template(
            &template,
        )));
        Ok(Self {
            storage,
            remote,
            editing: Some(id),
            state,
        })
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<FormUiState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> FormUiState {
        self.state.borrow().clone()
    }

    fn set(&self, update: impl FnOnce(&mut FormUiState)) {
        self.state.send_modify(|state| {
            update(state);
            state.error = None;
        });
    }

    pub fn set_name(&self, value: impl Into<String>) {
        let value = value.into();
        self.set(|s| s.name = value);
    }

    pub fn set_image(&self, value: impl Into<String>) {
        let value = value.into();
        self.set(|s| s.image = value);
    }

    pub fn set_ports(&self, value: impl Into<String>) {
        let value = value.into();
        self.set(|s| s.ports = value);
    }

    pub fn set_volumes(&self, value: impl Into<String>) {
        let value = value.into();
        self.set(|s| s.volumes = value);
    }

    pub fn set_env_vars(&self, value: impl Into<String>) {
        let value = value.into();
        self.set(|s| s.env_vars = value);
    }

    pub fn set_restart_policy(&self, value: impl Into<String>) {
        let value = value.into();
        self.set(|s| s.restart_policy = value);
    }

    pub fn set_category(&self, value: impl Into<String>) {
        let value = value.into();
        self.set(|s| s.category = value);
    }

    /// Validate and store the form, then push it if auto-push is on
    ///
    /// Validation failures are also recorded in `error`.
    pub async fn save(&self, auto_push: bool) -> DockyardResult<ServiceTemplate> {
        let draft = {
            let state = self.state.borrow();
            state.to_draft()
        };
        self.state.send_modify(|state| state.is_loading = true);

        let service = TemplateService::new(&self.storage);
        let saved = match self.editing {
            Some(id) => service.update(id, &draft),
            None => service.create(&draft),
        };

        let template = match saved {
            Ok(template) => template,
            Err(e) => {
                let message = match &e {
                    DockyardError::Validation(msg) => msg.clone(),
                    other => other.to_string(),
                };
                self.state.send_modify(|state| {
                    state.is_loading = false;
                    state.error = Some(message);
                });
                return Err(e);
            }
        };

        match (&self.remote, auto_push) {
            (Some(remote), true) => {
                SyncService::new(&self.storage, remote)
                    .push_best_effort(&template)
                    .await;
            }
            _ => debug!(name = %template.name, "Saved locally only"),
        }

        self.state.send_modify(|state| state.is_loading = false);
        Ok(template)
    }
}
