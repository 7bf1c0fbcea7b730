//! Detail screen: one template and its Compose snippet

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{DockyardError, DockyardResult};
use crate::export::compose::format_template;
use crate::models::{ServiceTemplate, TemplateId};
use crate::services::{RemoteHandle, TemplateService};
use crate::storage::Storage;

use super::remove_template;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailUiState {
    pub template: Option<ServiceTemplate>,
    /// Compose document for `template`, empty when there is none
    pub yaml: String,
    pub is_loading: bool,
}

pub struct DetailViewModel {
    storage: Arc<Storage>,
    remote: Option<RemoteHandle>,
    id: TemplateId,
    state: watch::Sender<DetailUiState>,
}

impl DetailViewModel {
    /// Load the template with `id`
    ///
    /// A missing template is not an error here; the state simply has no
    /// template.
    pub fn new(storage: Arc<Storage>, remote: Option<RemoteHandle>, id: TemplateId) -> DockyardResult<Self> {
        let (state, _) = watch::channel(DetailUiState {
            is_loading: true,
            ..DetailUiState::default()
        });

        let view_model = Self {
            storage,
            remote,
            id,
            state,
        };
        view_model.reload()?;
        Ok(view_model)
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailUiState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> DetailUiState {
        self.state.borrow().clone()
    }

    /// Re-read the template from the store
    pub fn reload(&self) -> DockyardResult<()> {
        let template = self.storage.templates.get(self.id)?;
        let yaml = template.as_ref().map(format_template).unwrap_or_default();

        self.state.send_modify(|state| {
            state.template = template;
            state.yaml = yaml;
            state.is_loading = false;
        });
        Ok(())
    }

    /// Record that the template was used now, e.g. after copying its YAML
    pub fn mark_used(&self) -> DockyardResult<i64> {
        let now = TemplateService::new(&self.storage).mark_used(self.id)?;
        self.reload()?;
        Ok(now)
    }

    /// Delete the template locally and, best effort, remotely
    pub async fn delete(&self) -> DockyardResult<ServiceTemplate> {
        if self.state.borrow().template.is_none() {
            return Err(DockyardError::template_not_found(self.id.to_string()));
        }

        self.state.send_modify(|state| state.is_loading = true);
        let result = remove_template(&self.storage, self.remote.as_ref(), self.id).await;

        self.state.send_modify(|state| {
            if result.is_ok() {
                state.template = None;
                state.yaml.clear();
            }
            state.is_loading = false;
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::DockyardPaths;
    use crate::models::RestartPolicy;
    use crate::services::sync::testing::{remote_row, MemoryRemote, SwitchProbe};
    use crate::services::SyncService;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Arc<Storage>) {
        let temp_dir = TempDir::new().unwrap();
        let paths = DockyardPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, Arc::new(storage))
    }

    #[test]
    fn test_loads_template_and_yaml() {
        let (_temp_dir, storage) = create_test_storage();
        let id = storage
            .templates
            .insert(
                ServiceTemplate::new("nginx", "nginx:latest")
                    .with_ports("80:80")
                    .with_restart_policy(RestartPolicy::Always),
            )
            .unwrap();

        let vm = DetailViewModel::new(storage, None, id).unwrap();
        let state = vm.state();
        assert_eq!(state.template.unwrap().name, "nginx");
        assert!(state.yaml.contains("    restart: always"));
        assert!(!state.is_loading);
    }

    #[test]
    fn test_missing_template_is_empty_state() {
        let (_temp_dir, storage) = create_test_storage();
        let vm = DetailViewModel::new(storage, None, TemplateId::new(9)).unwrap();
        let state = vm.state();
        assert!(state.template.is_none());
        assert!(state.yaml.is_empty());
    }

    #[test]
    fn test_mark_used() {
        let (_temp_dir, storage) = create_test_storage();
        let id = storage
            .templates
            .insert(ServiceTemplate::new("web", "nginx"))
            .unwrap();

        let vm = DetailViewModel::new(Arc::clone(&storage), None, id).unwrap();
        let now = vm.mark_used().unwrap();
        assert_eq!(vm.state().template.unwrap().last_used, now);
        assert_eq!(storage.templates.get(id).unwrap().unwrap().last_used, now);
    }

    #[tokio::test]
    async fn test_delete_removes_remote_copy() {
        let (_temp_dir, storage) = create_test_storage();
        let remote = Arc::new(MemoryRemote::with_rows(vec![remote_row("db", "postgres")]));
        let handle = RemoteHandle::new(remote.clone(), Arc::new(SwitchProbe::new(true)));

        SyncService::new(&storage, &handle).download().await.unwrap();
        let db = storage.templates.get_by_name("db").unwrap().unwrap();

        let vm = DetailViewModel::new(Arc::clone(&storage), Some(handle), db.id).unwrap();
        let removed = vm.delete().await.unwrap();
        assert_eq!(removed.name, "db");
        assert!(vm.state().template.is_none());
        assert_eq!(storage.templates.count().unwrap(), 0);
        assert!(remote.names().is_empty());

        assert!(vm.delete().await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_offline_still_deletes_locally() {
        let (_temp_dir, storage) = create_test_storage();
        let mut t = ServiceTemplate::new("web", "nginx");
        t.remote_id = Some(7);
        let id = storage.templates.insert(t).unwrap();

        let remote = Arc::new(MemoryRemote::default());
        let handle = RemoteHandle::new(remote, Arc::new(SwitchProbe::new(false)));
        let vm = DetailViewModel::new(Arc::clone(&storage), Some(handle), id).unwrap();

        vm.delete().await.unwrap();
        assert_eq!(storage.templates.count().unwrap(), 0);
    }
}
