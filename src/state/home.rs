//! Home screen: the template list
//!
//! The view model follows one live query at a time (all templates, or a
//! search). Every emission replaces the cached record set, and the visible
//! list is re-derived from that cache whenever the data, the sort option or
//! the category filter changes. Starting a new search aborts the task that
//! follows the previous query.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::{DockyardError, DockyardResult};
use crate::models::{ServiceTemplate, TemplateId};
use crate::services::{RemoteHandle, SyncReport, SyncService, TemplateService};
use crate::storage::{LiveQuery, Storage};

use super::remove_template;
use super::sort::{derive_view, SortOption};

/// Snapshot of the home screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeUiState {
    /// Visible list: filtered by category and sorted
    pub templates: Vec<ServiceTemplate>,
    pub is_loading: bool,
    pub search_query: String,
    pub sort_option: SortOption,
    pub selected_ids: BTreeSet<TemplateId>,
    /// One-shot message, cleared by `user_message_shown`
    pub user_message: Option<String>,
    pub selected_category: Option<String>,
    /// Distinct categories of the current query result, sorted
    pub categories: Vec<String>,
}

impl HomeUiState {
    pub fn is_selection_mode(&self) -> bool {
        !self.selected_ids.is_empty()
    }
}

struct Shared {
    ui: watch::Sender<HomeUiState>,
    source: watch::Sender<Vec<ServiceTemplate>>,
    generation: AtomicU64,
    syncing: AtomicBool,
}

impl Shared {
    fn publish(&self, generation: u64, templates: Vec<ServiceTemplate>) {
        // aborted queries may still finish one emission
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }

        debug!(count = templates.len(), "Template list changed");
        self.source.send_replace(templates);
        let settled = !self.syncing.load(Ordering::SeqCst);
        self.refresh_with(|state| {
            if settled {
                state.is_loading = false;
            }
        });
    }

    fn refresh_with(&self, update: impl FnOnce(&mut HomeUiState)) {
        let source = self.source.borrow();
        let categories: Vec<String> = source
            .iter()
            .map(|t| t.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        self.ui.send_modify(|state| {
            update(state);
            state.templates =
                derive_view(&source, state.selected_category.as_deref(), state.sort_option);
            state.categories = categories;
        });
    }

    fn refresh(&self) {
        self.refresh_with(|_| {});
    }
}

/// View model behind the template list
pub struct HomeViewModel {
    storage: Arc<Storage>,
    remote: Option<RemoteHandle>,
    shared: Arc<Shared>,
    query_task: Option<JoinHandle<()>>,
}

impl HomeViewModel {
    /// Start following all templates
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(storage: Arc<Storage>, remote: Option<RemoteHandle>, sort_option: SortOption) -> Self {
        let (ui, _) = watch::channel(HomeUiState {
            is_loading: true,
            sort_option,
            ..HomeUiState::default()
        });
        let (source, _) = watch::channel(Vec::new());

        let mut view_model = Self {
            storage,
            remote,
            shared: Arc::new(Shared {
                ui,
                source,
                generation: AtomicU64::new(0),
                syncing: AtomicBool::new(false),
            }),
            query_task: None,
        };

        let query = view_model.storage.templates.watch_all();
        view_model.follow(query);
        view_model
    }

    pub fn subscribe(&self) -> watch::Receiver<HomeUiState> {
        self.shared.ui.subscribe()
    }

    pub fn state(&self) -> HomeUiState {
        self.shared.ui.borrow().clone()
    }

    /// Wait until the current query has produced its result
    pub async fn loaded(&self) -> HomeUiState {
        let mut rx = self.subscribe();
        let state = match rx.wait_for(|state| !state.is_loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        state
    }

    fn follow(&mut self, mut query: LiveQuery) {
        if let Some(task) = self.query_task.take() {
            task.abort();
        }

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let shared = Arc::clone(&self.shared);
        self.query_task = Some(tokio::spawn(async move {
            while let Some(result) = query.next().await {
                match result {
                    Ok(templates) => shared.publish(generation, templates),
                    Err(e) => {
                        error!(error = %e, "Template query failed");
                        shared.ui.send_modify(|state| {
                            state.is_loading = false;
                            state.user_message = Some(format!("Failed to load templates: {}", e));
                        });
                    }
                }
            }
        }));
    }

    /// Follow a name-or-image search; a blank query shows everything
    pub fn search(&mut self, query: impl Into<String>) {
        let query = query.into();
        self.shared.ui.send_modify(|state| {
            state.search_query = query.clone();
            state.is_loading = true;
        });

        let live = if query.trim().is_empty() {
            self.storage.templates.watch_all()
        } else {
            self.storage.templates.watch_search(query.trim())
        };
        self.follow(live);
    }

    pub fn clear_search(&mut self) {
        self.search("");
    }

    pub fn sort(&self, option: SortOption) {
        self.shared.refresh_with(|state| state.sort_option = option);
    }

    /// Show only one category, or all with `None`
    pub fn select_category(&self, category: Option<String>) {
        self.shared
            .refresh_with(|state| state.selected_category = category);
    }

    /// Flip a template's favorite flag, returning the new value
    pub fn toggle_favorite(&self, id: TemplateId) -> DockyardResult<bool> {
        TemplateService::new(&self.storage).toggle_favorite(id)
    }

    pub fn toggle_selection(&self, id: TemplateId) {
        self.shared.ui.send_modify(|state| {
            if !state.selected_ids.remove(&id) {
                state.selected_ids.insert(id);
            }
        });
    }

    pub fn clear_selection(&self) {
        self.shared.ui.send_modify(|state| state.selected_ids.clear());
    }

    /// Delete every selected template that is still listed
    ///
    /// Returns the number of templates removed. The selection is cleared
    /// afterwards.
    pub async fn delete_selected(&self) -> DockyardResult<usize> {
        let targets: Vec<TemplateId> = {
            let state = self.shared.ui.borrow();
            let listed: HashSet<TemplateId> = state.templates.iter().map(|t| t.id).collect();
            state
                .selected_ids
                .iter()
                .copied()
                .filter(|id| listed.contains(id))
                .collect()
        };

        let mut removed = 0;
        for id in targets {
            remove_template(&self.storage, self.remote.as_ref(), id).await?;
            removed += 1;
        }

        self.clear_selection();
        info!(removed, "Deleted selected templates");
        Ok(removed)
    }

    /// Run a full reconciliation and report the outcome in `user_message`
    pub async fn sync_with_cloud(&self) -> DockyardResult<SyncReport> {
        let Some(remote) = self.remote.as_ref() else {
            let err = DockyardError::Config("Remote store is not configured".into());
            self.shared
                .ui
                .send_modify(|state| state.user_message = Some(format!("Sync failed: {}", err)));
            return Err(err);
        };

        self.shared.syncing.store(true, Ordering::SeqCst);
        self.shared.ui.send_modify(|state| state.is_loading = true);

        let result = SyncService::new(&self.storage, remote).sync().await;

        self.shared.syncing.store(false, Ordering::SeqCst);
        let message = match &result {
            Ok(_) => "Sync completed".to_string(),
            Err(e) => format!("Sync failed: {}", e),
        };
        self.shared.ui.send_modify(|state| {
            state.is_loading = false;
            state.user_message = Some(message);
        });

        result
    }

    pub fn user_message_shown(&self) {
        self.shared.ui.send_modify(|state| state.user_message = None);
    }

    /// Re-derive the visible list from the cached records
    pub fn refresh(&self) {
        self.shared.refresh();
    }
}

impl Drop for HomeViewModel {
    fn drop(&mut self) {
        if let Some(task) = self.query_task.take() {
            task.abort();
        }
    }
}
