//! Template repository for JSON storage
//!
//! Manages loading and saving templates to templates.json. Every mutation is
//! written through to disk and bumps a revision counter that wakes all live
//! queries.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{DockyardError, DockyardResult};
use crate::models::{ServiceTemplate, TemplateId};

use super::file_io::{read_json_opt, write_json_atomic};
use super::live::{LiveQuery, QueryKind};
use super::migrations::{migrate, TemplateDocument, CURRENT_SCHEMA_VERSION};

fn following_id(id: TemplateId) -> DockyardResult<i32> {
    id.value().checked_add(1).ok_or_else(|| {
        DockyardError::Storage(format!("Template id {} leaves no room for new ids", id))
    })
}

#[derive(Debug, Default, Clone)]
struct RepoState {
    next_id: i32,
    rows: BTreeMap<TemplateId, ServiceTemplate>,
}

impl RepoState {
    fn assign_id(&mut self) -> DockyardResult<TemplateId> {
        let id = TemplateId::new(self.next_id.max(1));
        self.next_id = following_id(id)?;
        Ok(id)
    }

    fn to_document(&self) -> TemplateDocument {
        TemplateDocument {
            schema_version: CURRENT_SCHEMA_VERSION,
            next_id: self.next_id.max(1),
            templates: self.rows.values().cloned().collect(),
        }
    }
}

/// Repository for template persistence
pub struct TemplateRepository {
    path: PathBuf,
    state: RwLock<RepoState>,
    revision: watch::Sender<u64>,
}

impl TemplateRepository {
    /// Create a new, empty template repository backed by `path`
    pub fn new(path: PathBuf) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            path,
            state: RwLock::new(RepoState {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
            revision,
        }
    }

    /// Load templates from disk, migrating older documents in place
    pub fn load(&self) -> DockyardResult<()> {
        let raw: Option<serde_json::Value> = read_json_opt(&self.path)?;
        let (doc, changed) = match raw {
            Some(raw) => migrate(raw)?,
            None => (TemplateDocument::default(), false),
        };

        if changed {
            write_json_atomic(&self.path, &doc)?;
        }

        let mut state = self.write_state()?;
        state.next_id = doc.next_id;
        state.rows = doc.templates.into_iter().map(|t| (t.id, t)).collect();
        debug!(count = state.rows.len(), "Loaded templates");
        drop(state);

        self.notify();
        Ok(())
    }

    /// Insert a template, replacing any row with the same id
    ///
    /// An unassigned id gets the next free id, which is returned.
    pub fn insert(&self, mut template: ServiceTemplate) -> DockyardResult<TemplateId> {
        let mut state = self.write_state()?;

        if template.id.is_unassigned() {
            template.id = state.assign_id()?;
        } else if template.id.value() >= state.next_id {
            state.next_id = following_id(template.id)?;
        }

        let id = template.id;
        state.rows.insert(id, template);
        self.commit(&state)?;
        Ok(id)
    }

    /// Replace an existing template
    pub fn update(&self, template: ServiceTemplate) -> DockyardResult<()> {
        let mut state = self.write_state()?;

        if !state.rows.contains_key(&template.id) {
            return Err(DockyardError::template_not_found(template.id.to_string()));
        }

        state.rows.insert(template.id, template);
        self.commit(&state)
    }

    /// Delete a template, returning whether it existed
    pub fn delete(&self, id: TemplateId) -> DockyardResult<bool> {
        let mut state = self.write_state()?;

        if state.rows.remove(&id).is_none() {
            return Ok(false);
        }

        self.commit(&state)?;
        Ok(true)
    }

    /// Delete every template
    pub fn delete_all(&self) -> DockyardResult<()> {
        let mut state = self.write_state()?;
        state.rows.clear();
        self.commit(&state)
    }

    /// Insert many templates, each under a freshly assigned id
    pub fn insert_all(&self, templates: Vec<ServiceTemplate>) -> DockyardResult<Vec<TemplateId>> {
        let mut state = self.write_state()?;
        let mut next = state.clone();
        let ids = Self::insert_fresh(&mut next, templates)?;
        *state = next;
        self.commit(&state)?;
        Ok(ids)
    }

    /// Swap the whole table for `templates` in one write
    ///
    /// Ids are assigned in input order, so the first template ends up last in
    /// `get_all`.
    pub fn replace_all(&self, templates: Vec<ServiceTemplate>) -> DockyardResult<Vec<TemplateId>> {
        let mut state = self.write_state()?;

        let mut next = RepoState {
            next_id: state.next_id,
            rows: BTreeMap::new(),
        };
        let ids = Self::insert_fresh(&mut next, templates)?;

        write_json_atomic(&self.path, &next.to_document())?;
        *state = next;
        drop(state);

        info!(count = ids.len(), "Replaced local templates");
        self.notify();
        Ok(ids)
    }

    /// Get a template by id
    pub fn get(&self, id: TemplateId) -> DockyardResult<Option<ServiceTemplate>> {
        Ok(self.read_state()?.rows.get(&id).cloned())
    }

    /// Get a template by exact name, newest first if names repeat
    pub fn get_by_name(&self, name: &str) -> DockyardResult<Option<ServiceTemplate>> {
        let state = self.read_state()?;
        Ok(state.rows.values().rev().find(|t| t.name == name).cloned())
    }

    /// All templates, most recently inserted first
    pub fn get_all(&self) -> DockyardResult<Vec<ServiceTemplate>> {
        Ok(self.read_state()?.rows.values().rev().cloned().collect())
    }

    /// Templates whose name or image contains `query`, case-insensitively
    pub fn search(&self, query: &str) -> DockyardResult<Vec<ServiceTemplate>> {
        let state = self.read_state()?;
        Ok(state
            .rows
            .values()
            .rev()
            .filter(|t| t.matches_query(query))
            .cloned()
            .collect())
    }

    /// Distinct category labels, sorted
    pub fn categories(&self) -> DockyardResult<Vec<String>> {
        let state = self.read_state()?;
        let set: BTreeSet<String> = state.rows.values().map(|t| t.category.clone()).collect();
        Ok(set.into_iter().collect())
    }

    /// Set only the favorite flag
    pub fn set_favorite(&self, id: TemplateId, favorite: bool) -> DockyardResult<()> {
        let mut state = self.write_state()?;
        let row = state
            .rows
            .get_mut(&id)
            .ok_or_else(|| DockyardError::template_not_found(id.to_string()))?;
        row.is_favorite = favorite;
        self.commit(&state)
    }

    /// Set only the last-used timestamp
    pub fn set_last_used(&self, id: TemplateId, millis: i64) -> DockyardResult<()> {
        let mut state = self.write_state()?;
        let row = state
            .rows
            .get_mut(&id)
            .ok_or_else(|| DockyardError::template_not_found(id.to_string()))?;
        row.last_used = millis;
        self.commit(&state)
    }

    /// Count templates
    pub fn count(&self) -> DockyardResult<usize> {
        Ok(self.read_state()?.rows.len())
    }

    /// Live view of `get_all`
    pub fn watch_all(self: &Arc<Self>) -> LiveQuery {
        LiveQuery::new(Arc::clone(self), self.revision.subscribe(), QueryKind::All)
    }

    /// Live view of `search(query)`
    pub fn watch_search(self: &Arc<Self>, query: impl Into<String>) -> LiveQuery {
        LiveQuery::new(
            Arc::clone(self),
            self.revision.subscribe(),
            QueryKind::Search(query.into()),
        )
    }

    /// Current revision, bumped on every committed mutation
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    fn insert_fresh(
        state: &mut RepoState,
        templates: Vec<ServiceTemplate>,
    ) -> DockyardResult<Vec<TemplateId>> {
        templates
            .into_iter()
            .map(|mut template| {
                template.id = state.assign_id()?;
                let id = template.id;
                state.rows.insert(id, template);
                Ok(id)
            })
            .collect()
    }

    fn commit(&self, state: &RepoState) -> DockyardResult<()> {
        write_json_atomic(&self.path, &state.to_document())?;
        self.notify();
        Ok(())
    }

    fn notify(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    fn read_state(&self) -> DockyardResult<RwLockReadGuard<'_, RepoState>> {
        self.state
            .read()
            .map_err(|e| DockyardError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write_state(&self) -> DockyardResult<RwLockWriteGuard<'_, RepoState>> {
        self.state
            .write()
            .map_err(|e| DockyardError::Storage(format!("Failed to acquire write lock: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, TemplateRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("templates.json");
        let repo = TemplateRepository::new(path);
        repo.load().unwrap();
        (temp_dir, repo)
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        assert_eq!(repo.count().unwrap(), 0);
        assert!(repo.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_insert_assigns_ids() {
        let (_temp_dir, repo) = create_test_repo();

        let a = repo.insert(ServiceTemplate::new("a", "img")).unwrap();
        let b = repo.insert(ServiceTemplate::new("b", "img")).unwrap();

        assert_eq!(a, TemplateId::new(1));
        assert_eq!(b, TemplateId::new(2));
        assert_eq!(repo.get(a).unwrap().unwrap().name, "a");
    }

    #[test]
    fn test_insert_with_id_replaces() {
        let (_temp_dir, repo) = create_test_repo();
        let id = repo.insert(ServiceTemplate::new("web", "nginx")).unwrap();

        let mut replacement = ServiceTemplate::new("web", "caddy");
        replacement.id = id;
        repo.insert(replacement).unwrap();

        assert_eq!(repo.count().unwrap(), 1);
        assert_eq!(repo.get(id).unwrap().unwrap().image, "caddy");
    }

    #[test]
    fn test_get_all_newest_first() {
        let (_temp_dir, repo) = create_test_repo();
        repo.insert(ServiceTemplate::new("first", "x")).unwrap();
        repo.insert(ServiceTemplate::new("second", "x")).unwrap();
        repo.insert(ServiceTemplate::new("third", "x")).unwrap();

        let names: Vec<_> = repo.get_all().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let (_temp_dir, repo) = create_test_repo();
        let mut t = ServiceTemplate::new("ghost", "x");
        t.id = TemplateId::new(42);
        assert!(repo.update(t).unwrap_err().is_not_found());
    }

    #[test]
    fn test_get_by_name_and_search() {
        let (_temp_dir, repo) = create_test_repo();
        repo.insert(ServiceTemplate::new("Web", "nginx:latest")).unwrap();
        repo.insert(ServiceTemplate::new("Database", "postgres:16")).unwrap();

        assert!(repo.get_by_name("Web").unwrap().is_some());
        assert!(repo.get_by_name("web").unwrap().is_none());

        let hits = repo.search("POST").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Database");

        assert_eq!(repo.search("").unwrap().len(), 2);
    }

    #[test]
    fn test_single_field_updates() {
        let (_temp_dir, repo) = create_test_repo();
        let id = repo.insert(ServiceTemplate::new("a", "b")).unwrap();

        repo.set_favorite(id, true).unwrap();
        repo.set_last_used(id, 1_700_000_000_000).unwrap();

        let t = repo.get(id).unwrap().unwrap();
        assert!(t.is_favorite);
        assert_eq!(t.last_used, 1_700_000_000_000);

        assert!(repo.set_favorite(TemplateId::new(99), true).is_err());
    }

    #[test]
    fn test_delete_and_delete_all() {
        let (_temp_dir, repo) = create_test_repo();
        let id = repo.insert(ServiceTemplate::new("a", "b")).unwrap();
        repo.insert(ServiceTemplate::new("c", "d")).unwrap();

        assert!(repo.delete(id).unwrap());
        assert!(!repo.delete(id).unwrap());
        assert_eq!(repo.count().unwrap(), 1);

        repo.delete_all().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_replace_all_persists() {
        let (temp_dir, repo) = create_test_repo();
        repo.insert(ServiceTemplate::new("old", "x")).unwrap();

        let ids = repo
            .replace_all(vec![
                ServiceTemplate::new("one", "x"),
                ServiceTemplate::new("two", "x"),
            ])
            .unwrap();
        assert_eq!(ids.len(), 2);

        let reloaded = TemplateRepository::new(temp_dir.path().join("templates.json"));
        reloaded.load().unwrap();
        let names: Vec<_> = reloaded
            .get_all()
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["two", "one"]);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let (_temp_dir, repo) = create_test_repo();
        let id = repo.insert(ServiceTemplate::new("a", "b")).unwrap();
        repo.delete(id).unwrap();
        let next = repo.insert(ServiceTemplate::new("c", "d")).unwrap();
        assert!(next > id);
    }

    #[test]
    fn test_categories_distinct_sorted() {
        let (_temp_dir, repo) = create_test_repo();
        repo.insert(ServiceTemplate::new("a", "x").with_category("Web"))
            .unwrap();
        repo.insert(ServiceTemplate::new("b", "x").with_category("Database"))
            .unwrap();
        repo.insert(ServiceTemplate::new("c", "x").with_category("Web"))
            .unwrap();

        assert_eq!(repo.categories().unwrap(), vec!["Database", "Web"]);
    }

    #[test]
    fn test_mutations_bump_revision() {
        let (_temp_dir, repo) = create_test_repo();
        let before = repo.revision();
        let id = repo.insert(ServiceTemplate::new("a", "b")).unwrap();
        repo.set_favorite(id, true).unwrap();
        assert_eq!(repo.revision(), before + 2);
    }

    #[test]
    fn test_exhausted_id_space_is_an_error() {
        let (_temp_dir, repo) = create_test_repo();

        let mut last = ServiceTemplate::new("last", "x");
        last.id = TemplateId::new(i32::MAX - 1);
        repo.insert(last).unwrap();

        let mut at_max = ServiceTemplate::new("max", "x");
        at_max.id = TemplateId::new(i32::MAX);
        assert!(matches!(repo.insert(at_max), Err(DockyardError::Storage(_))));
        assert!(matches!(
            repo.insert(ServiceTemplate::new("fresh", "x")),
            Err(DockyardError::Storage(_))
        ));
        assert!(repo
            .insert_all(vec![ServiceTemplate::new("bulk", "x")])
            .is_err());

        assert_eq!(repo.count().unwrap(), 1);
        assert!(repo.get_by_name("bulk").unwrap().is_none());
    }
}
