//! Template service
//!
//! Provides business logic for template management: validation, lookup by
//! name or id, full-record replacement on edit, and the two single-field
//! updates (favorite flag, last-used time).

use tracing::info;

use crate::error::{DockyardError, DockyardResult};
use crate::models::{env_vars, now_millis, RestartPolicy, ServiceTemplate, TemplateId};
use crate::storage::Storage;

/// User-entered fields of a template
///
/// `env` holds `KEY=value` lines as typed; it is converted to the stored JSON
/// text on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateDraft {
    pub name: String,
    pub image: String,
    pub ports: String,
    pub volumes: String,
    pub env: String,
    pub restart_policy: String,
    pub category: String,
}

impl TemplateDraft {
    /// Prefill a draft from a stored template
    pub fn from_template(template: &ServiceTemplate) -> Self {
        Self {
            name: template.name.clone(),
            image: template.image.clone(),
            ports: template.ports.clone(),
            volumes: template.volumes.clone(),
            env: env_vars::json_to_raw(&template.env_vars),
            restart_policy: template.restart_policy.to_string(),
            category: template.category.clone(),
        }
    }

    /// Build a new record from the draft
    pub fn to_template(&self) -> DockyardResult<ServiceTemplate> {
        let restart_policy = if self.restart_policy.trim().is_empty() {
            RestartPolicy::default()
        } else {
            self.restart_policy
                .parse::<RestartPolicy>()
                .map_err(DockyardError::Validation)?
        };

        let mut template = ServiceTemplate::new(self.name.trim(), self.image.trim())
            .with_ports(self.ports.trim())
            .with_volumes(self.volumes.trim())
            .with_restart_policy(restart_policy);
        template.env_vars = env_vars::raw_to_json(&self.env);

        let category = self.category.trim();
        if !category.is_empty() {
            template.category = category.to_string();
        }

        template
            .validate()
            .map_err(|e| DockyardError::Validation(e.to_string()))?;
        Ok(template)
    }
}

/// Service for template management
pub struct TemplateService<'a> {
    storage: &'a Storage,
}

impl<'a> TemplateService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new template from a draft
    pub fn create(&self, draft: &TemplateDraft) -> DockyardResult<ServiceTemplate> {
        let mut template = draft.to_template()?;
        template.id = self.storage.templates.insert(template.clone())?;

        info!(id = %template.id, name = %template.name, "Created template");
        Ok(template)
    }

    /// Replace a template with the contents of a draft
    ///
    /// The id, remote id, favorite flag and last-used time of the stored
    /// record carry over; `created_at` is refreshed like any other
    /// replacement.
    pub fn update(&self, id: TemplateId, draft: &TemplateDraft) -> DockyardResult<ServiceTemplate> {
        let existing = self
            .storage
            .templates
            .get(id)?
            .ok_or_else(|| DockyardError::template_not_found(id.to_string()))?;

        let mut template = draft.to_template()?;
        template.id = existing.id;
        template.remote_id = existing.remote_id;
        template.is_favorite = existing.is_favorite;
        template.last_used = existing.last_used;

        self.storage.templates.update(template.clone())?;
        info!(id = %template.id, name = %template.name, "Updated template");
        Ok(template)
    }

    /// Insert or replace a full record as given
    pub fn save(&self, template: ServiceTemplate) -> DockyardResult<ServiceTemplate> {
        template
            .validate()
            .map_err(|e| DockyardError::Validation(e.to_string()))?;

        let mut template = template;
        template.id = self.storage.templates.insert(template.clone())?;
        Ok(template)
    }

    pub fn get(&self, id: TemplateId) -> DockyardResult<Option<ServiceTemplate>> {
        self.storage.templates.get(id)
    }

    /// Find a template by exact name, then by id
    pub fn find(&self, identifier: &str) -> DockyardResult<Option<ServiceTemplate>> {
        if let Some(template) = self.storage.templates.get_by_name(identifier)? {
            return Ok(Some(template));
        }

        if let Ok(id) = identifier.parse::<TemplateId>() {
            return self.storage.templates.get(id);
        }

        Ok(None)
    }

    /// Like `find`, but a missing template is an error
    pub fn require(&self, identifier: &str) -> DockyardResult<ServiceTemplate> {
        self.find(identifier)?
            .ok_or_else(|| DockyardError::template_not_found(identifier))
    }

    /// All templates, most recently inserted first
    pub fn list(&self) -> DockyardResult<Vec<ServiceTemplate>> {
        self.storage.templates.get_all()
    }

    /// Name-or-image substring search
    pub fn search(&self, query: &str) -> DockyardResult<Vec<ServiceTemplate>> {
        self.storage.templates.search(query)
    }

    pub fn categories(&self) -> DockyardResult<Vec<String>> {
        self.storage.templates.categories()
    }

    /// Delete a template, returning the removed record
    pub fn delete(&self, id: TemplateId) -> DockyardResult<ServiceTemplate> {
        let template = self
            .storage
            .templates
            .get(id)?
            .ok_or_else(|| DockyardError::template_not_found(id.to_string()))?;

        self.storage.templates.delete(id)?;
        info!(id = %id, name = %template.name, "Deleted template");
        Ok(template)
    }

    pub fn set_favorite(&self, id: TemplateId, favorite: bool) -> DockyardResult<()> {
        self.storage.templates.set_favorite(id, favorite)
    }

    /// Flip the favorite flag, returning the new value
    pub fn toggle_favorite(&self, id: TemplateId) -> DockyardResult<bool> {
        let template = self
            .storage
            .templates
            .get(id)?
            .ok_or_else(|| DockyardError::template_not_found(id.to_string()))?;

        let favorite = !template.is_favorite;
        self.storage.templates.set_favorite(id, favorite)?;
        Ok(favorite)
    }

    /// Record that a template was just used
    pub fn mark_used(&self, id: TemplateId) -> DockyardResult<i64> {
        let now = now_millis();
        self.storage.templates.set_last_used(id, now)?;
        Ok(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::DockyardPaths;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = DockyardPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn draft(name: &str, image: &str) -> TemplateDraft {
        TemplateDraft {
            name: name.into(),
            image: image.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_template() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TemplateService::new(&storage);

        let mut d = draft(" web ", "nginx:latest");
        d.env = "A=1\nB=2".into();
        d.restart_policy = "Always".into();

        let t = service.create(&d).unwrap();
        assert_eq!(t.name, "web");
        assert_eq!(t.id, TemplateId::new(1));
        assert_eq!(t.restart_policy, RestartPolicy::Always);
        assert_eq!(t.env_map().len(), 2);
        assert_eq!(t.category, "General");
    }

    #[test]
    fn test_create_rejects_invalid() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TemplateService::new(&storage);

        assert!(service.create(&draft("", "x")).unwrap_err().is_validation());
        assert!(service.create(&draft("x", "")).unwrap_err().is_validation());

        let mut bad_policy = draft("x", "y");
        bad_policy.restart_policy = "sometimes".into();
        assert!(service.create(&bad_policy).unwrap_err().is_validation());
        assert_eq!(storage.templates.count().unwrap(), 0);
    }

    #[test]
    fn test_update_keeps_local_flags() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TemplateService::new(&storage);

        let t = service.create(&draft("web", "nginx")).unwrap();
        service.set_favorite(t.id, true).unwrap();
        service.mark_used(t.id).unwrap();

        let updated = service.update(t.id, &draft("web", "caddy")).unwrap();
        assert_eq!(updated.image, "caddy");
        assert!(updated.is_favorite);
        assert!(updated.last_used > 0);
        assert_eq!(storage.templates.count().unwrap(), 1);
    }

    #[test]
    fn test_find_by_name_or_id() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TemplateService::new(&storage);
        let t = service.create(&draft("cache", "redis")).unwrap();

        assert_eq!(service.find("cache").unwrap().unwrap().id, t.id);
        assert_eq!(service.find("1").unwrap().unwrap().id, t.id);
        assert!(service.find("nope").unwrap().is_none());
        assert!(service.require("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_toggle_favorite() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TemplateService::new(&storage);
        let t = service.create(&draft("a", "b")).unwrap();

        assert!(service.toggle_favorite(t.id).unwrap());
        assert!(!service.toggle_favorite(t.id).unwrap());
    }

    #[test]
    fn test_delete() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TemplateService::new(&storage);
        let t = service.create(&draft("a", "b")).unwrap();

        let removed = service.delete(t.id).unwrap();
        assert_eq!(removed.name, "a");
        assert!(service.delete(t.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_draft_round_trip_through_template() {
        let mut d = draft("db", "postgres:16");
        d.env = "POSTGRES_DB=app".into();
        d.restart_policy = "on-failure".into();
        d.category = "Database".into();
        d.ports = "5432:5432".into();

        let t = d.to_template().unwrap();
        assert_eq!(TemplateDraft::from_template(&t), d);
    }
}
