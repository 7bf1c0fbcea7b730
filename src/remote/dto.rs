//! Transfer shape for the remote template table
//!
//! The remote table has no local id and no local-only columns. Every field is
//! optional on the way in; missing values fall back to the local defaults.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{now_millis, RestartPolicy, ServiceTemplate, TemplateId, DEFAULT_CATEGORY};

/// Row of the remote `service_templates` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTemplateDto {
    /// Server-assigned id; never sent on upload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl ServiceTemplateDto {
    /// Build the upload shape, dropping the local id and local-only flags
    pub fn from_template(template: &ServiceTemplate) -> Self {
        Self {
            id: None,
            name: Some(template.name.clone()),
            image: Some(template.image.clone()),
            ports: Some(template.ports.clone()),
            volumes: Some(template.volumes.clone()),
            env_vars: Some(template.env_vars.clone()),
            restart_policy: Some(template.restart_policy.to_string()),
            category: Some(template.category.clone()),
            created_at: Some(template.created_at),
        }
    }

    /// Materialize a local record, supplying the local-only flags
    pub fn into_template(self, is_favorite: bool, last_used: i64) -> ServiceTemplate {
        let restart_policy = match self.restart_policy.as_deref() {
            None => RestartPolicy::default(),
            Some(text) => RestartPolicy::parse(text).unwrap_or_else(|| {
                warn!(policy = text, "Unknown remote restart policy, using 'no'");
                RestartPolicy::default()
            }),
        };

        ServiceTemplate {
            id: TemplateId::UNASSIGNED,
            remote_id: self.id,
            name: self.name.unwrap_or_default(),
            image: self.image.unwrap_or_default(),
            ports: self.ports.unwrap_or_default(),
            volumes: self.volumes.unwrap_or_default(),
            env_vars: self.env_vars.unwrap_or_default(),
            restart_policy,
            category: self
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            created_at: self.created_at.unwrap_or_else(now_millis),
            is_favorite,
            last_used,
        }
    }
}
