//! Service template model
//!
//! A stored description of one container service. Records are replaced as a
//! whole on update; only the favorite flag and the last-used timestamp are
//! changed in place.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::env_vars::{self, EnvMap};
use super::ids::TemplateId;
use super::restart::RestartPolicy;

/// Category assigned when none is given
pub const DEFAULT_CATEGORY: &str = "General";

/// Maximum length of a template name
pub const MAX_NAME_LEN: usize = 100;

pub(crate) fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// A Docker Compose service template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTemplate {
    /// Locally assigned id
    #[serde(default)]
    pub id: TemplateId,

    /// Id assigned by the remote store, once the record has been downloaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<i64>,

    /// Display name, also the sync key
    pub name: String,

    /// Container image reference
    #[serde(default)]
    pub image: String,

    /// Port mappings, comma or newline separated
    #[serde(default)]
    pub ports: String,

    /// Volume mappings, comma or newline separated
    #[serde(default)]
    pub volumes: String,

    /// Environment variables as JSON object text
    #[serde(default)]
    pub env_vars: String,

    #[serde(default)]
    pub restart_policy: RestartPolicy,

    #[serde(default = "default_category")]
    pub category: String,

    /// Creation time in epoch milliseconds
    #[serde(default = "now_millis")]
    pub created_at: i64,

    /// Local-only favorite flag
    #[serde(default)]
    pub is_favorite: bool,

    /// Local-only last-used time in epoch milliseconds, `0` if never used
    #[serde(default)]
    pub last_used: i64,
}

impl ServiceTemplate {
    /// Create a new, not yet stored template
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: TemplateId::UNASSIGNED,
            remote_id: None,
            name: name.into(),
            image: image.into(),
            ports: String::new(),
            volumes: String::new(),
            env_vars: String::new(),
            restart_policy: RestartPolicy::default(),
            category: default_category(),
            created_at: now_millis(),
            is_favorite: false,
            last_used: 0,
        }
    }

    pub fn with_ports(mut self, ports: impl Into<String>) -> Self {
        self.ports = ports.into();
        self
    }

    pub fn with_volumes(mut self, volumes: impl Into<String>) -> Self {
        self.volumes = volumes.into();
        self
    }

    /// Set the environment from a decoded map
    pub fn with_env(mut self, env: &EnvMap) -> Self {
        self.env_vars = env_vars::map_to_json(env);
        self
    }

    pub fn with_restart_policy(mut self, policy: RestartPolicy) -> Self {
        self.restart_policy = policy;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Decoded environment mapping (empty when the stored text is malformed)
    pub fn env_map(&self) -> EnvMap {
        env_vars::json_to_map(&self.env_vars)
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.created_at).single()
    }

    pub fn last_used_utc(&self) -> Option<DateTime<Utc>> {
        if self.last_used == 0 {
            return None;
        }
        Utc.timestamp_millis_opt(self.last_used).single()
    }

    /// Case-insensitive substring match against name or image
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query) || self.image.to_lowercase().contains(&query)
    }

    /// Validate the template
    pub fn validate(&self) -> Result<(), TemplateValidationError> {
        if self.name.trim().is_empty() {
            return Err(TemplateValidationError::EmptyName);
        }

        if self.name.len() > MAX_NAME_LEN {
            return Err(TemplateValidationError::NameTooLong(self.name.len()));
        }

        if self.image.trim().is_empty() {
            return Err(TemplateValidationError::EmptyImage);
        }

        if self.image.chars().any(char::is_whitespace) {
            return Err(TemplateValidationError::InvalidImage(self.image.clone()));
        }

        Ok(())
    }
}

impl fmt::Display for ServiceTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.image)
    }
}

/// Validation errors for templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateValidationError {
    EmptyName,
    NameTooLong(usize),
    EmptyImage,
    InvalidImage(String),
}

impl fmt::Display for TemplateValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Template name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Template name too long ({} chars, max {})", len, MAX_NAME_LEN)
            }
            Self::EmptyImage => write!(f, "Image cannot be empty"),
            Self::InvalidImage(image) => {
                write!(f, "Image reference must not contain whitespace: '{}'", image)
            }
        }
    }
}

impl std::error::Error for TemplateValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_template_defaults() {
        let t = ServiceTemplate::new("nginx", "nginx:latest");
        assert!(t.id.is_unassigned());
        assert_eq!(t.category, "General");
        assert_eq!(t.restart_policy, RestartPolicy::No);
        assert!(!t.is_favorite);
        assert_eq!(t.last_used, 0);
        assert!(t.created_at > 0);
        assert!(t.last_used_utc().is_none());
    }

    #[test]
    fn test_matches_query() {
        let t = ServiceTemplate::new("Web Server", "nginx:alpine");
        assert!(t.matches_query("web"));
        assert!(t.matches_query("NGINX"));
        assert!(t.matches_query(""));
        assert!(!t.matches_query("postgres"));
    }

    #[test]
    fn test_validation() {
        let mut t = ServiceTemplate::new("db", "postgres:16");
        assert!(t.validate().is_ok());

        t.name = "   ".into();
        assert_eq!(t.validate(), Err(TemplateValidationError::EmptyName));

        t.name = "a".repeat(101);
        assert!(matches!(
            t.validate(),
            Err(TemplateValidationError::NameTooLong(101))
        ));

        t.name = "db".into();
        t.image = String::new();
        assert_eq!(t.validate(), Err(TemplateValidationError::EmptyImage));

        t.image = "postgres 16".into();
        assert!(matches!(
            t.validate(),
            Err(TemplateValidationError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_env_map() {
        let mut env = EnvMap::new();
        env.insert("A".into(), "1".into());
        let t = ServiceTemplate::new("x", "y").with_env(&env);
        assert_eq!(t.env_map(), env);
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let t: ServiceTemplate =
            serde_json::from_str(r#"{"id": 3, "name": "redis", "image": "redis:7"}"#).unwrap();
        assert_eq!(t.id, TemplateId::new(3));
        assert_eq!(t.category, "General");
        assert_eq!(t.restart_policy, RestartPolicy::No);
        assert!(t.remote_id.is_none());
        assert!(!t.is_favorite);
    }
}
