//! User settings for Dockyard
//!
//! Manages the remote endpoint used for sync along with display preferences.

use serde::{Deserialize, Serialize};

use super::paths::DockyardPaths;
use crate::error::DockyardError;
use crate::state::SortOption;

/// Environment variable overriding `remote.url`
pub const REMOTE_URL_ENV: &str = "DOCKYARD_REMOTE_URL";
/// Environment variable overriding `remote.api_key`
pub const REMOTE_KEY_ENV: &str = "DOCKYARD_REMOTE_KEY";

/// Connection settings for the hosted template table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Project URL, e.g. `https://abc.supabase.co`
    #[serde(default)]
    pub url: String,

    /// Static project key sent as `apikey` and bearer token
    #[serde(default)]
    pub api_key: String,

    /// Table holding the templates
    #[serde(default = "default_table")]
    pub table: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Timeout for the reachability probe in seconds
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

fn default_table() -> String {
    "service_templates".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_probe_timeout_secs() -> u64 {
    3
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            table: default_table(),
            timeout_secs: default_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

impl RemoteSettings {
    /// Both the URL and the key are present
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

/// User settings for Dockyard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Remote store connection
    #[serde(default)]
    pub remote: RemoteSettings,

    /// Sort order used by `list` when none is given
    #[serde(default)]
    pub default_sort: SortOption,

    /// Dark theme preference
    #[serde(default)]
    pub dark_theme: bool,

    /// Push each saved template to the remote store right away
    #[serde(default = "default_auto_push")]
    pub auto_push: bool,
}

fn default_schema_version() -> u32 {
    1
}

fn default_auto_push() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            remote: RemoteSettings::default(),
            default_sort: SortOption::default(),
            dark_theme: false,
            auto_push: default_auto_push(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    ///
    /// Remote credentials from the environment take precedence over the file.
    pub fn load_or_create(paths: &DockyardPaths) -> Result<Self, DockyardError> {
        let mut settings = Self::load_file(paths)?;
        settings.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Load only what is stored on disk, without environment overrides
    ///
    /// Use this before `save` so credentials from the environment are not
    /// written to the settings file.
    pub fn load_file(paths: &DockyardPaths) -> Result<Self, DockyardError> {
        let settings_path = paths.settings_file();

        let settings = if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                DockyardError::Io(format!("Failed to read settings file: {}", e))
            })?;

            serde_json::from_str(&contents).map_err(|e| {
                DockyardError::Config(format!("Failed to parse settings file: {}", e))
            })?
        } else {
            Settings::default()
        };

        Ok(settings)
    }

    /// Overlay remote credentials from an environment lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(REMOTE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.remote.url = url;
        }
        if let Some(key) = lookup(REMOTE_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            self.remote.api_key = key;
        }
    }

    /// Whether sync can be attempted at all
    pub fn remote_configured(&self) -> bool {
        self.remote.is_configured()
    }

    /// Save settings to disk
    pub fn save(&self, paths: &DockyardPaths) -> Result<(), DockyardError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            DockyardError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents).map_err(|e| {
            DockyardError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.remote.table, "service_templates");
        assert_eq!(settings.remote.timeout_secs, 30);
        assert_eq!(settings.default_sort, SortOption::DateDesc);
        assert!(settings.auto_push);
        assert!(!settings.remote_configured());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = DockyardPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.default_sort = SortOption::NameAsc;
        settings.dark_theme = true;
        settings.remote.url = "https://example.supabase.co".into();

        settings.save(&paths).unwrap();

        let loaded = Settings::load_file(&paths).unwrap();
        assert_eq!(loaded.default_sort, SortOption::NameAsc);
        assert!(loaded.dark_theme);
        assert_eq!(loaded.remote.url, "https://example.supabase.co");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"remote": {"url": "https://x.io"}}"#).unwrap();
        assert_eq!(settings.remote.table, "service_templates");
        assert_eq!(settings.remote.probe_timeout_secs, 3);
        assert!(settings.auto_push);
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings.apply_env_overrides(|key| match key {
            REMOTE_URL_ENV => Some("https://env.supabase.co".to_string()),
            REMOTE_KEY_ENV => Some("secret".to_string()),
            _ => None,
        });

        assert_eq!(settings.remote.url, "https://env.supabase.co");
        assert_eq!(settings.remote.api_key, "secret");
        assert!(settings.remote_configured());
    }

    #[test]
    fn test_blank_env_does_not_override() {
        let mut settings = Settings::default();
        settings.remote.url = "https://file.io".into();
        settings.apply_env_overrides(|_| Some("  ".to_string()));
        assert_eq!(settings.remote.url, "https://file.io");
    }
}
