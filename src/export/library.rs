//! Template library export and import
//!
//! Dumps the full local library (including the local-only flags) to YAML or
//! JSON so it can be backed up or moved to another machine, and reads such a
//! dump back.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{DockyardError, DockyardResult};
use crate::models::{RestartPolicy, ServiceTemplate, TemplateId};
use crate::storage::Storage;

/// Current library export schema version
pub const LIBRARY_SCHEMA_VERSION: &str = "1.0.0";

/// Serialization format for a library dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryFormat {
    Yaml,
    Json,
}

impl LibraryFormat {
    /// Guess the format from a file name, defaulting to YAML
    pub fn from_path(path: &str) -> Self {
        if path.to_lowercase().ends_with(".json") {
            Self::Json
        } else {
            Self::Yaml
        }
    }
}

/// One template in a library dump. Ids are store-specific and left out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub ports: String,
    #[serde(default)]
    pub volumes: String,
    #[serde(default)]
    pub env_vars: String,
    #[serde(default)]
    pub restart_policy: RestartPolicy,
    #[serde(default = "crate::models::template::default_category")]
    pub category: String,
    #[serde(default = "crate::models::now_millis")]
    pub created_at: i64,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub last_used: i64,
}

impl From<&ServiceTemplate> for LibraryEntry {
    fn from(t: &ServiceTemplate) -> Self {
        Self {
            name: t.name.clone(),
            image: t.image.clone(),
            ports: t.ports.clone(),
            volumes: t.volumes.clone(),
            env_vars: t.env_vars.clone(),
            restart_policy: t.restart_policy,
            category: t.category.clone(),
            created_at: t.created_at,
            is_favorite: t.is_favorite,
            last_used: t.last_used,
        }
    }
}

impl From<LibraryEntry> for ServiceTemplate {
    fn from(e: LibraryEntry) -> Self {
        Self {
            id: TemplateId::UNASSIGNED,
            remote_id: None,
            name: e.name,
            image: e.image,
            ports: e.ports,
            volumes: e.volumes,
            env_vars: e.env_vars,
            restart_policy: e.restart_policy,
            category: e.category,
            created_at: e.created_at,
            is_favorite: e.is_favorite,
            last_used: e.last_used,
        }
    }
}

/// Full library dump
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryExport {
    pub schema_version: String,
    pub exported_at: DateTime<Utc>,
    pub app_version: String,
    pub templates: Vec<LibraryEntry>,
}

impl LibraryExport {
    /// Snapshot the local library, oldest first so an import keeps the order
    pub fn from_storage(storage: &Storage) -> DockyardResult<Self> {
        let mut templates = storage.templates.get_all()?;
        templates.reverse();

        Ok(Self {
            schema_version: LIBRARY_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            templates: templates.iter().map(LibraryEntry::from).collect(),
        })
    }

    /// Check the dump before touching the store
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version.split('.').next() != LIBRARY_SCHEMA_VERSION.split('.').next() {
            return Err(format!(
                "Unsupported library schema version {} (expected {})",
                self.schema_version, LIBRARY_SCHEMA_VERSION
            ));
        }

        for (i, entry) in self.templates.iter().enumerate() {
            ServiceTemplate::from(entry.clone())
                .validate()
                .map_err(|e| format!("Template #{} ('{}'): {}", i + 1, entry.name, e))?;
        }

        Ok(())
    }
}

/// Write the library to `writer`
pub fn export_library<W: Write>(
    storage: &Storage,
    format: LibraryFormat,
    writer: &mut W,
) -> DockyardResult<usize> {
    let export = LibraryExport::from_storage(storage)?;

    match format {
        LibraryFormat::Yaml => {
            writeln!(writer, "# Dockyard template library")
                .map_err(|e| DockyardError::Export(e.to_string()))?;
            writeln!(writer, "# Generated: {}", export.exported_at)
                .map_err(|e| DockyardError::Export(e.to_string()))?;
            serde_yaml::to_writer(&mut *writer, &export)
                .map_err(|e| DockyardError::Export(e.to_string()))?;
        }
        LibraryFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, &export)
                .map_err(|e| DockyardError::Export(e.to_string()))?;
            writeln!(writer).map_err(|e| DockyardError::Export(e.to_string()))?;
        }
    }

    Ok(export.templates.len())
}

/// Parse and validate a library dump
pub fn parse_library(contents: &str, format: LibraryFormat) -> DockyardResult<LibraryExport> {
    let export: LibraryExport = match format {
        LibraryFormat::Yaml => {
            serde_yaml::from_str(contents).map_err(|e| DockyardError::Import(e.to_string()))?
        }
        LibraryFormat::Json => {
            serde_json::from_str(contents).map_err(|e| DockyardError::Import(e.to_string()))?
        }
    };

    export.validate().map_err(DockyardError::Import)?;
    Ok(export)
}

/// Outcome of an import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: Vec<String>,
}

/// Add the templates of a dump to the local store
///
/// With `skip_existing`, entries whose name is already stored are skipped.
pub fn import_library(
    storage: &Storage,
    export: LibraryExport,
    skip_existing: bool,
) -> DockyardResult<ImportSummary> {
    let mut summary = ImportSummary::default();
    let mut incoming = Vec::with_capacity(export.templates.len());

    for entry in export.templates {
        if skip_existing && storage.templates.get_by_name(&entry.name)?.is_some() {
            summary.skipped.push(entry.name);
            continue;
        }
        incoming.push(ServiceTemplate::from(entry));
    }

    summary.imported = storage.templates.insert_all(incoming)?.len();
    info!(
        imported = summary.imported,
        skipped = summary.skipped.len(),
        "Imported template library"
    );
    Ok(summary)
}
