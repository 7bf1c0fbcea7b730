//! Template document schema versions
//!
//! Columns were added over time and each step fills the new field with its
//! default on every stored row:
//!
//! - v2: `restart_policy` (default `"no"`)
//! - v5: `category` (default `"General"`)
//! - v6: `is_favorite`, `last_used` (default `false`, `0`)
//!
//! Versions 3 and 4 changed nothing in the stored shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{DockyardError, DockyardResult};
use crate::models::{ServiceTemplate, DEFAULT_CATEGORY};

/// Schema version written by this build
pub const CURRENT_SCHEMA_VERSION: u32 = 6;

/// On-disk shape of `templates.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDocument {
    pub schema_version: u32,
    pub next_id: i32,
    pub templates: Vec<ServiceTemplate>,
}

impl Default for TemplateDocument {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            next_id: 1,
            templates: Vec::new(),
        }
    }
}

/// Bring a raw document up to the current version
///
/// Returns the document and whether anything had to change, in which case
/// the caller should write it back.
pub fn migrate(raw: Value) -> DockyardResult<(TemplateDocument, bool)> {
    let mut root = match raw {
        Value::Object(map) => map,
        _ => {
            return Err(DockyardError::Storage(
                "Template document must be a JSON object".into(),
            ))
        }
    };

    let raw_version = root
        .get("schema_version")
        .and_then(Value::as_u64)
        .unwrap_or(1);

    let version = match u32::try_from(raw_version) {
        Ok(version) if version <= CURRENT_SCHEMA_VERSION => version,
        _ => {
            return Err(DockyardError::Storage(format!(
                "Template document has schema version {}, but this build only understands up to {}",
                raw_version, CURRENT_SCHEMA_VERSION
            )))
        }
    };

    let mut rows = match root.remove("templates") {
        Some(Value::Array(rows)) => rows,
        None | Some(Value::Null) => Vec::new(),
        Some(_) => {
            return Err(DockyardError::Storage(
                "Template document field 'templates' must be an array".into(),
            ))
        }
    };

    for row in rows.iter_mut() {
        let Value::Object(fields) = row else {
            return Err(DockyardError::Storage(
                "Template rows must be JSON objects".into(),
            ));
        };
        upgrade_row(fields, version);
    }

    let templates: Vec<ServiceTemplate> = serde_json::from_value(Value::Array(rows))
        .map_err(|e| DockyardError::Storage(format!("Failed to decode templates: {}", e)))?;

    let max_id = templates.iter().map(|t| t.id.value()).max().unwrap_or(0);
    let first_free = max_id.checked_add(1).ok_or_else(|| {
        DockyardError::Storage(format!("Template id {} leaves no room for new ids", max_id))
    })?;
    // out-of-range values are treated as missing and recomputed
    let stored_next = root
        .get("next_id")
        .and_then(Value::as_i64)
        .and_then(|n| i32::try_from(n).ok());
    let next_id = stored_next.unwrap_or(1).max(first_free);

    let changed = version < CURRENT_SCHEMA_VERSION || stored_next != Some(next_id);
    if version < CURRENT_SCHEMA_VERSION {
        info!(
            from = version,
            to = CURRENT_SCHEMA_VERSION,
            rows = templates.len(),
            "Migrated template document"
        );
    }

    Ok((
        TemplateDocument {
            schema_version: CURRENT_SCHEMA_VERSION,
            next_id,
            templates,
        },
        changed,
    ))
}

fn upgrade_row(fields: &mut Map<String, Value>, from_version: u32) {
    if from_version < 2 {
        fields
            .entry("restart_policy")
            .or_insert_with(|| Value::String("no".into()));
    }
    if from_version < 5 {
        fields
            .entry("category")
            .or_insert_with(|| Value::String(DEFAULT_CATEGORY.into()));
    }
    if from_version < 6 {
        fields.entry("is_favorite").or_insert(Value::Bool(false));
        fields.entry("last_used").or_insert(Value::from(0));
    }
}
