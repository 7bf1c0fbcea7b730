//! Environment-variable codec
//!
//! Templates store their environment as a JSON object text. The editing form
//! works with `KEY=value` lines, and the YAML formatter iterates the decoded
//! map. Malformed stored JSON is treated as an empty mapping.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

/// Decoded environment mapping, ordered by key
pub type EnvMap = BTreeMap<String, String>;

/// Parse `KEY=value` lines into a map
///
/// Each line is split at its first `=`; both sides are trimmed. Lines without
/// `=` or with a blank key are skipped. Later duplicates win.
pub fn parse_raw(raw: &str) -> EnvMap {
    let mut map = EnvMap::new();
    for line in raw.lines() {
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if !key.is_empty() {
                map.insert(key.to_string(), value.trim().to_string());
            }
        }
    }
    map
}

/// Encode a map as the stored JSON text
pub fn map_to_json(map: &EnvMap) -> String {
    // A map of strings always serializes
    serde_json::to_string(map).unwrap_or_else(|_| "{}".to_string())
}

/// Convert `KEY=value` lines into stored JSON text
pub fn raw_to_json(raw: &str) -> String {
    map_to_json(&parse_raw(raw))
}

/// Decode stored JSON text, falling back to an empty map
///
/// Non-string scalar values are kept in their JSON text form.
pub fn json_to_map(json: &str) -> EnvMap {
    if json.trim().is_empty() {
        return EnvMap::new();
    }

    match serde_json::from_str::<BTreeMap<String, Value>>(json) {
        Ok(values) => values
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::String(s) => Some((key, s)),
                Value::Null => None,
                other => Some((key, other.to_string())),
            })
            .collect(),
        Err(e) => {
            warn!(error = %e, "Ignoring malformed environment JSON");
            EnvMap::new()
        }
    }
}

/// Render a map as `KEY=value` lines
pub fn map_to_raw(map: &EnvMap) -> String {
    map.iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert stored JSON text back into `KEY=value` lines for editing
pub fn json_to_raw(json: &str) -> String {
    map_to_raw(&json_to_map(json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_to_json() {
        let json = raw_to_json("DB_HOST=localhost\nDB_PORT = 5432\n");
        let map = json_to_map(&json);
        assert_eq!(map.get("DB_HOST").map(String::as_str), Some("localhost"));
        assert_eq!(map.get("DB_PORT").map(String::as_str), Some("5432"));
    }

    #[test]
    fn test_value_may_contain_equals() {
        let map = parse_raw("TOKEN=a=b=c");
        assert_eq!(map.get("TOKEN").map(String::as_str), Some("a=b=c"));
    }

    #[test]
    fn test_skips_invalid_lines() {
        let map = parse_raw("no equals here\n=orphan\n  \nOK=1");
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("OK"));
    }

    #[test]
    fn test_malformed_json_is_empty() {
        assert!(json_to_map("{not json").is_empty());
        assert!(json_to_map("[1, 2]").is_empty());
        assert!(json_to_map("").is_empty());
        assert!(json_to_map("   ").is_empty());
    }

    #[test]
    fn test_non_string_values_kept_as_text() {
        let map = json_to_map(r#"{"PORT": 8080, "DEBUG": true, "GONE": null}"#);
        assert_eq!(map.get("PORT").map(String::as_str), Some("8080"));
        assert_eq!(map.get("DEBUG").map(String::as_str), Some("true"));
        assert!(!map.contains_key("GONE"));
    }

    #[test]
    fn test_round_trip_preserves_mapping() {
        let mut original = EnvMap::new();
        original.insert("POSTGRES_USER".into(), "admin".into());
        original.insert("POSTGRES_PASSWORD".into(), "s3cr=t".into());
        original.insert("EMPTY".into(), String::new());

        let stored = raw_to_json(&map_to_raw(&original));
        assert_eq!(json_to_map(&stored), original);
        assert_eq!(json_to_map(&map_to_json(&original)), original);
    }

    #[test]
    fn test_json_to_raw_is_sorted() {
        let raw = json_to_raw(r#"{"B":"2","A":"1"}"#);
        assert_eq!(raw, "A=1\nB=2");
    }
}
